use thiserror::Error;

/// Errors surfaced by the disambiguation pipeline.
///
/// Malformed records are not errors: rows with empty normalized names or
/// unparseable years are skipped and simply do not appear in the output.
#[derive(Debug, Error)]
pub enum Error {
    /// No column name matched the forename token list.
    #[error("forename column missing: provide a column titled 'forename'")]
    MissingForenameColumn,

    /// No column name matched the surname token list.
    #[error("surname column missing: provide a column titled 'surname'")]
    MissingSurnameColumn,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
