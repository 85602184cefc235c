use compact_str::{CompactString, ToCompactString};
use tracing::debug;

use crate::normalize::{collapse_whitespace, normalize, remove_particles};
use crate::relation::MatchCodes;
use crate::table::{ColumnMap, NameTable};
use crate::Persons;

pub(crate) type RecordId = usize;

/// Where a record came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Source {
    /// The main name table.
    Default,
    /// The table of previously identified unique persons.
    KnownUnique,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Default => "default",
            Source::KnownUnique => "known-unique",
        }
    }
}

/// One name record, normalized and ready for clustering.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub id: CompactString,
    pub source: Source,
    /// Raw forename, with the middle name appended when the input had one.
    pub fnm: String,
    pub snm: String,
    pub mnm: Option<String>,
    pub year: Option<i32>,
    pub fnm_normalized: CompactString,
    pub snm_normalized: CompactString,
    pub cluster: Option<usize>,
    pub matching: MatchCodes,
    pub max_time_gap: Option<i32>,
}

/// Convert the rows of one input table into records, skipping rows whose
/// normalized forename or surname is empty or whose year fails to parse.
pub(crate) fn intake(
    table: &NameTable,
    columns: &ColumnMap,
    source: Source,
    options: &Persons,
    records: &mut Vec<Record>,
) {
    for row in 0..table.len() {
        let mut fnm = table.value(row, columns.fnm).to_string();
        let snm = table.value(row, columns.snm).to_string();

        let mnm = columns.mnm.and_then(|col| {
            let value = table.value(row, col).trim();
            (!value.is_empty()).then(|| value.to_string())
        });
        if let Some(mnm) = &mnm {
            fnm.push(' ');
            fnm.push_str(mnm);
        }

        let year = match columns.year.map(|col| table.value(row, col).trim()) {
            None | Some("") => None,
            Some(value) => match value.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    debug!(row, year = value, "skipping record with non-integer year");
                    continue;
                }
            },
        };

        let id = match columns.id {
            Some(col) => table.value(row, col).to_compact_string(),
            None => row.to_compact_string(),
        };

        let fnm_normalized = if options.normalize_names {
            normalize(&fnm)
        } else {
            collapse_whitespace(&fnm)
        };
        let fnm_normalized = if options.only_first_fnm {
            fnm_normalized
                .split(' ')
                .next()
                .unwrap_or_default()
                .to_compact_string()
        } else {
            fnm_normalized.to_compact_string()
        };

        let snm_normalized = if options.normalize_names {
            normalize(&snm)
        } else {
            collapse_whitespace(&snm)
        };
        let snm_normalized = if options.remove_particles_suffixes {
            remove_particles(&snm_normalized).to_compact_string()
        } else {
            snm_normalized.to_compact_string()
        };

        if fnm_normalized.is_empty() || snm_normalized.is_empty() {
            debug!(row, "skipping record with empty normalized name");
            continue;
        }

        records.push(Record {
            id,
            source,
            fnm,
            snm,
            mnm,
            year,
            fnm_normalized,
            snm_normalized,
            cluster: None,
            matching: MatchCodes::default(),
            max_time_gap: None,
        });
    }
}
