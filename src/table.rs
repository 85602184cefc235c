use std::io;
use std::path::Path;

use crate::cluster::ClusterSet;
use crate::error::Error;
use crate::normalize::normalize;
use crate::record::{Record, Source};

const FORENAME_TOKENS: &[&str] = &[
    "fore", "first", "fnm", "given", "christian", "baptism", "baptismal",
];
const SURNAME_TOKENS: &[&str] = &[
    "sur",
    "last",
    "snm",
    "family",
    "cognomen",
    "byname",
    "matronymic",
    "patronymic",
    "metronymic",
];
const MIDDLE_TOKENS: &[&str] = &["middle", "initial", "second"];
const YEAR_TOKENS: &[&str] = &["year", "yr"];
const ID_TOKENS: &[&str] = &["id"];

/// The column name used when the input table has no id column.
const SYNTHETIC_ID: &str = "name_id";

/// A table of name records: column names plus string-valued rows.
///
/// Rows shorter than the header read as empty in the missing cells.
pub struct NameTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl NameTable {
    pub fn new<I>(columns: I) -> NameTable
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        NameTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
    }

    /// Read a table from CSV, taking the first row as the header.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<NameTable, Error> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for result in reader.records() {
            let row = result?;
            rows.push(row.iter().map(str::to_string).collect());
        }
        Ok(NameTable { columns, rows })
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<NameTable, Error> {
        let file = std::fs::File::open(path)?;
        NameTable::from_csv_reader(io::BufReader::new(file))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn value(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).map(String::as_str).unwrap_or("")
    }
}

/// Column indices recognised from the table header.
pub(crate) struct ColumnMap {
    pub fnm: usize,
    pub snm: usize,
    pub mnm: Option<usize>,
    pub year: Option<usize>,
    pub id: Option<usize>,
}

impl ColumnMap {
    /// Recognise columns by name: the first column whose normalized name
    /// contains a known token claims the category, each category at most
    /// once. Forename and surname are mandatory.
    pub fn identify(table: &NameTable) -> Result<ColumnMap, Error> {
        let mut fnm = None;
        let mut snm = None;
        let mut mnm = None;
        let mut year = None;
        let mut id = None;

        for (index, name) in table.columns().iter().enumerate() {
            let key = normalize(name).replace(' ', "");
            let matches = |tokens: &[&str]| tokens.iter().any(|token| key.contains(token));

            if fnm.is_none() && matches(FORENAME_TOKENS) {
                fnm = Some(index);
            } else if snm.is_none() && matches(SURNAME_TOKENS) {
                snm = Some(index);
            } else if mnm.is_none() && matches(MIDDLE_TOKENS) {
                mnm = Some(index);
            } else if year.is_none() && matches(YEAR_TOKENS) {
                year = Some(index);
            } else if id.is_none() && matches(ID_TOKENS) {
                id = Some(index);
            }
        }

        Ok(ColumnMap {
            fnm: fnm.ok_or(Error::MissingForenameColumn)?,
            snm: snm.ok_or(Error::MissingSurnameColumn)?,
            mnm,
            year,
            id,
        })
    }
}

/// Output column names, taken from the input header.
pub(crate) struct OutputLayout {
    pub id: String,
    pub fnm: String,
    pub snm: String,
    pub mnm: Option<String>,
    pub year: Option<String>,
    pub has_max_gap: bool,
}

impl OutputLayout {
    pub fn from_input(table: &NameTable, columns: &ColumnMap, has_max_gap: bool) -> OutputLayout {
        let name = |index: usize| table.columns()[index].clone();
        OutputLayout {
            id: columns.id.map(name).unwrap_or_else(|| SYNTHETIC_ID.to_string()),
            fnm: name(columns.fnm),
            snm: name(columns.snm),
            mnm: columns.mnm.map(name),
            year: columns.year.map(name),
            has_max_gap,
        }
    }
}

/// One row of the disambiguation result.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub person_id: usize,
    pub source: Source,
    pub id: String,
    pub fnm: String,
    pub snm: String,
    pub mnm: Option<String>,
    pub matching: &'static str,
    pub saving_time: String,
    pub year: Option<i32>,
    pub maximum_time_gap: Option<i32>,
}

/// The finished result: one row per surviving record, clusters in id
/// order, records within a cluster in input order.
pub struct PersonTable {
    rows: Vec<OutputRow>,
    layout: OutputLayout,
}

impl PersonTable {
    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// Number of distinct persons identified.
    pub fn person_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.person_id + 1)
            .max()
            .unwrap_or(0)
    }

    /// Write the result as CSV. Column names for id, names and year come
    /// from the input table; `year`, middle-name and `maximum_time_gap`
    /// columns appear only when the input (or the gap report) carried
    /// them.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![
            "person_id",
            "source",
            self.layout.id.as_str(),
            self.layout.fnm.as_str(),
            self.layout.snm.as_str(),
            "matching",
            "saving_time",
        ];
        if let Some(year) = &self.layout.year {
            header.push(year);
        }
        if let Some(mnm) = &self.layout.mnm {
            header.push(mnm);
        }
        if self.layout.has_max_gap {
            header.push("maximum_time_gap");
        }
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut cells = vec![
                row.person_id.to_string(),
                row.source.as_str().to_string(),
                row.id.clone(),
                row.fnm.clone(),
                row.snm.clone(),
                row.matching.to_string(),
                row.saving_time.clone(),
            ];
            if self.layout.year.is_some() {
                cells.push(row.year.map(|year| year.to_string()).unwrap_or_default());
            }
            if self.layout.mnm.is_some() {
                cells.push(row.mnm.clone().unwrap_or_default());
            }
            if self.layout.has_max_gap {
                cells.push(
                    row.maximum_time_gap
                        .map(|gap| gap.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&cells)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))
    }
}

/// Flatten the cluster map into output rows.
pub(crate) fn flatten(
    clusters: &ClusterSet,
    records: &[Record],
    layout: OutputLayout,
) -> PersonTable {
    let saving_time = chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S %z")
        .to_string();

    let mut rows = Vec::with_capacity(records.len());
    for (person_id, cluster) in clusters.clusters.iter().enumerate() {
        let mut members = cluster.clone();
        members.sort_unstable();
        for id in members {
            let record = &records[id];
            rows.push(OutputRow {
                person_id,
                source: record.source,
                id: record.id.to_string(),
                fnm: record.fnm.clone(),
                snm: record.snm.clone(),
                mnm: record.mnm.clone(),
                matching: record.matching.summary(),
                saving_time: saving_time.clone(),
                year: record.year,
                maximum_time_gap: record.max_time_gap,
            });
        }
    }

    PersonTable { rows, layout }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> NameTable {
        NameTable::new(names.iter().copied())
    }

    #[test]
    fn recognises_common_column_names() {
        let table = header(&["Name ID", "First Name", "Last Name", "Year"]);
        let columns = ColumnMap::identify(&table).unwrap();
        assert_eq!(columns.id, Some(0));
        assert_eq!(columns.fnm, 1);
        assert_eq!(columns.snm, 2);
        assert_eq!(columns.year, Some(3));
        assert_eq!(columns.mnm, None);
    }

    #[test]
    fn recognises_thesaurus_variants() {
        let table = header(&["given", "patronymic", "middle initial", "yr", "id"]);
        let columns = ColumnMap::identify(&table).unwrap();
        assert_eq!(columns.fnm, 0);
        assert_eq!(columns.snm, 1);
        assert_eq!(columns.mnm, Some(2));
        assert_eq!(columns.year, Some(3));
        assert_eq!(columns.id, Some(4));
    }

    #[test]
    fn first_matching_column_wins() {
        let table = header(&["forename", "first name", "surname"]);
        let columns = ColumnMap::identify(&table).unwrap();
        assert_eq!(columns.fnm, 0);
        assert_eq!(columns.snm, 2);
    }

    #[test]
    fn missing_name_columns_are_errors() {
        assert!(matches!(
            ColumnMap::identify(&header(&["surname", "year"])),
            Err(Error::MissingForenameColumn)
        ));
        assert!(matches!(
            ColumnMap::identify(&header(&["forename", "year"])),
            Err(Error::MissingSurnameColumn)
        ));
    }

    #[test]
    fn reads_flexible_csv() {
        let data = "first name,last name,year\nTim,Burton,1982\nTim W.,Burton\n";
        let table = NameTable::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, 2), "1982");
        assert_eq!(table.value(1, 2), "");
    }
}
