//! Deterministic disambiguation of person names in tabular records.
//!
//! Given a table of name records (forename, surname, optional middle name,
//! year and id), [`Persons::persons_from_names`] assigns each record a
//! `person_id` such that records sharing an id are judged to refer to the
//! same real-world individual. Matching is driven by a small algebra of
//! relations between forename strings ([`Relation`]): within one surname,
//! names collapse into nodes, the pairwise relation matrix is clustered,
//! and ambiguous subset structures are resolved by transitive reduction of
//! the subset graph.
//!
//! # Examples
//! ```
//! use persons::{NameTable, Persons};
//!
//! let mut table = NameTable::new(["name id", "first name", "last name"]);
//! table.push_row(["1", "Tim", "Burton"]);
//! table.push_row(["2", "Tim W.", "Burton"]);
//!
//! let result = Persons::new().persons_from_names(&table, None).unwrap();
//! assert_eq!(result.person_count(), 1);
//! assert_eq!(result.rows()[0].person_id, result.rows()[1].person_id);
//! ```
//!
//! A second table of previously identified unique persons can be passed to
//! keep those individuals apart even when their names would otherwise
//! merge; see [`Persons::persons_from_names`].

mod cluster;
mod comparison;
mod error;
mod graph;
mod normalize;
mod record;
mod relation;
mod table;
mod timegap;
mod tree;

pub use crate::error::Error;
pub use crate::normalize::{normalize, remove_particles};
pub use crate::record::Source;
pub use crate::relation::{MatchCodes, Relation};
pub use crate::table::{NameTable, OutputRow, PersonTable};
pub use crate::timegap::TimeGapMode;

use std::path::Path;
use tracing::info;

use crate::record::{intake, Record};
use crate::table::{ColumnMap, OutputLayout};

/// Configuration for one disambiguation job.
///
/// A value carries only options and can run any number of jobs; the
/// defaults match the conservative subset-matching policy.
#[derive(Debug, Clone)]
pub struct Persons {
    /// Strip noble particles (`van`, `von`, `de`, ...) from surnames.
    pub remove_particles_suffixes: bool,
    /// Apply [`normalize`] to all name fields.
    pub normalize_names: bool,
    /// Keep only the first forename component.
    pub only_first_fnm: bool,
    /// Match names only when their middle initials are identical
    /// (Jones, 2009).
    pub middle_name_rule: bool,
    /// Match names that carry strictly less, but consistent, information.
    pub match_subsets: bool,
    /// Match names that are compatible without either containing the
    /// other.
    pub match_interlaced: bool,
    /// Align forename components in any order.
    pub ignore_order_of_forenames: bool,
    /// In ordered alignment, require initials to agree position by
    /// position.
    pub absolute_position_matters: bool,
    /// Year handling applied to finished clusters.
    pub time_gap: TimeGapMode,
    /// Largest year gap tolerated inside one cluster when splitting.
    pub maximum_time_gap: i32,
    /// Largest component handed to transitive reduction; bigger ones
    /// degrade to singleton clusters.
    pub max_graph_size: usize,
}

impl Default for Persons {
    fn default() -> Persons {
        Persons {
            remove_particles_suffixes: true,
            normalize_names: true,
            only_first_fnm: false,
            middle_name_rule: false,
            match_subsets: true,
            match_interlaced: false,
            ignore_order_of_forenames: false,
            absolute_position_matters: true,
            time_gap: TimeGapMode::Off,
            maximum_time_gap: 50,
            max_graph_size: 50,
        }
    }
}

impl Persons {
    pub fn new() -> Persons {
        Persons::default()
    }

    /// Identify persons in a table of names.
    ///
    /// Forename and surname columns are recognised by name and mandatory;
    /// id, middle-name and year columns are optional. `known_persons`, if
    /// given, is a table of previously identified unique individuals: its
    /// records join the clustering, and any cluster that captures more
    /// than one of them is split apart again.
    ///
    /// Rows whose normalized forename or surname is empty, or whose year
    /// is not an integer, are skipped and do not appear in the output.
    pub fn persons_from_names(
        &self,
        name_table: &NameTable,
        known_persons: Option<&NameTable>,
    ) -> Result<PersonTable, Error> {
        let columns = ColumnMap::identify(name_table)?;
        let report_gaps = self.time_gap == TimeGapMode::Report && columns.year.is_some();
        let layout = OutputLayout::from_input(name_table, &columns, report_gaps);

        let mut records: Vec<Record> = Vec::with_capacity(name_table.len());
        intake(name_table, &columns, Source::Default, self, &mut records);
        if let Some(known) = known_persons {
            let known_columns = ColumnMap::identify(known)?;
            intake(known, &known_columns, Source::KnownUnique, self, &mut records);
        }

        info!(records = records.len(), "building surname tree");
        let mut tree = self.build_tree(&records);

        info!(surnames = tree.buckets.len(), "clustering");
        let mut clusters = self.cluster_tree(&mut tree, &mut records);
        self.split_known_persons(&mut clusters, &mut records);

        if self.time_gap != TimeGapMode::Off && columns.year.is_some() {
            info!(maximum = self.maximum_time_gap, "applying time gaps");
            self.apply_time_gap(&mut clusters, &mut records);
        }

        clusters.remove_empty_and_renumber(&mut records);
        info!(persons = clusters.clusters.len(), "done");

        Ok(table::flatten(&clusters, &records, layout))
    }

    /// Read the input (and optionally a known-persons table) from CSV
    /// files and identify persons.
    pub fn persons_from_csv(
        &self,
        input: impl AsRef<Path>,
        known_persons: Option<&Path>,
    ) -> Result<PersonTable, Error> {
        let table = NameTable::from_csv_path(input)?;
        let known = known_persons.map(NameTable::from_csv_path).transpose()?;
        self.persons_from_names(&table, known.as_ref())
    }
}
