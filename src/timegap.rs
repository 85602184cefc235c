use tracing::debug;

use crate::cluster::ClusterSet;
use crate::record::{Record, RecordId};
use crate::relation::MatchCodes;
use crate::Persons;

/// What to do with year stamps inside finished clusters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TimeGapMode {
    /// Leave clusters as the relation algebra built them.
    #[default]
    Off,
    /// Stamp every record with the largest year gap seen in its cluster.
    Report,
    /// Divide clusters wherever chronologically adjacent records are
    /// further apart than `maximum_time_gap`.
    Split,
}

impl Persons {
    /// Sort each cluster by year and apply the configured gap handling.
    /// Records without a year sort first and never delimit a gap.
    pub(crate) fn apply_time_gap(&self, out: &mut ClusterSet, records: &mut [Record]) {
        let existing = out.clusters.len();
        for cluster in 0..existing {
            out.clusters[cluster].sort_by_key(|&record| records[record].year.unwrap_or(i32::MIN));
            match self.time_gap {
                TimeGapMode::Split => self.split_at_gaps(out, records, cluster),
                TimeGapMode::Report => report_max_gap(out, records, cluster),
                TimeGapMode::Off => {}
            }
        }
    }

    fn split_at_gaps(&self, out: &mut ClusterSet, records: &mut [Record], cluster: usize) {
        let members = std::mem::take(&mut out.clusters[cluster]);

        let mut segments: Vec<Vec<RecordId>> = Vec::new();
        let mut current: Vec<RecordId> = Vec::new();
        for &record in &members {
            if let (Some(&previous), Some(year)) = (current.last(), records[record].year) {
                if let Some(previous_year) = records[previous].year {
                    if year - previous_year > self.maximum_time_gap {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
            current.push(record);
        }

        if segments.is_empty() {
            out.clusters[cluster] = current;
            return;
        }
        segments.push(current);
        debug!(cluster, pieces = segments.len(), "splitting cluster at year gaps");

        for &record in &members {
            records[record].matching.insert(MatchCodes::SPLIT_AT_TIME_GAP);
        }

        let mut segments = segments.into_iter();
        if let Some(first) = segments.next() {
            out.clusters[cluster] = first;
        }
        for segment in segments {
            let id = out.clusters.len();
            for &record in &segment {
                records[record].cluster = Some(id);
            }
            out.clusters.push(segment);
        }
    }
}

fn report_max_gap(out: &ClusterSet, records: &mut [Record], cluster: usize) {
    let members = &out.clusters[cluster];

    let mut max_gap = 0;
    for pair in members.windows(2) {
        if let (Some(earlier), Some(later)) = (records[pair[0]].year, records[pair[1]].year) {
            max_gap = max_gap.max(later - earlier);
        }
    }
    for &record in members {
        records[record].max_time_gap = Some(max_gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::record;
    use crate::record::Record;

    fn dated(fnm: &str, snm: &str, year: i32) -> Record {
        let mut record = record(fnm, snm);
        record.year = Some(year);
        record
    }

    fn run(persons: &Persons, mut records: Vec<Record>) -> (Vec<Record>, ClusterSet) {
        let mut tree = persons.build_tree(&records);
        let mut out = persons.cluster_tree(&mut tree, &mut records);
        persons.apply_time_gap(&mut out, &mut records);
        out.remove_empty_and_renumber(&mut records);
        (records, out)
    }

    #[test]
    fn splits_where_the_gap_exceeds_the_maximum() {
        let mut persons = Persons::new();
        persons.time_gap = TimeGapMode::Split;
        let records = vec![
            dated("tim", "burton", 1900),
            dated("tim", "burton", 1920),
            dated("tim", "burton", 1990),
        ];
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 2);
        assert_eq!(records[0].cluster, records[1].cluster);
        assert_ne!(records[0].cluster, records[2].cluster);
        assert!(records
            .iter()
            .all(|record| record.matching.contains(MatchCodes::SPLIT_AT_TIME_GAP)));
    }

    #[test]
    fn every_gap_starts_a_new_cluster() {
        let mut persons = Persons::new();
        persons.time_gap = TimeGapMode::Split;
        persons.maximum_time_gap = 10;
        let records = vec![
            dated("tim", "burton", 1900),
            dated("tim", "burton", 1950),
            dated("tim", "burton", 2000),
        ];
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 3);
        let mut ids: Vec<_> = records.iter().map(|record| record.cluster).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn close_years_stay_together() {
        let mut persons = Persons::new();
        persons.time_gap = TimeGapMode::Split;
        let records = vec![
            dated("tim", "burton", 1900),
            dated("tim", "burton", 1950),
        ];
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 1);
        assert!(!records[0].matching.contains(MatchCodes::SPLIT_AT_TIME_GAP));
    }

    #[test]
    fn records_without_a_year_never_delimit_a_gap() {
        let mut persons = Persons::new();
        persons.time_gap = TimeGapMode::Split;
        let mut undated = record("tim", "burton");
        undated.year = None;
        let records = vec![
            dated("tim", "burton", 1900),
            undated,
            dated("tim", "burton", 1990),
        ];
        let (_, out) = run(&persons, records);
        // The undated record sorts first; 1900 → 1990 still splits.
        assert_eq!(out.clusters.len(), 2);
    }

    #[test]
    fn report_mode_stamps_the_largest_gap() {
        let mut persons = Persons::new();
        persons.time_gap = TimeGapMode::Report;
        let records = vec![
            dated("tim", "burton", 1900),
            dated("tim", "burton", 1920),
            dated("tim", "burton", 1990),
        ];
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 1);
        assert!(records
            .iter()
            .all(|record| record.max_time_gap == Some(70)));
    }
}
