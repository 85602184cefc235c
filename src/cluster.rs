use tracing::debug;

use crate::graph::SubsetGraph;
use crate::record::{Record, RecordId, Source};
use crate::relation::{MatchCodes, Relation};
use crate::tree::{Bucket, NameTree, NodeId};
use crate::Persons;

/// Tags that connect nodes when interlaced matching participates.
const RELATED: &[Relation] = &[
    Relation::Identical,
    Relation::MeSubset,
    Relation::ItSubset,
    Relation::Crossed,
];

/// Tags that connect nodes under subset-only matching.
const RELATED_VERTICAL: &[Relation] = &[
    Relation::Identical,
    Relation::MeSubset,
    Relation::ItSubset,
];

/// Clusters under construction: record ids grouped by cluster id, in
/// cluster-creation order. Clusters may become empty when records move.
pub(crate) struct ClusterSet {
    pub clusters: Vec<Vec<RecordId>>,
}

impl ClusterSet {
    pub fn new() -> ClusterSet {
        ClusterSet { clusters: Vec::new() }
    }

    /// Open the next cluster and return its id.
    fn start(&mut self) -> usize {
        self.clusters.push(Vec::new());
        self.clusters.len() - 1
    }

    /// Emit the records of the given nodes as one fresh cluster.
    fn emit_nodes<I>(&mut self, records: &mut [Record], bucket: &Bucket, nodes: I, codes: MatchCodes)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let cluster = self.start();
        for node in nodes {
            for &record in &bucket.nodes[node].records {
                records[record].cluster = Some(cluster);
                records[record].matching = codes;
                self.clusters[cluster].push(record);
            }
        }
    }

    /// Drop empty clusters and renumber the rest densely, writing the new
    /// ids back into the records.
    pub fn remove_empty_and_renumber(&mut self, records: &mut [Record]) {
        self.clusters.retain(|cluster| !cluster.is_empty());
        for (id, cluster) in self.clusters.iter().enumerate() {
            for &record in cluster {
                records[record].cluster = Some(id);
            }
        }
    }
}

/// Collect the connected component of the first queued node over the given
/// relation tags, removing every member from the queue. Discovery edges
/// record `VERTICAL` and `INTERLACED` codes when requested.
fn find_interrelated(
    bucket: &Bucket,
    queue: &mut Vec<NodeId>,
    relevant: &[Relation],
    mut codes: Option<&mut MatchCodes>,
) -> Vec<NodeId> {
    let start = queue.remove(0);
    let mut interrelated = vec![start];
    let mut frontier = vec![start];

    while !frontier.is_empty() {
        let mut discovered: Vec<NodeId> = Vec::new();
        for &node in &frontier {
            for &other in queue.iter() {
                if discovered.contains(&other) {
                    continue;
                }
                let relation = bucket.matrix.get(node, other);
                if !relevant.contains(&relation) {
                    continue;
                }
                discovered.push(other);
                if let Some(codes) = codes.as_deref_mut() {
                    match relation {
                        Relation::Crossed => codes.insert(MatchCodes::INTERLACED),
                        Relation::MeSubset | Relation::ItSubset => {
                            codes.insert(MatchCodes::VERTICAL)
                        }
                        _ => {}
                    }
                }
            }
        }
        queue.retain(|node| !discovered.contains(node));
        interrelated.extend(discovered.iter().copied());
        frontier = discovered;
    }

    interrelated.sort_unstable();
    interrelated
}

/// Find a pure subset (a node related to the component only as `MeSubset`)
/// whose supersets disagree with each other. Crossed superset pairs feed
/// the `INTERLACED` code when requested.
fn conflicted_pure_subset(
    bucket: &Bucket,
    members: &[NodeId],
    mut codes: Option<&mut MatchCodes>,
) -> Option<NodeId> {
    for &item in members {
        let row = bucket.matrix.row(item);
        if row.contains(&Relation::ItSubset) || row.contains(&Relation::Crossed) {
            continue;
        }
        for &first in members {
            if bucket.matrix.get(item, first) != Relation::MeSubset {
                continue;
            }
            for &second in members {
                if bucket.matrix.get(item, second) != Relation::MeSubset {
                    continue;
                }
                match bucket.matrix.get(first, second) {
                    Relation::Different => return Some(item),
                    Relation::Crossed => {
                        if let Some(codes) = codes.as_deref_mut() {
                            codes.insert(MatchCodes::INTERLACED);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    None
}

/// True when no pair of members is `Different`.
fn all_consistent(bucket: &Bucket, members: &[NodeId]) -> bool {
    members
        .iter()
        .all(|&first| members.iter().all(|&second| bucket.matrix.get(first, second) != Relation::Different))
}

/// Emit the pure subset as its own cluster, cut it off in the matrix, and
/// requeue the rest of the component.
fn extract_pure_subset(
    bucket: &mut Bucket,
    records: &mut [Record],
    out: &mut ClusterSet,
    members: &[NodeId],
    subset: NodeId,
    queue: &mut Vec<NodeId>,
) {
    out.emit_nodes(records, bucket, [subset], MatchCodes::EQUAL);
    for other in 0..bucket.matrix.len() {
        if other != subset {
            bucket.matrix.set(subset, other, Relation::Different);
            bucket.matrix.set(other, subset, Relation::Different);
        }
    }
    queue.extend(members.iter().copied().filter(|&member| member != subset));
}

impl Persons {
    /// Walk every surname bucket and emit clusters.
    pub(crate) fn cluster_tree(&self, tree: &mut NameTree, records: &mut [Record]) -> ClusterSet {
        let mut out = ClusterSet::new();
        for (_, bucket) in tree.buckets.iter_mut() {
            self.cluster_bucket(bucket, records, &mut out);
        }
        out
    }

    fn cluster_bucket(&self, bucket: &mut Bucket, records: &mut [Record], out: &mut ClusterSet) {
        let mut queue: Vec<NodeId> = (0..bucket.nodes.len()).collect();

        while !queue.is_empty() {
            let mut consistent = true;
            let mut codes = MatchCodes::EQUAL;
            let mut inner_queue: Vec<NodeId> = Vec::new();

            // Consistent-set matching over subset and crossed relations.
            if self.match_interlaced && self.match_subsets {
                let interrelated = find_interrelated(bucket, &mut queue, RELATED, Some(&mut codes));

                if let Some(subset) = conflicted_pure_subset(bucket, &interrelated, Some(&mut codes))
                {
                    extract_pure_subset(bucket, records, out, &interrelated, subset, &mut queue);
                    continue;
                }

                consistent = all_consistent(bucket, &interrelated);
                if consistent {
                    out.emit_nodes(records, bucket, interrelated, codes);
                } else {
                    // Retry the same component with crossed relations
                    // ignored.
                    inner_queue = interrelated;
                }
            }

            // Subset-only matching, either as the main mode or as the
            // fallback for an inconsistent interlaced component.
            if self.match_subsets && (!self.match_interlaced || !consistent) {
                if !self.match_interlaced {
                    inner_queue = std::mem::take(&mut queue);
                }

                while !inner_queue.is_empty() {
                    let interrelated =
                        find_interrelated(bucket, &mut inner_queue, RELATED_VERTICAL, None);

                    if let Some(subset) = conflicted_pure_subset(bucket, &interrelated, None) {
                        extract_pure_subset(
                            bucket,
                            records,
                            out,
                            &interrelated,
                            subset,
                            &mut inner_queue,
                        );
                        continue;
                    }

                    if interrelated.len() > 1 && interrelated.len() <= self.max_graph_size {
                        let mut graph = SubsetGraph::new(&bucket.matrix, interrelated);
                        graph.transitive_reduction();
                        for strand in graph.single_strands() {
                            let codes = if strand.len() > 1 {
                                MatchCodes::VERTICAL
                            } else {
                                MatchCodes::EQUAL
                            };
                            out.emit_nodes(records, bucket, strand, codes);
                        }
                    } else if interrelated.len() > self.max_graph_size {
                        debug!(
                            size = interrelated.len(),
                            cap = self.max_graph_size,
                            "component exceeds the graph cap, degrading to singletons"
                        );
                        for node in interrelated {
                            out.emit_nodes(records, bucket, [node], MatchCodes::EQUAL);
                        }
                    } else {
                        out.emit_nodes(records, bucket, interrelated, MatchCodes::EQUAL);
                    }
                }
            }

            // Without subset matching only the equal names collapse.
            if !self.match_subsets {
                for node in std::mem::take(&mut queue) {
                    out.emit_nodes(records, bucket, [node], MatchCodes::EQUAL);
                }
                break;
            }
        }
    }

    /// Force clusters holding several known unique persons apart: one
    /// fresh cluster per known record, with equal-named records following
    /// their anchor.
    pub(crate) fn split_known_persons(&self, out: &mut ClusterSet, records: &mut [Record]) {
        let existing = out.clusters.len();
        for cluster in 0..existing {
            let known: Vec<RecordId> = out.clusters[cluster]
                .iter()
                .copied()
                .filter(|&record| records[record].source == Source::KnownUnique)
                .collect();
            if known.len() < 2 {
                continue;
            }
            debug!(cluster, count = known.len(), "separating known unique persons");

            let mut fresh: Vec<usize> = Vec::with_capacity(known.len());
            for &record in &known {
                let id = out.start();
                records[record].matching = MatchCodes::MULTIPLE_KNOWN_SEPARATED;
                records[record].cluster = Some(id);
                out.clusters[id].push(record);
                fresh.push(id);
            }
            out.clusters[cluster].retain(|record| !known.contains(record));

            for &id in &fresh {
                let anchor = records[out.clusters[id][0]].fnm_normalized.clone();
                let remaining: Vec<RecordId> = out.clusters[cluster].clone();
                for record in remaining {
                    if self.compare(&anchor, &records[record].fnm_normalized) == Relation::Equal {
                        records[record].matching = MatchCodes::MULTIPLE_KNOWN_SEPARATED;
                        records[record].cluster = Some(id);
                        out.clusters[id].push(record);
                        out.clusters[cluster].retain(|&other| other != record);
                    } else {
                        records[record].matching = MatchCodes::MOVED_FROM_MULTIPLE_KNOWN;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::record;

    fn cluster_ids(records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .map(|record| record.cluster.expect("record left unclustered"))
            .collect()
    }

    fn run(persons: &Persons, mut records: Vec<Record>) -> (Vec<Record>, ClusterSet) {
        let mut tree = persons.build_tree(&records);
        let mut out = persons.cluster_tree(&mut tree, &mut records);
        persons.split_known_persons(&mut out, &mut records);
        out.remove_empty_and_renumber(&mut records);
        (records, out)
    }

    #[test]
    fn subset_chain_forms_one_cluster() {
        let records = vec![
            record("albert", "einstein"),
            record("albert l", "einstein"),
            record("albert lawrence", "einstein"),
        ];
        let (records, out) = run(&Persons::new(), records);
        assert_eq!(cluster_ids(&records), vec![0, 0, 0]);
        assert!(records
            .iter()
            .all(|record| record.matching.contains(MatchCodes::VERTICAL)));
        assert_eq!(out.clusters.len(), 1);
    }

    #[test]
    fn conflicting_supersets_extract_the_pure_subsets() {
        let records = vec![
            record("albert", "einstein"),
            record("albert l", "einstein"),
            record("albert lawrence", "einstein"),
            record("albert lucky", "einstein"),
        ];
        let (records, out) = run(&Persons::new(), records);
        // "albert" and "albert l" are pure subsets of both conflicting
        // expansions and end up alone.
        let ids = cluster_ids(&records);
        assert_eq!(out.clusters.len(), 4);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert!(records.iter().all(|record| record.matching == MatchCodes::EQUAL));
    }

    #[test]
    fn interlaced_component_clusters_only_when_enabled() {
        let records = vec![
            record("reinhard", "selten"),
            record("reinhard h", "selten"),
            record("r harald", "selten"),
        ];

        let (subset_records, subset_out) = run(&Persons::new(), records.clone());
        assert_eq!(subset_out.clusters.len(), 2);
        assert_eq!(
            subset_records[0].cluster,
            subset_records[1].cluster,
            "subset pair stays together"
        );
        assert_ne!(subset_records[2].cluster, subset_records[0].cluster);

        let mut persons = Persons::new();
        persons.match_interlaced = true;
        let (interlaced_records, interlaced_out) = run(&persons, records);
        assert_eq!(interlaced_out.clusters.len(), 1);
        assert!(interlaced_records
            .iter()
            .all(|record| record.matching.contains(MatchCodes::INTERLACED)));
    }

    #[test]
    fn inconsistent_interlaced_component_falls_back_to_subsets() {
        // "reinhard" links everything; "reinhard v" conflicts with the
        // crossed pair, and the crossed relation to "r harald" keeps
        // "reinhard" from being a pure subset.
        let records = vec![
            record("reinhard", "selten"),
            record("reinhard h", "selten"),
            record("r harald", "selten"),
            record("reinhard v", "selten"),
        ];
        let mut persons = Persons::new();
        persons.match_interlaced = true;
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 4);
        assert!(records.iter().all(|record| record.matching == MatchCodes::EQUAL));
    }

    #[test]
    fn without_subsets_only_equal_names_share_a_cluster() {
        let mut persons = Persons::new();
        persons.match_subsets = false;
        let records = vec![
            record("tim", "burton"),
            record("tim", "burton"),
            record("tim w", "burton"),
        ];
        let (records, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 2);
        assert_eq!(records[0].cluster, records[1].cluster);
        assert_ne!(records[0].cluster, records[2].cluster);
    }

    #[test]
    fn oversized_components_degrade_to_singletons() {
        let mut persons = Persons::new();
        persons.max_graph_size = 2;
        let records = vec![
            record("albert", "einstein"),
            record("albert l", "einstein"),
            record("albert lawrence", "einstein"),
        ];
        let (_, out) = run(&persons, records);
        assert_eq!(out.clusters.len(), 3);
    }

    #[test]
    fn known_unique_records_never_share_a_cluster() {
        let mut known_tim = record("tim", "burton");
        known_tim.source = Source::KnownUnique;
        let mut known_tim_w = record("tim w", "burton");
        known_tim_w.source = Source::KnownUnique;

        let records = vec![
            record("tim", "burton"),
            record("tim w", "burton"),
            known_tim,
            known_tim_w,
        ];
        let (records, out) = run(&Persons::new(), records);
        assert_eq!(out.clusters.len(), 2);
        assert_eq!(records[0].cluster, records[2].cluster);
        assert_eq!(records[1].cluster, records[3].cluster);
        assert_ne!(records[2].cluster, records[3].cluster);
        assert!(records
            .iter()
            .all(|record| record.matching == MatchCodes::MULTIPLE_KNOWN_SEPARATED));
    }
}
