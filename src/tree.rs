use compact_str::CompactString;
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::record::{Record, RecordId};
use crate::relation::Relation;
use crate::Persons;

pub(crate) type NodeId = usize;

/// All records of one surname whose forenames compare `Equal`.
pub(crate) struct Node {
    pub fnm: CompactString,
    pub records: Vec<RecordId>,
}

/// Flat n×n relation matrix over the nodes of one surname bucket.
///
/// Grown one node at a time; the symmetric column is derived from the new
/// row via `Relation::flip`, and the diagonal is always `Identical`.
#[derive(Clone)]
pub(crate) struct Matrix {
    n: usize,
    cells: Vec<Relation>,
}

impl Matrix {
    /// The 1×1 matrix of a fresh bucket.
    pub fn single() -> Matrix {
        Matrix {
            n: 1,
            cells: vec![Relation::Identical],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> Relation {
        self.cells[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, relation: Relation) {
        self.cells[i * self.n + j] = relation;
    }

    pub fn row(&self, i: usize) -> &[Relation] {
        &self.cells[i * self.n..(i + 1) * self.n]
    }

    /// Append a node given its relations to the existing nodes, in node
    /// order.
    pub fn push_node(&mut self, row: &[Relation]) {
        debug_assert_eq!(row.len(), self.n);

        let n = self.n + 1;
        let mut cells = Vec::with_capacity(n * n);
        for i in 0..self.n {
            cells.extend_from_slice(self.row(i));
            cells.push(row[i].flip());
        }
        cells.extend_from_slice(row);
        cells.push(Relation::Identical);

        self.n = n;
        self.cells = cells;
    }
}

/// One surname's nodes and their relation matrix.
pub(crate) struct Bucket {
    pub nodes: Vec<Node>,
    pub matrix: Matrix,
}

/// Records bucketed by normalized surname, in input order.
pub(crate) struct NameTree {
    pub buckets: IndexMap<CompactString, Bucket>,
}

impl Persons {
    /// Bucket records by surname, collapsing equal forenames into nodes
    /// and recording pairwise relations as each node is committed.
    pub(crate) fn build_tree(&self, records: &[Record]) -> NameTree {
        let mut buckets: IndexMap<CompactString, Bucket> = IndexMap::new();

        for (id, record) in records.iter().enumerate() {
            let bucket = match buckets.entry(record.snm_normalized.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(Bucket {
                        nodes: vec![Node {
                            fnm: record.fnm_normalized.clone(),
                            records: vec![id],
                        }],
                        matrix: Matrix::single(),
                    });
                    continue;
                }
                Entry::Occupied(entry) => entry.into_mut(),
            };

            let mut row = Vec::with_capacity(bucket.nodes.len());
            let mut merged = false;
            for node in &mut bucket.nodes {
                let relation = self.compare(&record.fnm_normalized, &node.fnm);
                if relation == Relation::Equal {
                    node.records.push(id);
                    merged = true;
                    break;
                }
                row.push(relation);
            }

            if !merged {
                bucket.nodes.push(Node {
                    fnm: record.fnm_normalized.clone(),
                    records: vec![id],
                });
                bucket.matrix.push_node(&row);
            }
        }

        NameTree { buckets }
    }
}
