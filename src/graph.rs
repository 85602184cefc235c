use std::collections::HashSet;

use crate::relation::Relation;
use crate::tree::{Matrix, NodeId};

/// Clustering descends the subset DAG along `ItSubset` edges.
const MAIN_DIRECTION: Relation = Relation::ItSubset;
const MAIN_DIRECTION_BACKWARDS: Relation = Relation::MeSubset;

/// The subset DAG over a set of interrelated nodes, detached from the
/// bucket matrix so that edge removal does not disturb it.
pub(crate) struct SubsetGraph {
    members: Vec<NodeId>,
    adj: Vec<Option<Relation>>,
}

impl SubsetGraph {
    /// Restrict the bucket matrix to `members` (bucket node ids).
    pub fn new(matrix: &Matrix, members: Vec<NodeId>) -> SubsetGraph {
        let mut adj = Vec::with_capacity(members.len() * members.len());
        for &a in &members {
            for &b in &members {
                adj.push(Some(matrix.get(a, b)));
            }
        }
        SubsetGraph { members, adj }
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn at(&self, i: usize, j: usize) -> Option<Relation> {
        self.adj[i * self.len() + j]
    }

    fn count(&self, i: usize, relation: Relation) -> usize {
        let n = self.len();
        self.adj[i * n..(i + 1) * n]
            .iter()
            .filter(|&&cell| cell == Some(relation))
            .count()
    }

    /// Remove transitive shortcuts: for every chain `x → y → z` along the
    /// main direction, the direct edge `x → z` is dropped (both
    /// directions).
    pub fn transitive_reduction(&mut self) {
        let n = self.len();
        let mut shortcuts = Vec::new();
        for x in 0..n {
            for y in 0..n {
                if self.at(x, y) != Some(MAIN_DIRECTION) {
                    continue;
                }
                for z in 0..n {
                    if z != y && self.at(y, z) == Some(MAIN_DIRECTION) {
                        shortcuts.push((x, z));
                    }
                }
            }
        }
        for (x, z) in shortcuts {
            self.adj[x * n + z] = None;
            self.adj[z * n + x] = None;
        }
    }

    /// Sources of the DAG: nodes with no incoming main-direction edge.
    fn top_nodes(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&node| self.count(node, MAIN_DIRECTION_BACKWARDS) == 0)
            .collect()
    }

    /// Split the DAG into vertical chains. Nodes with several predecessors
    /// or several successors become singleton strands and each outgoing
    /// fork seeds a new strand. Strands are deduplicated by content,
    /// keeping first-discovery order, and reported as bucket node ids.
    pub fn single_strands(&self) -> Vec<Vec<NodeId>> {
        let mut completed: Vec<Vec<usize>> = Vec::new();
        for top in self.top_nodes() {
            self.strands_from(&mut completed, Vec::new(), top);
        }

        let mut seen = HashSet::new();
        completed.retain(|strand| seen.insert(strand.clone()));

        completed
            .into_iter()
            .map(|strand| strand.into_iter().map(|i| self.members[i]).collect())
            .collect()
    }

    fn strands_from(&self, completed: &mut Vec<Vec<usize>>, mut current: Vec<usize>, node: usize) {
        let predecessors = self.count(node, MAIN_DIRECTION_BACKWARDS);
        let successors = self.count(node, MAIN_DIRECTION);

        if predecessors > 1 || successors > 1 {
            // A joining or forking node is a strand of its own.
            if !current.is_empty() {
                completed.push(current);
            }
            completed.push(vec![node]);
            for next in 0..self.len() {
                if self.at(node, next) == Some(MAIN_DIRECTION) {
                    self.strands_from(completed, Vec::new(), next);
                }
            }
        } else if successors == 1 {
            current.push(node);
            let next = (0..self.len()).find(|&j| self.at(node, j) == Some(MAIN_DIRECTION));
            match next {
                Some(next) => self.strands_from(completed, current, next),
                None => completed.push(current),
            }
        } else {
            current.push(node);
            completed.push(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Matrix;

    /// A five-node bucket mixing chains, crossings and conflicts:
    /// `0 → 2 → 4`, `1 → 3`, `1 → 4`, plus crossed pairs (0,1), (0,3),
    /// (1,2) and different pairs (2,3), (3,4).
    fn mixed_matrix() -> Matrix {
        let mut matrix = Matrix::single();
        matrix.push_node(&[Relation::Crossed]);
        matrix.push_node(&[Relation::MeSubset, Relation::Crossed]);
        matrix.push_node(&[Relation::Crossed, Relation::MeSubset, Relation::Different]);
        matrix.push_node(&[
            Relation::MeSubset,
            Relation::MeSubset,
            Relation::MeSubset,
            Relation::Different,
        ]);
        matrix
    }

    #[test]
    fn reduction_removes_the_shortcut_edge() {
        let matrix = mixed_matrix();
        assert_eq!(matrix.get(0, 4), Relation::ItSubset);

        let mut graph = SubsetGraph::new(&matrix, vec![0, 1, 2, 3, 4]);
        graph.transitive_reduction();

        // 0 → 2 → 4 makes 0 → 4 a shortcut.
        assert_eq!(graph.at(0, 4), None);
        assert_eq!(graph.at(4, 0), None);
        assert_eq!(graph.at(0, 2), Some(Relation::ItSubset));
        assert_eq!(graph.at(2, 4), Some(Relation::ItSubset));
    }

    #[test]
    fn top_nodes_have_no_predecessors() {
        let mut graph = SubsetGraph::new(&mixed_matrix(), vec![0, 1, 2, 3, 4]);
        graph.transitive_reduction();
        assert_eq!(graph.top_nodes(), vec![0, 1]);
    }

    #[test]
    fn strands_split_at_joins_and_forks() {
        let mut graph = SubsetGraph::new(&mixed_matrix(), vec![0, 1, 2, 3, 4]);
        graph.transitive_reduction();
        // Node 4 keeps two predecessors (2 and 1) and becomes a singleton;
        // node 1 forks into 3 and 4 and becomes a singleton too.
        assert_eq!(
            graph.single_strands(),
            vec![vec![0, 2], vec![4], vec![1], vec![3]]
        );
    }

    #[test]
    fn a_pure_chain_is_one_strand() {
        let mut matrix = Matrix::single();
        matrix.push_node(&[Relation::ItSubset]);
        matrix.push_node(&[Relation::ItSubset, Relation::ItSubset]);

        let mut graph = SubsetGraph::new(&matrix, vec![0, 1, 2]);
        graph.transitive_reduction();
        assert_eq!(graph.single_strands(), vec![vec![2, 1, 0]]);
    }

    #[test]
    fn members_map_back_to_bucket_node_ids() {
        let mut matrix = Matrix::single();
        matrix.push_node(&[Relation::Different]);
        matrix.push_node(&[Relation::Different, Relation::ItSubset]);

        let graph = SubsetGraph::new(&matrix, vec![1, 2]);
        assert_eq!(graph.single_strands(), vec![vec![2, 1]]);
    }
}
