//! The local-score seam.

use ancestra_graph::{MixedGraph, NodeId};

/// A decomposable score oracle: the local score of a node given a parent
/// set.
///
/// Statistical scores (BIC, BDeu, ...) live outside this workspace; the
/// implementation shipped here is [`GraphScore`], which scores against a
/// known DAG and is used by score-based strategies in tests and
/// oracle-driven searches.
pub trait Score {
    /// The local score of `node` with the given parent set.
    fn local_score(&self, node: NodeId, parents: &[NodeId]) -> f64;

    /// The variables this score can answer about, in a stable order.
    fn variables(&self) -> Vec<NodeId>;
}

/// Scores parent sets against a reference DAG: +1 for each true parent in
/// the candidate set, -1 for each spurious member.
///
/// Under any permutation consistent with the reference DAG, grow-shrink
/// against this score recovers exactly the DAG's parent sets; under a
/// reordered permutation the recoverable structure changes, which is what
/// the score-based strategy's tuck probes exploit.
#[derive(Debug, Clone)]
pub struct GraphScore {
    dag: MixedGraph,
}

impl GraphScore {
    /// Wraps a reference DAG.
    pub fn new(dag: MixedGraph) -> Self {
        Self { dag }
    }

    /// The reference DAG.
    pub fn graph(&self) -> &MixedGraph {
        &self.dag
    }
}

impl Score for GraphScore {
    fn local_score(&self, node: NodeId, parents: &[NodeId]) -> f64 {
        let truth = self.dag.parents(node);
        let mut s = 0.0;
        for p in parents {
            if truth.contains(p) {
                s += 1.0;
            } else {
                s -= 1.0;
            }
        }
        s
    }

    fn variables(&self) -> Vec<NodeId> {
        self.dag.measured_nodes()
    }
}
