//! Sepset search over possible-d-sep sets.

use ancestra_graph::{MixedGraph, NodeId};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;
use crate::independence::IndependenceTest;
use crate::sepsets::{first_independent_subset, SepsetProducer};

/// Conditions on the possible-d-sep set of each endpoint instead of plain
/// adjacency.
///
/// In PAG-from-data settings with latent confounding, valid conditioning
/// sets can lie outside the adjacency of either endpoint; the
/// possible-d-sep search (bounded by `max_path_length`) covers those
/// cases at higher cost.
pub struct SepsetsPossibleMsep<T> {
    graph: MixedGraph,
    test: T,
    depth: Option<usize>,
    max_path_length: Option<usize>,
}

impl<T: IndependenceTest> SepsetsPossibleMsep<T> {
    /// Searches over the given graph; `depth` caps subset sizes and
    /// `max_path_length` bounds the possible-d-sep path search.
    pub fn new(
        graph: MixedGraph,
        test: T,
        depth: Option<usize>,
        max_path_length: Option<usize>,
    ) -> Self {
        Self {
            graph,
            test,
            depth,
            max_path_length,
        }
    }

    fn pool(&self, around: NodeId, other: NodeId, exclude: &FxHashSet<NodeId>) -> Vec<NodeId> {
        self.graph
            .possible_dsep(around, self.max_path_length)
            .into_iter()
            .filter(|&n| n != around && n != other && !exclude.contains(&n))
            .collect()
    }

    fn search(
        &self,
        a: NodeId,
        b: NodeId,
        required: &FxHashSet<NodeId>,
    ) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
        for (from, to) in [(a, b), (b, a)] {
            let pool = self.pool(from, to, required);
            if let Some(s) =
                first_independent_subset(&self.test, a, b, &pool, required, self.depth)?
            {
                return Ok(Some(s));
            }
        }
        Ok(None)
    }
}

impl<T: IndependenceTest> SepsetProducer for SepsetsPossibleMsep<T> {
    fn sepset(&mut self, a: NodeId, b: NodeId)
        -> Result<Option<FxHashSet<NodeId>>, SearchError> {
        self.search(a, b, &FxHashSet::default())
    }

    fn sepset_containing(
        &mut self,
        a: NodeId,
        b: NodeId,
        must_include: &FxHashSet<NodeId>,
    ) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
        self.search(a, b, must_include)
    }

    fn is_unshielded_collider(
        &mut self,
        i: NodeId,
        j: NodeId,
        k: NodeId,
    ) -> Result<bool, SearchError> {
        Ok(match self.sepset(i, k)? {
            Some(s) => !s.contains(&j),
            None => false,
        })
    }

    fn is_independent(
        &mut self,
        a: NodeId,
        b: NodeId,
        s: &FxHashSet<NodeId>,
    ) -> Result<bool, SearchError> {
        Ok(self.test.check_independence(a, b, s)?.independent)
    }

    fn p_value(&mut self, a: NodeId, b: NodeId, s: &FxHashSet<NodeId>)
        -> Result<f64, SearchError> {
        Ok(self.test.check_independence(a, b, s)?.p_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::independence::MsepTest;
    use ancestra_graph::Endpoint;

    /// On a spurious working edge A-D over a true chain, the
    /// possible-d-sep pool of D reaches C and the producer separates the
    /// pair.
    #[test]
    fn separates_spurious_edge_via_pdsep_pool() {
        let mut truth = MixedGraph::new();
        let a = truth.add_measured_node("A").unwrap();
        let b = truth.add_measured_node("B").unwrap();
        let c = truth.add_measured_node("C").unwrap();
        let d = truth.add_measured_node("D").unwrap();
        truth.add_directed_edge(a, b).unwrap();
        truth.add_directed_edge(b, c).unwrap();
        truth.add_directed_edge(c, d).unwrap();

        // Working skeleton carrying a spurious A-D edge.
        let mut skeleton = truth.clone();
        skeleton.add_nondirected_edge(a, d).unwrap();
        skeleton.reorient_all_with(Endpoint::Circle);

        let mut producer =
            SepsetsPossibleMsep::new(skeleton, MsepTest::new(truth), None, None);
        let s = producer.sepset(a, d).unwrap().expect("sepset");
        assert!(s.contains(&b) || s.contains(&c));
    }
}
