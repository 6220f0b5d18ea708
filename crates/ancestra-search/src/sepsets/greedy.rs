//! Greedy sepset search: first independent subset wins.

use ancestra_graph::{MixedGraph, NodeId};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;
use crate::independence::IndependenceTest;
use crate::sepsets::{adjacency_pool, first_independent_subset, SepsetProducer};

/// Returns the first conditioning subset, searched by increasing size
/// over adj(a) then adj(b), for which the test reports independence.
///
/// Deterministic given the skeleton's insertion-ordered adjacency.
pub struct SepsetsGreedy<T> {
    graph: MixedGraph,
    test: T,
    depth: Option<usize>,
}

impl<T: IndependenceTest> SepsetsGreedy<T> {
    /// Searches over the given skeleton with subset sizes capped at
    /// `depth` (None = uncapped).
    pub fn new(graph: MixedGraph, test: T, depth: Option<usize>) -> Self {
        Self { graph, test, depth }
    }

    fn search(
        &self,
        a: NodeId,
        b: NodeId,
        required: &FxHashSet<NodeId>,
    ) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
        for (from, to) in [(a, b), (b, a)] {
            let pool = adjacency_pool(&self.graph, from, to, required);
            if let Some(s) =
                first_independent_subset(&self.test, a, b, &pool, required, self.depth)?
            {
                return Ok(Some(s));
            }
        }
        Ok(None)
    }
}

impl<T: IndependenceTest> SepsetProducer for SepsetsGreedy<T> {
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

    /// A -> B <- C chain skeleton; sepset of (A, C) is empty and excludes
    /// B, so the triple is judged a collider.
    #[test]
    fn collider_judged_from_sepset() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(c, b).unwrap();

        let mut skeleton = g.clone();
        skeleton.reorient_all_with(ancestra_graph::Endpoint::Circle);
        let mut producer = SepsetsGreedy::new(skeleton, MsepTest::new(g), None);

        let s = producer.sepset(a, c).unwrap().expect("sepset");
        assert!(s.is_empty());
        assert!(producer.is_unshielded_collider(a, b, c).unwrap());
    }

    /// A -> B -> C: every sepset of (A, C) contains B, so no collider.
    #[test]
    fn noncollider_when_sepset_contains_middle() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(b, c).unwrap();

        let mut skeleton = g.clone();
        skeleton.reorient_all_with(ancestra_graph::Endpoint::Circle);
        let mut producer = SepsetsGreedy::new(skeleton, MsepTest::new(g), None);

        let s = producer.sepset(a, c).unwrap().expect("sepset");
        assert!(s.contains(&b));
        assert!(!producer.is_unshielded_collider(a, b, c).unwrap());
    }

    /// The containing variant only proposes supersets of the required
    /// set.
    #[test]
    fn sepset_containing_honors_superset_contract() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        let d = g.add_measured_node("D").unwrap();
        // A -> B -> C, A -> D -> C: both {B, D} and each singleton... only
        // {B, D} blocks both routes.
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(b, c).unwrap();
        g.add_directed_edge(a, d).unwrap();
        g.add_directed_edge(d, c).unwrap();

        let mut skeleton = g.clone();
        skeleton.reorient_all_with(ancestra_graph::Endpoint::Circle);
        let mut producer = SepsetsGreedy::new(skeleton, MsepTest::new(g), None);

        let mut required = FxHashSet::default();
        required.insert(d);
        let s = producer
            .sepset_containing(a, c, &required)
            .unwrap()
            .expect("sepset");
        assert!(s.contains(&d));
        assert!(s.contains(&b));
    }

    #[test]
    fn depth_zero_finds_nothing_for_dependent_pair() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(b, c).unwrap();
        let mut skeleton = g.clone();
        skeleton.reorient_all_with(ancestra_graph::Endpoint::Circle);
        let mut producer = SepsetsGreedy::new(skeleton, MsepTest::new(g), Some(0));
        assert!(producer.sepset(a, c).unwrap().is_none());
    }
}
