//! Extreme-p-value sepset search (min-p and max-p variants).

use ancestra_graph::{MixedGraph, NodeId};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;
use crate::independence::IndependenceTest;
use crate::sepsets::{adjacency_pool, Combinations, SepsetProducer};

/// Shared exhaustive search keeping the independent subset with the
/// extreme p-value; ties broken by first-found.
fn extreme_search<T: IndependenceTest>(
    graph: &MixedGraph,
    test: &T,
    a: NodeId,
    b: NodeId,
    required: &FxHashSet<NodeId>,
    depth: Option<usize>,
    keep_max: bool,
) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
    let mut best: Option<(FxHashSet<NodeId>, f64)> = None;
    for (from, to) in [(a, b), (b, a)] {
        let pool = adjacency_pool(graph, from, to, required);
        let max_size = depth.unwrap_or(pool.len()).min(pool.len());
        for size in 0..=max_size {
            for combo in Combinations::new(pool.len(), size) {
                let mut candidate: FxHashSet<NodeId> = required.clone();
                candidate.extend(combo.iter().map(|&i| pool[i]));
                let r = test.check_independence(a, b, &candidate)?;
                if !r.independent {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((_, p)) => {
                        if keep_max {
                            r.p_value > *p
                        } else {
                            r.p_value < *p
                        }
                    }
                };
                if better {
                    best = Some((candidate, r.p_value));
                }
            }
        }
    }
    Ok(best.map(|(s, _)| s))
}

macro_rules! extreme_producer {
    ($name:ident, $keep_max:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name<T> {
            graph: MixedGraph,
            test: T,
            depth: Option<usize>,
        }

        impl<T: IndependenceTest> $name<T> {
            /// Searches over the given skeleton with subset sizes capped
            /// at `depth` (None = uncapped).
            pub fn new(graph: MixedGraph, test: T, depth: Option<usize>) -> Self {
                Self { graph, test, depth }
            }
        }

        impl<T: IndependenceTest> SepsetProducer for $name<T> {
            fn sepset(
                &mut self,
                a: NodeId,
                b: NodeId,
            ) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
                extreme_search(
                    &self.graph,
                    &self.test,
                    a,
                    b,
                    &FxHashSet::default(),
                    self.depth,
                    $keep_max,
                )
            }

            fn sepset_containing(
                &mut self,
                a: NodeId,
                b: NodeId,
                must_include: &FxHashSet<NodeId>,
            ) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
                extreme_search(
                    &self.graph,
                    &self.test,
                    a,
                    b,
                    must_include,
                    self.depth,
                    $keep_max,
                )
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

            fn p_value(
                &mut self,
                a: NodeId,
                b: NodeId,
                s: &FxHashSet<NodeId>,
            ) -> Result<f64, SearchError> {
                Ok(self.test.check_independence(a, b, s)?.p_value)
            }
        }
    };
}

extreme_producer!(
    SepsetsMinP,
    false,
    "Exhaustive search keeping the independent subset with the minimum \
     p-value (ties broken by first-found)."
);
extreme_producer!(
    SepsetsMaxP,
    true,
    "Exhaustive search keeping the independent subset with the maximum \
     p-value (ties broken by first-found)."
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::independence::MsepTest;
    use ancestra_graph::Endpoint;

    #[test]
    fn max_p_agrees_with_oracle_on_chain() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(b, c).unwrap();
        let mut skeleton = g.clone();
        skeleton.reorient_all_with(Endpoint::Circle);

        let mut min_p = SepsetsMinP::new(skeleton.clone(), MsepTest::new(g.clone()), None);
        let mut max_p = SepsetsMaxP::new(skeleton, MsepTest::new(g), None);

        // The oracle reports p = 1.0 for every independent subset, so both
        // variants find {B} and agree on the noncollider.
        assert_eq!(min_p.sepset(a, c).unwrap().unwrap().len(), 1);
        assert_eq!(max_p.sepset(a, c).unwrap().unwrap().len(), 1);
        assert!(!min_p.is_unshielded_collider(a, b, c).unwrap());
        assert!(!max_p.is_unshielded_collider(a, b, c).unwrap());
    }
}
