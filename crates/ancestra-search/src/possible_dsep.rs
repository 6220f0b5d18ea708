//! Edge removal by the possible-d-sep rule.
//!
//! The FCI adjacency phase between skeleton search and orientation: for
//! each remaining edge, subsets of the possible-d-sep set of either
//! endpoint are tested; when one renders the endpoints independent the
//! edge is removed and the sepset recorded.

use ancestra_graph::{MixedGraph, NodeId};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::errors::SearchError;
use crate::independence::IndependenceTest;
use crate::sepset_map::SepsetMap;
use crate::sepsets::Combinations;

/// Removes every edge whose endpoints are separable by a subset of
/// either endpoint's possible-d-sep set.
///
/// `depth` caps the subset size and `max_path_length` bounds the
/// possible-d-sep search; both are uncapped when None. Sepsets of removed
/// edges are recorded in `sepsets`.
pub fn remove_by_possible_dsep<T: IndependenceTest>(
    graph: &mut MixedGraph,
    test: &T,
    depth: Option<usize>,
    max_path_length: Option<usize>,
    sepsets: &mut SepsetMap,
) -> Result<(), SearchError> {
    let edges: Vec<(NodeId, NodeId)> = graph
        .edges()
        .iter()
        .map(|e| (e.node1, e.node2))
        .collect();

    'edges: for (a, b) in edges {
        for x in [a, b] {
            let pool: Vec<NodeId> = graph
                .possible_dsep(x, max_path_length)
                .into_iter()
                .filter(|&n| n != a && n != b)
                .collect();
            let max_size = depth.unwrap_or(pool.len()).min(pool.len());
            for size in 0..=max_size {
                for combo in Combinations::new(pool.len(), size) {
                    let candidate: FxHashSet<NodeId> =
                        combo.iter().map(|&i| pool[i]).collect();
                    if test.check_independence(a, b, &candidate)?.independent {
                        graph.remove_edge(a, b);
                        sepsets.set(a, b, candidate);
                        debug!(
                            a = graph.name_of(a),
                            b = graph.name_of(b),
                            "possible-d-sep removal"
                        );
                        continue 'edges;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::independence::MsepTest;
    use ancestra_graph::Endpoint;

    #[test]
    fn spurious_edge_is_removed_and_sepset_recorded() {
        // Truth: chain a -> b -> c -> d; working graph carries a spurious
        // a - d edge.
        let mut truth = MixedGraph::new();
        let a = truth.add_measured_node("A").unwrap();
        let b = truth.add_measured_node("B").unwrap();
        let c = truth.add_measured_node("C").unwrap();
        let d = truth.add_measured_node("D").unwrap();
        truth.add_directed_edge(a, b).unwrap();
        truth.add_directed_edge(b, c).unwrap();
        truth.add_directed_edge(c, d).unwrap();

        let mut working = truth.clone();
        working.add_nondirected_edge(a, d).unwrap();
        working.reorient_all_with(Endpoint::Circle);

        let test = MsepTest::new(truth);
        let mut sepsets = SepsetMap::new();
        remove_by_possible_dsep(&mut working, &test, None, None, &mut sepsets)
            .unwrap();

        assert!(!working.is_adjacent_to(a, d));
        let s = sepsets.get(a, d).expect("sepset recorded");
        assert!(s.contains(&b) || s.contains(&c));
        // True adjacencies stay.
        assert!(working.is_adjacent_to(a, b));
        assert!(working.is_adjacent_to(b, c));
        assert!(working.is_adjacent_to(c, d));
    }
}
