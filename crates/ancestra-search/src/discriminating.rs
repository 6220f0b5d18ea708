//! Discriminating paths and their enumeration.
//!
//! A discriminating path for the circle at v on the edge v o-* y is a
//! path x, ..., w, v, y in which every node strictly between x and v is a
//! collider on the path and a parent of y, and x is not adjacent to y.
//! Zhang's R4 resolves the circle by asking the strategy whether v is a
//! collider (arrowheads at both w-v and y-v) or a noncollider (tail at v
//! toward y).
//!
//! Paths are recomputed each round and re-verified with
//! [`DiscriminatingPath::exists_in`] before any orientation, because rule
//! applications earlier in the same epoch may have invalidated them.

use std::collections::VecDeque;

use ancestra_graph::{Endpoint, MixedGraph, NodeId};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;

/// A discriminating-path construct x, ..., w, v, y.
///
/// `collider_path` holds the interior nodes strictly between x and v,
/// ordered from the v side outward, so its first element is w and its
/// last element is adjacent to x.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscriminatingPath {
    x: NodeId,
    w: NodeId,
    v: NodeId,
    y: NodeId,
    collider_path: Vec<NodeId>,
}

impl DiscriminatingPath {
    /// Creates a construct, failing fast when x, w, v, y are not pairwise
    /// distinct or the collider path does not start at w.
    pub fn new(
        x: NodeId,
        w: NodeId,
        v: NodeId,
        y: NodeId,
        collider_path: Vec<NodeId>,
    ) -> Result<Self, SearchError> {
        let four = [x, w, v, y];
        for i in 0..four.len() {
            for j in i + 1..four.len() {
                if four[i] == four[j] {
                    return Err(SearchError::InvalidArgument(format!(
                        "discriminating path nodes must be distinct: {:?}",
                        four
                    )));
                }
            }
        }
        if collider_path.first() != Some(&w) {
            return Err(SearchError::InvalidArgument(
                "collider path must start at the node adjacent to v".into(),
            ));
        }
        if collider_path.contains(&x) || collider_path.contains(&v) || collider_path.contains(&y)
        {
            return Err(SearchError::InvalidArgument(
                "collider path may not revisit the path endpoints".into(),
            ));
        }
        Ok(Self {
            x,
            w,
            v,
            y,
            collider_path,
        })
    }

    /// The far endpoint (nonadjacent to y).
    pub fn x(&self) -> NodeId {
        self.x
    }

    /// The collider-path node adjacent to v.
    pub fn w(&self) -> NodeId {
        self.w
    }

    /// The node carrying the circle being discriminated.
    pub fn v(&self) -> NodeId {
        self.v
    }

    /// The near endpoint.
    pub fn y(&self) -> NodeId {
        self.y
    }

    /// Interior nodes between x and v, from the v side outward.
    pub fn collider_path(&self) -> &[NodeId] {
        &self.collider_path
    }

    /// The full node sequence x, ..., w, v, y.
    pub fn full_path(&self) -> Vec<NodeId> {
        let mut path = vec![self.x];
        path.extend(self.collider_path.iter().rev());
        path.push(self.v);
        path.push(self.y);
        path
    }

    /// Re-verifies that this construct still holds in `graph`.
    ///
    /// Checked: x and y nonadjacent; v o-* y with the arrowhead at y;
    /// consecutive path nodes adjacent; every interior node a collider on
    /// the path and a parent of y.
    pub fn exists_in(&self, graph: &MixedGraph) -> bool {
        if graph.is_adjacent_to(self.x, self.y) {
            return false;
        }
        // v o-* y: circle at v, arrowhead at y.
        if graph.endpoint(self.y, self.v) != Some(Endpoint::Circle) {
            return false;
        }
        if graph.endpoint(self.v, self.y) != Some(Endpoint::Arrow) {
            return false;
        }
        let full = self.full_path();
        for pair in full.windows(2) {
            if !graph.is_adjacent_to(pair[0], pair[1]) {
                return false;
            }
        }
        // Interior nodes: colliders on the path, parents of y.
        for i in 1..full.len() - 2 {
            let t = full[i];
            if !graph.is_def_collider(full[i - 1], t, full[i + 1]) {
                return false;
            }
            if !graph.is_parent_of(t, self.y) {
                return false;
            }
        }
        true
    }
}

/// Enumerates every discriminating path in `graph`, bounded by
/// `max_length` (the number of nodes on the path; None = unbounded).
///
/// Results are deduplicated and sorted for deterministic application
/// order.
pub fn list_discriminating_paths(
    graph: &MixedGraph,
    max_length: Option<usize>,
) -> Vec<DiscriminatingPath> {
    let mut out: FxHashSet<DiscriminatingPath> = FxHashSet::default();
    for w in graph.node_ids() {
        for &y in graph.adjacent_nodes(w) {
            list_for_pair(graph, w, y, max_length, &mut out);
        }
    }
    let mut paths: Vec<DiscriminatingPath> = out.into_iter().collect();
    paths.sort_by(|p, q| {
        (p.x, p.y, p.v, p.w, &p.collider_path).cmp(&(q.x, q.y, q.v, q.w, &q.collider_path))
    });
    paths
}

fn list_for_pair(
    graph: &MixedGraph,
    w: NodeId,
    y: NodeId,
    max_length: Option<usize>,
    out: &mut FxHashSet<DiscriminatingPath>,
) {
    // w must already be a parent of y for the construct to close.
    if !graph.is_parent_of(w, y) {
        return;
    }

    // v adjacent to both w and y, with v o-> y.
    let adj_y: FxHashSet<NodeId> = graph.adjacent_nodes(y).iter().copied().collect();
    for &v in graph.adjacent_nodes(w) {
        if v == w || v == y || !adj_y.contains(&v) {
            continue;
        }
        if graph.endpoint(y, v) != Some(Endpoint::Circle) {
            continue;
        }
        if graph.endpoint(v, y) != Some(Endpoint::Arrow) {
            continue;
        }
        discriminating_path_bfs(graph, w, v, y, max_length, out);
    }
}

/// Searches back from w for discriminating paths, breadth-first over
/// (current, previous, collider-path) states. Interior nodes must be
/// colliders on the path and parents of y.
fn discriminating_path_bfs(
    graph: &MixedGraph,
    w: NodeId,
    v: NodeId,
    y: NodeId,
    max_length: Option<usize>,
    out: &mut FxHashSet<DiscriminatingPath>,
) {
    let mut queue: VecDeque<(NodeId, Option<NodeId>, Vec<NodeId>)> = VecDeque::new();
    queue.push_back((w, None, Vec::new()));

    while let Some((t, p, path_to_t)) = queue.pop_front() {
        if let Some(p) = p {
            // Interior along the branch: collider at t, parent of y.
            if graph.endpoint(p, t) != Some(Endpoint::Arrow) {
                continue;
            }
            if !graph.is_parent_of(t, y) {
                continue;
            }
        }

        // Candidate upstream endpoints arrive at t with an arrowhead.
        for x in graph.nodes_into(t, Endpoint::Arrow) {
            if Some(x) == p || path_to_t.contains(&x) {
                continue;
            }
            let mut collider_path = path_to_t.clone();
            collider_path.push(t);

            if let Some(max) = max_length {
                // Path nodes: x + collider path + v + y.
                if collider_path.len() + 3 > max {
                    continue;
                }
            }

            if x == v || x == y {
                continue;
            }
            if let Ok(dp) = DiscriminatingPath::new(x, w, v, y, collider_path.clone()) {
                if dp.exists_in(graph) {
                    out.insert(dp);
                }
            }

            // Only chains of parents of y stay promising upstream.
            if !graph.is_parent_of(x, y) {
                continue;
            }
            queue.push_back((x, Some(t), collider_path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The canonical 4-node construct: x *-> w -> y, w <-> ... with
    /// v o-> y, v adjacent w.
    fn four_node() -> (MixedGraph, [NodeId; 4]) {
        let mut g = MixedGraph::new();
        let x = g.add_measured_node("X").unwrap();
        let w = g.add_measured_node("W").unwrap();
        let v = g.add_measured_node("V").unwrap();
        let y = g.add_measured_node("Y").unwrap();
        // x *-> w, collider at w on <x, w, v>, w -> y.
        g.add_edge(ancestra_graph::Edge::new(x, w, Endpoint::Circle, Endpoint::Arrow))
            .unwrap();
        g.add_directed_edge(w, y).unwrap();
        // v *-> w so that w is a collider on the path.
        g.add_edge(ancestra_graph::Edge::new(v, w, Endpoint::Circle, Endpoint::Arrow))
            .unwrap();
        // v o-> y, the edge being discriminated.
        g.add_edge(ancestra_graph::Edge::new(v, y, Endpoint::Circle, Endpoint::Arrow))
            .unwrap();
        (g, [x, w, v, y])
    }

    #[test]
    fn finds_four_node_construct() {
        let (g, [x, w, v, y]) = four_node();
        let paths = list_discriminating_paths(&g, None);
        assert!(paths
            .iter()
            .any(|p| p.x() == x && p.w() == w && p.v() == v && p.y() == y));
    }

    #[test]
    fn exists_in_fails_after_circle_resolved() {
        let (mut g, [x, w, v, y]) = four_node();
        let paths = list_discriminating_paths(&g, None);
        let dp = paths
            .iter()
            .find(|p| p.x() == x && p.w() == w && p.v() == v && p.y() == y)
            .unwrap()
            .clone();
        assert!(dp.exists_in(&g));
        // Resolving the circle at v invalidates the construct.
        g.set_endpoint(y, v, Endpoint::Tail).unwrap();
        assert!(!dp.exists_in(&g));
    }

    #[test]
    fn adjacent_endpoints_do_not_form_a_path() {
        let (mut g, _) = four_node();
        let x = g.node_by_name("X").unwrap();
        let y = g.node_by_name("Y").unwrap();
        g.add_nondirected_edge(x, y).unwrap();
        assert!(list_discriminating_paths(&g, None).is_empty());
    }

    #[test]
    fn constructor_rejects_duplicates() {
        let a = NodeId(0);
        let b = NodeId(1);
        let c = NodeId(2);
        assert!(DiscriminatingPath::new(a, b, c, a, vec![b]).is_err());
    }
}
