//! Path queries over mixed graphs.
//!
//! Everything the orientation and conversion algorithms need to ask about
//! connectivity lives here: directed and semidirected reachability,
//! m-separation, inducing paths, possible-d-sep sets, and anteriority.
//!
//! The inducing-path and possible-d-sep searches are breadth-first over
//! (previous, current) states, using the reachability formulation of
//! Geiger, Verma, and Pearl; interior nodes of an inducing path must be
//! colliders (when measured) and ancestors of an endpoint or of a
//! selection variable.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::endpoint::Endpoint;
use crate::errors::GraphError;
use crate::graph::MixedGraph;
use crate::node::{NodeId, NodeType};

/// Cap on search depth when no explicit possible-d-sep path bound is given.
const DEFAULT_MAX_PDSEP_PATH_LENGTH: usize = 1000;

impl MixedGraph {
    /// True if there is a directed path x -> ... -> y of length >= 1.
    ///
    /// With x == y this asks whether x lies on a directed cycle.
    pub fn exists_directed_path(&self, x: NodeId, y: NodeId) -> bool {
        let mut queue: VecDeque<NodeId> = self.children(x).into();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        while let Some(n) = queue.pop_front() {
            if n == y {
                return true;
            }
            if !visited.insert(n) {
                continue;
            }
            for c in self.children(n) {
                queue.push_back(c);
            }
        }
        false
    }

    /// One directed path from x to y, if any (for diagnostics).
    pub fn directed_path(&self, x: NodeId, y: NodeId) -> Option<Vec<NodeId>> {
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut pred: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        for c in self.children(x) {
            if !pred.contains_key(&c) {
                pred.insert(c, x);
                queue.push_back(c);
            }
        }
        while let Some(n) = queue.pop_front() {
            if n == y {
                let mut path = vec![n];
                let mut cur = n;
                while cur != x {
                    cur = pred[&cur];
                    path.push(cur);
                }
                path.reverse();
                return Some(path);
            }
            for c in self.children(n) {
                if !pred.contains_key(&c) && c != x {
                    pred.insert(c, n);
                    queue.push_back(c);
                }
            }
        }
        None
    }

    /// True if x is an ancestor of y (every node is its own ancestor).
    pub fn is_ancestor_of(&self, x: NodeId, y: NodeId) -> bool {
        x == y || self.exists_directed_path(x, y)
    }

    /// The ancestors of every node in `z`, including `z` itself.
    pub fn ancestors_of_set(&self, z: &FxHashSet<NodeId>) -> FxHashSet<NodeId> {
        let mut out: FxHashSet<NodeId> = z.clone();
        let mut queue: VecDeque<NodeId> = z.iter().copied().collect();
        while let Some(n) = queue.pop_front() {
            for p in self.parents(n) {
                if out.insert(p) {
                    queue.push_back(p);
                }
            }
        }
        out
    }

    /// True if there is a semidirected path from x to y: a path that at no
    /// step carries an arrowhead pointing back toward x.
    pub fn exists_semidirected_path(&self, x: NodeId, y: NodeId) -> bool {
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        visited.insert(x);
        for &n in self.adjacent_nodes(x) {
            // A step a ~ b is semidirected when the mark at a is not an
            // arrowhead.
            if self.endpoint(n, x) != Some(Endpoint::Arrow) {
                queue.push_back(n);
            }
        }
        while let Some(n) = queue.pop_front() {
            if n == y {
                return true;
            }
            if !visited.insert(n) {
                continue;
            }
            for &c in self.adjacent_nodes(n) {
                if self.endpoint(c, n) != Some(Endpoint::Arrow) && !visited.contains(&c) {
                    queue.push_back(c);
                }
            }
        }
        false
    }

    /// True if x and y are m-connected given z.
    ///
    /// Reachability over ordered adjacent pairs: a collider on the walk may
    /// be crossed only if it is in z or an ancestor of z; a non-collider
    /// only if it is outside z. An edge between x and y m-connects them
    /// under any conditioning set.
    pub fn is_m_connected_to(&self, x: NodeId, y: NodeId, z: &FxHashSet<NodeId>) -> bool {
        if x == y {
            return true;
        }
        if self.is_adjacent_to(x, y) {
            return true;
        }
        let an_z = self.ancestors_of_set(z);

        let mut queue: VecDeque<(NodeId, NodeId)> = VecDeque::new();
        let mut visited: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
        for &b in self.adjacent_nodes(x) {
            queue.push_back((x, b));
            visited.insert((x, b));
        }
        while let Some((a, b)) = queue.pop_front() {
            for &c in self.adjacent_nodes(b) {
                if c == a {
                    continue;
                }
                let collider = self.is_def_collider(a, b, c);
                let passable = if collider {
                    an_z.contains(&b)
                } else {
                    !z.contains(&b)
                };
                if !passable {
                    continue;
                }
                if c == y {
                    return true;
                }
                if visited.insert((b, c)) {
                    queue.push_back((b, c));
                }
            }
        }
        false
    }

    /// True if x and y are m-separated given z.
    pub fn is_msep_from(&self, x: NodeId, y: NodeId, z: &FxHashSet<NodeId>) -> bool {
        !self.is_m_connected_to(x, y, z)
    }

    /// True if an inducing path exists between the measured nodes x and y.
    ///
    /// An inducing path is a path on which every interior measured node is
    /// a collider, and every collider is an ancestor of x, of y, or of a
    /// selection variable. Existence implies the pair cannot be made
    /// non-adjacent in any MAG over the measured nodes.
    pub fn exists_inducing_path(
        &self,
        x: NodeId,
        y: NodeId,
        selection: &FxHashSet<NodeId>,
    ) -> Result<bool, GraphError> {
        self.inducing_path_search(x, y, selection, false)
    }

    /// Like [`MixedGraph::exists_inducing_path`], but the path must arrive
    /// at y with an arrowhead (an inducing path *into* y). Used by DAG->PAG
    /// collider orientation.
    pub fn exists_inducing_path_into(
        &self,
        x: NodeId,
        y: NodeId,
        selection: &FxHashSet<NodeId>,
    ) -> Result<bool, GraphError> {
        self.inducing_path_search(x, y, selection, true)
    }

    fn inducing_path_search(
        &self,
        x: NodeId,
        y: NodeId,
        selection: &FxHashSet<NodeId>,
        into_y: bool,
    ) -> Result<bool, GraphError> {
        for n in [x, y] {
            let node = self
                .node(n)
                .ok_or_else(|| GraphError::UnknownNode(format!("{:?}", n)))?;
            if node.node_type != NodeType::Measured {
                return Err(GraphError::InvalidArgument(format!(
                    "inducing-path endpoints must be measured: {}",
                    node.name
                )));
            }
        }
        if x == y {
            return Err(GraphError::InvalidArgument(
                "inducing-path endpoints must be distinct".into(),
            ));
        }

        let collider_ok = |b: NodeId| -> bool {
            self.is_ancestor_of(b, x)
                || self.is_ancestor_of(b, y)
                || selection.iter().any(|&s| self.is_ancestor_of(b, s))
        };
        let arrives = |b: NodeId| -> bool { !into_y || self.endpoint(b, y) == Some(Endpoint::Arrow) };

        // State = (prev, curr, path so far).
        let mut queue: VecDeque<(NodeId, NodeId, Vec<NodeId>)> = VecDeque::new();
        for &b in self.adjacent_nodes(x) {
            if b == y && arrives(x) {
                return Ok(true);
            }
            queue.push_back((x, b, vec![x, b]));
        }

        while let Some((a, b, path)) = queue.pop_front() {
            for &c in self.adjacent_nodes(b) {
                if c == a || path.contains(&c) {
                    continue;
                }
                let b_measured = self
                    .node(b)
                    .map(|n| n.node_type == NodeType::Measured)
                    .unwrap_or(false);
                let collider = self.is_def_collider(a, b, c);
                if b_measured && !collider {
                    continue;
                }
                if collider && !collider_ok(b) {
                    continue;
                }
                if c == y {
                    if arrives(b) {
                        return Ok(true);
                    }
                    continue;
                }
                let mut new_path = path.clone();
                new_path.push(c);
                queue.push_back((b, c, new_path));
            }
        }
        Ok(false)
    }

    /// The possible-d-sep set of x, bounded by `max_path_length` (None =
    /// unbounded, capped internally).
    ///
    /// A node b enters the set when there is a path from x to b on which
    /// every consecutive triple is either a collider or a triangle, and b
    /// or one of its path predecessors could be an ancestor of x or b.
    /// Returned in descending node order, matching the original's
    /// sort-then-reverse.
    pub fn possible_dsep(&self, x: NodeId, max_path_length: Option<usize>) -> Vec<NodeId> {
        let cap = max_path_length.unwrap_or(DEFAULT_MAX_PDSEP_PATH_LENGTH);

        let mut pdsep: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue: VecDeque<(NodeId, NodeId)> = VecDeque::new();
        let mut visited: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
        let mut previous: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();
        previous.insert(x, FxHashSet::default());

        // Level marker for distance accounting.
        let mut marker: Option<(NodeId, NodeId)> = None;
        let mut distance = 0usize;

        for &b in self.adjacent_nodes(x) {
            let e = (x, b);
            if marker.is_none() {
                marker = Some(e);
            }
            queue.push_back(e);
            visited.insert(e);
            previous.entry(x).or_default().insert(b);
            pdsep.insert(b);
        }

        while let Some(t) = queue.pop_front() {
            if marker == Some(t) {
                marker = None;
                distance += 1;
                if distance > cap {
                    break;
                }
            }
            let (a, b) = t;

            if self.exists_one_path_with_possible_parents(&previous, b, x, b) {
                pdsep.insert(b);
            }

            for &c in self.adjacent_nodes(b) {
                if c == a || c == x {
                    continue;
                }
                previous.entry(c).or_default().insert(b);

                if self.is_def_collider(a, b, c) || self.is_adjacent_to(a, c) {
                    let u = (b, c);
                    if !visited.insert(u) {
                        continue;
                    }
                    queue.push_back(u);
                    if marker.is_none() {
                        marker = Some(u);
                    }
                }
            }
        }

        pdsep.remove(&x);
        let mut out: Vec<NodeId> = pdsep.into_iter().collect();
        out.sort_unstable();
        out.reverse();
        out
    }

    fn exists_one_path_with_possible_parents(
        &self,
        previous: &FxHashMap<NodeId, FxHashSet<NodeId>>,
        w: NodeId,
        x: NodeId,
        b: NodeId,
    ) -> bool {
        if w == x {
            return true;
        }
        let Some(p) = previous.get(&w) else {
            return false;
        };
        for &r in p {
            if r == b || r == x {
                continue;
            }
            if self.exists_semidirected_path(r, x) || self.exists_semidirected_path(r, b) {
                return true;
            }
        }
        false
    }

    /// The anteriority of `targets`: nodes from which some target can be
    /// reached along edges that are each undirected or directed toward the
    /// target. The targets themselves are excluded.
    pub fn anteriority(&self, targets: &[NodeId]) -> FxHashSet<NodeId> {
        let mut out: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue: VecDeque<NodeId> = targets.iter().copied().collect();
        let mut seen: FxHashSet<NodeId> = targets.iter().copied().collect();
        while let Some(cur) = queue.pop_front() {
            for &w in self.adjacent_nodes(cur) {
                let Some(edge) = self.edge(w, cur) else {
                    continue;
                };
                let anterior_step = edge.is_undirected()
                    || (edge.is_directed() && edge.points_towards(cur));
                if anterior_step && seen.insert(w) {
                    out.insert(w);
                    queue.push_back(w);
                }
            }
        }
        for t in targets {
            out.remove(t);
        }
        out
    }
}
