//! Permutation scoring with bookmarked state.
//!
//! A [`PermutationScorer`] maintains a permutation of the variables and,
//! for each variable, the parent set recovered by grow-shrink against the
//! score over that variable's prefix. Reordering operations (`move_to`,
//! `tuck`) change which structures are recoverable; `bookmark` /
//! `go_to_bookmark` snapshot and restore the permutation so independent
//! probe sequences cannot leak state into each other.
//!
//! Score-based strategies must run every probe inside
//! [`PermutationScorer::with_bookmark`], which restores the bookmarked
//! permutation before and after the probe.

use ancestra_graph::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::SearchError;
use crate::score::Score;

/// A Teyssier-style permutation scorer over a [`Score`] oracle.
#[derive(Debug, Clone)]
pub struct PermutationScorer<S> {
    score: S,
    order: Vec<NodeId>,
    position: FxHashMap<NodeId, usize>,
    parents: FxHashMap<NodeId, FxHashSet<NodeId>>,
    bookmark: Option<Vec<NodeId>>,
}

impl<S: Score> PermutationScorer<S> {
    /// Creates a scorer with no permutation set; call
    /// [`PermutationScorer::score_order`] before anything else.
    pub fn new(score: S) -> Self {
        Self {
            score,
            order: Vec::new(),
            position: FxHashMap::default(),
            parents: FxHashMap::default(),
            bookmark: None,
        }
    }

    /// Sets the permutation and recomputes every prefix parent set.
    /// Returns the total score.
    pub fn score_order(&mut self, order: &[NodeId]) -> f64 {
        self.order = order.to_vec();
        self.reindex();
        self.recompute_all();
        self.total_score()
    }

    /// The total score of the current permutation.
    pub fn total_score(&self) -> f64 {
        self.order
            .iter()
            .map(|&n| {
                let ps = self.sorted_parents(n);
                self.score.local_score(n, &ps)
            })
            .sum()
    }

    /// The current permutation.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// The position of a node in the permutation.
    pub fn index(&self, node: NodeId) -> Option<usize> {
        self.position.get(&node).copied()
    }

    /// True if either node is a recovered parent of the other.
    pub fn adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.parent_of(a, b) || self.parent_of(b, a)
    }

    /// True if `a` is a recovered parent of `b`.
    pub fn parent_of(&self, a: NodeId, b: NodeId) -> bool {
        self.parents.get(&b).map(|p| p.contains(&a)).unwrap_or(false)
    }

    /// Snapshots the current permutation.
    pub fn bookmark(&mut self) {
        self.bookmark = Some(self.order.clone());
    }

    /// Restores the bookmarked permutation. No-op when no bookmark is set.
    pub fn go_to_bookmark(&mut self) {
        if let Some(order) = self.bookmark.clone() {
            self.order = order;
            self.reindex();
            self.recompute_all();
        }
    }

    /// Runs a probe with the bookmarked permutation restored before and
    /// after, so tuck sequences cannot leak across probes.
    pub fn with_bookmark<T>(
        &mut self,
        probe: impl FnOnce(&mut Self) -> Result<T, SearchError>,
    ) -> Result<T, SearchError> {
        self.go_to_bookmark();
        let out = probe(self);
        self.go_to_bookmark();
        out
    }

    /// Moves `v` to `to_index` and rescores.
    pub fn move_to(&mut self, v: NodeId, to_index: usize) {
        let Some(from) = self.index(v) else {
            return;
        };
        if from == to_index {
            return;
        }
        self.order.remove(from);
        let to = to_index.min(self.order.len());
        self.order.insert(to, v);
        self.reindex();
        self.recompute_all();
    }

    /// Moves j, and every ancestor of j sitting between k and j, to before
    /// k. Returns true if the permutation changed.
    pub fn tuck(&mut self, k: NodeId, j: NodeId) -> bool {
        let (Some(j_index), Some(k_index)) = (self.index(j), self.index(k)) else {
            return false;
        };
        if j_index < k_index {
            return false;
        }
        let ancestors = self.recovered_ancestors(j);
        let mut insert_at = k_index;
        let mut changed = false;
        let mut i = j_index;
        while i > k_index {
            let node = self.order[i];
            if node == j || ancestors.contains(&node) {
                self.move_to(node, insert_at);
                insert_at += 1;
                changed = true;
            }
            i -= 1;
        }
        changed
    }

    /// The ancestors of `j` in the currently recovered structure
    /// (including j).
    fn recovered_ancestors(&self, j: NodeId) -> FxHashSet<NodeId> {
        let mut out: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack = vec![j];
        while let Some(n) = stack.pop() {
            if !out.insert(n) {
                continue;
            }
            if let Some(ps) = self.parents.get(&n) {
                stack.extend(ps.iter().copied());
            }
        }
        out
    }

    fn reindex(&mut self) {
        self.position.clear();
        for (i, &n) in self.order.iter().enumerate() {
            self.position.insert(n, i);
        }
    }

    fn recompute_all(&mut self) {
        self.parents.clear();
        for i in 0..self.order.len() {
            let node = self.order[i];
            let prefix: Vec<NodeId> = self.order[..i].to_vec();
            let ps = self.grow_shrink(node, &prefix);
            self.parents.insert(node, ps);
        }
    }

    /// Grow-shrink parent recovery for `node` over `prefix`.
    fn grow_shrink(&self, node: NodeId, prefix: &[NodeId]) -> FxHashSet<NodeId> {
        let mut parents: FxHashSet<NodeId> = FxHashSet::default();
        let mut best = self.score.local_score(node, &[]);

        // Grow: add the prefix variable with the largest strict gain.
        loop {
            let mut best_gain = 0.0;
            let mut best_candidate = None;
            for &c in prefix {
                if parents.contains(&c) {
                    continue;
                }
                let mut trial: Vec<NodeId> = parents.iter().copied().collect();
                trial.push(c);
                trial.sort_unstable();
                let s = self.score.local_score(node, &trial);
                if s - best > best_gain {
                    best_gain = s - best;
                    best_candidate = Some(c);
                }
            }
            match best_candidate {
                Some(c) => {
                    parents.insert(c);
                    best += best_gain;
                }
                None => break,
            }
        }

        // Shrink: drop members whose removal does not lose score.
        loop {
            let mut to_remove = None;
            let members: Vec<NodeId> = {
                let mut v: Vec<NodeId> = parents.iter().copied().collect();
                v.sort_unstable();
                v
            };
            for &p in &members {
                let trial: Vec<NodeId> =
                    members.iter().copied().filter(|&q| q != p).collect();
                let s = self.score.local_score(node, &trial);
                if s >= best {
                    best = s;
                    to_remove = Some(p);
                    break;
                }
            }
            match to_remove {
                Some(p) => {
                    parents.remove(&p);
                }
                None => break,
            }
        }

        parents
    }

    fn sorted_parents(&self, node: NodeId) -> Vec<NodeId> {
        let mut v: Vec<NodeId> = self
            .parents
            .get(&node)
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default();
        v.sort_unstable();
        v
    }
}
