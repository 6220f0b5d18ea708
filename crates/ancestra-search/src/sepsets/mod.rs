//! Sepset producers: how a separating set or collider judgment is found.
//!
//! A [`SepsetProducer`] answers "what conditioning set separates a and b,
//! and is the triple (i, j, k) an unshielded collider?" against a fixed
//! skeleton. Five search policies are provided:
//!
//! - [`SepsetsGreedy`] — first independent subset by increasing size;
//! - [`SepsetsMinP`] / [`SepsetsMaxP`] — exhaustive up to depth, keeping
//!   the subset with the extreme p-value among independent ones;
//! - [`SepsetsConservative`] — collects *every* independent subset and
//!   judges a collider only when no sepset contains the middle node;
//! - [`SepsetsPossibleMsep`] — conditions on possible-d-sep sets instead
//!   of plain adjacency, for settings where adjacency under-covers the
//!   valid conditioning sets.
//!
//! All producers cap the subset size at the available pool size and
//! report "no sepset found within depth" as `Ok(None)` — callers must not
//! read that as "dependent".

mod combos;
mod conservative;
mod greedy;
mod min_p;
mod possible_msep;

pub use combos::Combinations;
pub use conservative::SepsetsConservative;
pub use greedy::SepsetsGreedy;
pub use min_p::{SepsetsMaxP, SepsetsMinP};
pub use possible_msep::SepsetsPossibleMsep;

use ancestra_graph::{MixedGraph, NodeId};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;
use crate::independence::IndependenceTest;

/// The common contract of all sepset search policies.
pub trait SepsetProducer {
    /// A separating set for {a, b}, or None if none was found within
    /// depth.
    fn sepset(&mut self, a: NodeId, b: NodeId)
        -> Result<Option<FxHashSet<NodeId>>, SearchError>;

    /// A separating set for {a, b} that contains every node of
    /// `must_include`, or None. Candidates are supersets of
    /// `must_include` by construction.
    fn sepset_containing(
        &mut self,
        a: NodeId,
        b: NodeId,
        must_include: &FxHashSet<NodeId>,
    ) -> Result<Option<FxHashSet<NodeId>>, SearchError>;

    /// Whether the unshielded triple (i, j, k) should be oriented as a
    /// collider at j.
    fn is_unshielded_collider(
        &mut self,
        i: NodeId,
        j: NodeId,
        k: NodeId,
    ) -> Result<bool, SearchError>;

    /// Whether a and b test independent given s.
    fn is_independent(
        &mut self,
        a: NodeId,
        b: NodeId,
        s: &FxHashSet<NodeId>,
    ) -> Result<bool, SearchError>;

    /// The p-value of the test of a and b given s.
    fn p_value(&mut self, a: NodeId, b: NodeId, s: &FxHashSet<NodeId>)
        -> Result<f64, SearchError>;
}

/// The conditioning pool drawn from one endpoint's adjacency: adj(a) with
/// a, b, and any already-required nodes removed. Insertion order is
/// preserved for determinism.
pub(crate) fn adjacency_pool(
    graph: &MixedGraph,
    a: NodeId,
    b: NodeId,
    exclude: &FxHashSet<NodeId>,
) -> Vec<NodeId> {
    graph
        .adjacent_nodes(a)
        .iter()
        .copied()
        .filter(|&n| n != a && n != b && !exclude.contains(&n))
        .collect()
}

/// Enumerates candidate conditioning sets from `pool` (unioned with
/// `required`), by increasing size up to `depth`, returning the first for
/// which the test reports independence.
pub(crate) fn first_independent_subset<T: IndependenceTest>(
    test: &T,
    a: NodeId,
    b: NodeId,
    pool: &[NodeId],
    required: &FxHashSet<NodeId>,
    depth: Option<usize>,
) -> Result<Option<FxHashSet<NodeId>>, SearchError> {
    let max = depth.unwrap_or(pool.len()).min(pool.len());
    for size in 0..=max {
        for combo in Combinations::new(pool.len(), size) {
            let mut candidate: FxHashSet<NodeId> = required.clone();
            candidate.extend(combo.iter().map(|&i| pool[i]));
            if test.check_independence(a, b, &candidate)?.independent {
                return Ok(Some(candidate));
            }
        }
    }
    Ok(None)
}

/// Collects every independence-yielding candidate from `pool` up to
/// `depth`.
pub(crate) fn all_independent_subsets<T: IndependenceTest>(
    test: &T,
    a: NodeId,
    b: NodeId,
    pool: &[NodeId],
    depth: Option<usize>,
) -> Result<Vec<FxHashSet<NodeId>>, SearchError> {
    let mut out = Vec::new();
    let max = depth.unwrap_or(pool.len()).min(pool.len());
    for size in 0..=max {
        for combo in Combinations::new(pool.len(), size) {
            let candidate: FxHashSet<NodeId> = combo.iter().map(|&i| pool[i]).collect();
            if test.check_independence(a, b, &candidate)?.independent {
                out.push(candidate);
            }
        }
    }
    Ok(out)
}
