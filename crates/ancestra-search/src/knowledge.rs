//! Background knowledge: required and forbidden edges, tier ordering.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

/// Background constraints consulted when deciding whether an orientation
/// is legal.
///
/// Constraints are keyed by node *name* so one Knowledge value can be
/// shared across graphs over the same variables. A directed pair
/// (from, to) may be explicitly forbidden or required; tiers impose a
/// temporal ordering under which edges from a later tier into an earlier
/// tier are forbidden.
#[derive(Debug, Clone, Default)]
pub struct Knowledge {
    forbidden: FxHashSet<(Arc<str>, Arc<str>)>,
    required: FxHashSet<(Arc<str>, Arc<str>)>,
    tier_of: FxHashMap<Arc<str>, usize>,
}

impl Knowledge {
    /// An empty knowledge object (no constraints).
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbids the directed edge from -> to.
    pub fn set_forbidden(&mut self, from: &str, to: &str) {
        self.forbidden.insert((Arc::from(from), Arc::from(to)));
    }

    /// Requires the directed edge from -> to.
    pub fn set_required(&mut self, from: &str, to: &str) {
        self.required.insert((Arc::from(from), Arc::from(to)));
    }

    /// Places a variable in a tier (0-based; lower tiers are earlier).
    pub fn add_to_tier(&mut self, tier: usize, name: &str) {
        self.tier_of.insert(Arc::from(name), tier);
    }

    /// The tier of a variable, if assigned.
    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tier_of.get(name).copied()
    }

    /// True if from -> to is forbidden, explicitly or by tier ordering.
    pub fn is_forbidden(&self, from: &str, to: &str) -> bool {
        if self
            .forbidden
            .contains(&(Arc::from(from), Arc::from(to)))
        {
            return true;
        }
        match (self.tier_of(from), self.tier_of(to)) {
            (Some(tf), Some(tt)) => tf > tt,
            _ => false,
        }
    }

    /// True if from -> to is required.
    pub fn is_required(&self, from: &str, to: &str) -> bool {
        self.required.contains(&(Arc::from(from), Arc::from(to)))
    }

    /// True when no constraint of any kind has been set.
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty() && self.required.is_empty() && self.tier_of.is_empty()
    }

    /// The explicitly forbidden pairs, in deterministic (sorted) order.
    pub fn forbidden_edges(&self) -> Vec<(Arc<str>, Arc<str>)> {
        let mut v: Vec<_> = self.forbidden.iter().cloned().collect();
        v.sort();
        v
    }

    /// The required pairs, in deterministic (sorted) order.
    pub fn required_edges(&self) -> Vec<(Arc<str>, Arc<str>)> {
        let mut v: Vec<_> = self.required.iter().cloned().collect();
        v.sort();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_forbids_backward_edges() {
        let mut k = Knowledge::new();
        k.add_to_tier(0, "A");
        k.add_to_tier(1, "B");
        assert!(k.is_forbidden("B", "A"));
        assert!(!k.is_forbidden("A", "B"));
        // Unassigned variables are unconstrained by tiers.
        assert!(!k.is_forbidden("C", "A"));
    }

    #[test]
    fn explicit_constraints() {
        let mut k = Knowledge::new();
        k.set_forbidden("X", "Y");
        k.set_required("Y", "Z");
        assert!(k.is_forbidden("X", "Y"));
        assert!(k.is_required("Y", "Z"));
        assert!(!k.is_empty());
    }
}
