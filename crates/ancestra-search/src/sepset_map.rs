//! Recorded separating sets for node pairs.

use ancestra_graph::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

/// A map from unordered node pairs to the conditioning set that separated
/// them.
///
/// Key absence means "not yet determined"; a present-but-empty set means
/// "independent given nothing". The map is filled incrementally during
/// adjacency search and read back by collider orientation.
#[derive(Debug, Clone, Default)]
pub struct SepsetMap {
    map: FxHashMap<(NodeId, NodeId), FxHashSet<NodeId>>,
}

fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SepsetMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the sepset for {a, b}, replacing any earlier entry.
    pub fn set(&mut self, a: NodeId, b: NodeId, sepset: FxHashSet<NodeId>) {
        self.map.insert(key(a, b), sepset);
    }

    /// The recorded sepset for {a, b}, or None if not yet determined.
    pub fn get(&self, a: NodeId, b: NodeId) -> Option<&FxHashSet<NodeId>> {
        self.map.get(&key(a, b))
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_distinct_from_empty() {
        let mut m = SepsetMap::new();
        let (a, b) = (NodeId(0), NodeId(1));
        assert!(m.get(a, b).is_none());
        m.set(a, b, FxHashSet::default());
        let s = m.get(b, a).expect("unordered lookup");
        assert!(s.is_empty());
    }
}
