//! Ordered node triples.

use ancestra_graph::NodeId;

use crate::errors::SearchError;

/// An ordered triple (x, y, z) of pairwise-distinct nodes — the unit of
/// collider and noncollider orientation decisions.
///
/// Equality treats (x, y, z) and (z, y, x) as the same triple, matching
/// the symmetry of collider judgments.
#[derive(Debug, Clone, Copy)]
pub struct Triple {
    /// First outer node.
    pub x: NodeId,
    /// The middle node.
    pub y: NodeId,
    /// Second outer node.
    pub z: NodeId,
}

impl Triple {
    /// Creates a triple, failing fast if the nodes are not pairwise
    /// distinct.
    pub fn new(x: NodeId, y: NodeId, z: NodeId) -> Result<Self, SearchError> {
        if x == y || y == z || x == z {
            return Err(SearchError::InvalidArgument(format!(
                "triple nodes must be distinct: ({:?}, {:?}, {:?})",
                x, y, z
            )));
        }
        Ok(Self { x, y, z })
    }

    fn key(&self) -> (NodeId, NodeId, NodeId) {
        if self.x <= self.z {
            (self.x, self.y, self.z)
        } else {
            (self.z, self.y, self.x)
        }
    }
}

impl PartialEq for Triple {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Triple {}

impl std::hash::Hash for Triple {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicates() {
        let a = NodeId(0);
        let b = NodeId(1);
        assert!(Triple::new(a, b, a).is_err());
        assert!(Triple::new(a, a, b).is_err());
    }

    #[test]
    fn symmetric_equality() {
        let (a, b, c) = (NodeId(0), NodeId(1), NodeId(2));
        assert_eq!(Triple::new(a, b, c).unwrap(), Triple::new(c, b, a).unwrap());
        assert_ne!(Triple::new(a, b, c).unwrap(), Triple::new(a, c, b).unwrap());
    }
}
