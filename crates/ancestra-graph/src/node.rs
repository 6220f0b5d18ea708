//! Node identifiers and node metadata.

use std::sync::Arc;

/// A unique identifier for a node in a [`crate::MixedGraph`].
///
/// NodeId implements Ord/PartialOrd for stable, deterministic iteration.
/// Uses u32 internally for efficient storage and indexing.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// The role of a node in a causal model.
///
/// Orientation algorithms operate over the measured nodes; latent and
/// selection nodes participate only in the ground-truth graphs consumed by
/// oracle strategies and the inducing-path tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    /// An observed variable.
    Measured,
    /// An unobserved confounder.
    Latent,
    /// A selection variable (conditioned on by sampling).
    Selection,
}

/// A node with its name and type.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeData {
    /// The unique node identifier.
    pub id: NodeId,
    /// The variable name. Using Arc<str> for cheap cloning.
    #[cfg_attr(feature = "serde", serde(with = "serde_arc_str"))]
    pub name: Arc<str>,
    /// Measured, latent, or selection.
    pub node_type: NodeType,
}

impl NodeData {
    /// True for measured nodes.
    pub fn is_measured(&self) -> bool {
        self.node_type == NodeType::Measured
    }
}

#[cfg(feature = "serde")]
mod serde_arc_str {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(arc: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        arc.as_ref().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Arc::from)
    }
}
