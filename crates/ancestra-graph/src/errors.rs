//! Error types for graph construction and queries.

use thiserror::Error;

/// Errors raised by graph construction and low-level graph queries.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches. Absent values (no edge between a pair, no sepset
/// found) are represented as `Option`, not as errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node id or name was used that is not present in the graph.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A second node with an already-registered name was added.
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    /// A second edge between an already-adjacent pair was added.
    #[error("duplicate edge between {0} and {1}")]
    DuplicateEdge(String, String),

    /// A query or mutation was called with arguments that violate its
    /// preconditions (self-loops, non-distinct triple nodes, latent
    /// endpoints where measured ones are required).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
