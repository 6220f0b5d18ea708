//! Error types for search and orientation.

use thiserror::Error;

use ancestra_graph::GraphError;

/// Errors raised during sepset search, strategy evaluation, and
/// orientation.
///
/// Absence (no sepset within depth, no discriminating path) is `Option`,
/// and illegality of a candidate graph is a structured result, so neither
/// appears here.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SearchError {
    /// Preconditions of a call were violated (non-distinct triple nodes,
    /// adjacent endpoints passed to discriminating-path resolution,
    /// invalid numeric parameters).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A low-level graph query failed; propagated uncaught.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
