//! Edge endpoint marks.

/// The mark at one end of an edge.
///
/// A DAG uses only tails and arrows; a MAG adds bidirected and undirected
/// edges; a PAG additionally carries circles for endpoints the equivalence
/// class leaves undetermined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    /// A tail mark ("-").
    Tail,
    /// An arrowhead (">").
    Arrow,
    /// An undetermined circle mark ("o").
    Circle,
}

impl Endpoint {
    /// Short symbol used in edge renderings ("-", ">", "o").
    pub fn symbol(self) -> &'static str {
        match self {
            Endpoint::Tail => "-",
            Endpoint::Arrow => ">",
            Endpoint::Circle => "o",
        }
    }
}
