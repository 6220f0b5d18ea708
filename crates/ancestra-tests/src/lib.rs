//! Test-only crate: integration and property tests for the ancestra
//! workspace live in `tests/`. Shared graph builders are exported here
//! for use across test files.

use ancestra_graph::{MixedGraph, NodeId, NodeType};

/// The 4-node chain A -> B -> C -> D.
pub fn chain4() -> (MixedGraph, [NodeId; 4]) {
    let mut g = MixedGraph::new();
    let a = g.add_measured_node("A").unwrap();
    let b = g.add_measured_node("B").unwrap();
    let c = g.add_measured_node("C").unwrap();
    let d = g.add_measured_node("D").unwrap();
    g.add_directed_edge(a, b).unwrap();
    g.add_directed_edge(b, c).unwrap();
    g.add_directed_edge(c, d).unwrap();
    (g, [a, b, c, d])
}

/// A -> L -> B and A -> L -> C with L latent: every measured pair is
/// joined by an inducing path through L.
pub fn latent_fork() -> (MixedGraph, [NodeId; 3]) {
    let mut g = MixedGraph::new();
    let a = g.add_measured_node("A").unwrap();
    let b = g.add_measured_node("B").unwrap();
    let c = g.add_measured_node("C").unwrap();
    let l = g.add_node("L", NodeType::Latent).unwrap();
    g.add_directed_edge(a, l).unwrap();
    g.add_directed_edge(l, b).unwrap();
    g.add_directed_edge(l, c).unwrap();
    (g, [a, b, c])
}

/// Two independent causes confounded with their effects through a latent
/// node: a -> x <- L -> y <- b.
pub fn latent_confounder() -> (MixedGraph, [NodeId; 4]) {
    let mut g = MixedGraph::new();
    let a = g.add_measured_node("A").unwrap();
    let b = g.add_measured_node("B").unwrap();
    let x = g.add_measured_node("X").unwrap();
    let y = g.add_measured_node("Y").unwrap();
    let l = g.add_node("L", NodeType::Latent).unwrap();
    g.add_directed_edge(a, x).unwrap();
    g.add_directed_edge(b, y).unwrap();
    g.add_directed_edge(l, x).unwrap();
    g.add_directed_edge(l, y).unwrap();
    (g, [a, b, x, y])
}
