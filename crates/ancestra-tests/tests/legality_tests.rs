//! Legality checking over converted and hand-damaged graphs.

use ancestra_graph::{Endpoint, MixedGraph};
use ancestra_search::{is_legal_pag, DagToPag};
use ancestra_tests::{chain4, latent_confounder, latent_fork};
use rustc_hash::FxHashSet;

/// Every DAG-derived PAG is legal and survives the MAG round trip.
#[test]
fn converted_pags_are_legal() {
    for dag in [chain4().0, latent_fork().0, latent_confounder().0] {
        let pag = DagToPag::new(dag).convert().unwrap();
        let r = is_legal_pag(&pag, &FxHashSet::default()).unwrap();
        assert!(r.legal, "{}", r.reason);
    }
}

/// Scenario: a graph whose derived MAG contains a directed cycle is
/// rejected with an acyclicity reason.
#[test]
fn cyclic_graph_is_not_a_legal_pag() {
    let mut g = MixedGraph::new();
    let a = g.add_measured_node("A").unwrap();
    let b = g.add_measured_node("B").unwrap();
    let c = g.add_measured_node("C").unwrap();
    g.add_directed_edge(a, b).unwrap();
    g.add_directed_edge(b, c).unwrap();
    g.add_directed_edge(c, a).unwrap();

    let r = is_legal_pag(&g, &FxHashSet::default()).unwrap();
    assert!(!r.legal);
    assert!(r.reason.contains("Acyclicity violated"), "{}", r.reason);
}

/// Damaging one endpoint of a legal PAG breaks the round trip and is
/// reported with the differing edge.
#[test]
fn damaged_endpoint_fails_round_trip() {
    let (dag, [a, _, x, _]) = latent_confounder();
    let mut pag = DagToPag::new(dag).convert().unwrap();
    // Fix the circle at a into a tail: claims a is an ancestor, which the
    // equivalence class does not support.
    pag.set_endpoint(x, a, Endpoint::Tail).unwrap();

    let r = is_legal_pag(&pag, &FxHashSet::default()).unwrap();
    assert!(!r.legal);
}

/// A graph with a latent node is rejected up front.
#[test]
fn latent_node_is_rejected() {
    let (dag, _) = latent_fork();
    let r = is_legal_pag(&dag, &FxHashSet::default()).unwrap();
    assert!(!r.legal);
    assert!(r.reason.contains("not measured"));
}
