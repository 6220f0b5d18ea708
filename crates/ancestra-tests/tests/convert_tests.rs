//! DAG -> PAG conversion scenarios.

use std::sync::Arc;

use ancestra_graph::{Endpoint, MixedGraph};
use ancestra_search::{DagToPag, FciOrient, MagToPag, OracleStrategy, PagCache};
use ancestra_tests::{chain4, latent_confounder, latent_fork};
use rustc_hash::FxHashSet;

/// A fully measured chain keeps its skeleton exactly, and with no
/// colliders or latents every endpoint is a circle (reversed chains are
/// Markov equivalent).
#[test]
fn chain_without_latents() {
    let (dag, [a, b, c, d]) = chain4();
    let pag = DagToPag::new(dag).convert().unwrap();

    assert_eq!(pag.node_count(), 4);
    assert_eq!(pag.edge_count(), 3);
    for (x, y) in [(a, b), (b, c), (c, d)] {
        assert!(pag.edge(x, y).unwrap().is_nondirected());
    }
    assert!(!pag.is_adjacent_to(a, c));
    assert!(!pag.is_adjacent_to(a, d));
    assert!(!pag.is_adjacent_to(b, d));
}

/// Scenario: A -> L -> B, A -> L -> C with L latent. Every measured pair
/// is joined by an inducing path through L, no independencies remain, and
/// the PAG is the complete circle-circle graph over {A, B, C}.
#[test]
fn latent_chain_fork_keeps_circle_edges() {
    let (dag, [a, b, c]) = latent_fork();
    let pag = DagToPag::new(dag).convert().unwrap();

    assert_eq!(pag.node_count(), 3, "latent node is excluded");
    for (x, y) in [(a, b), (a, c), (b, c)] {
        let e = pag.edge(x, y).expect("inducing path implies adjacency");
        assert!(e.is_nondirected(), "got {}", pag.edge_string(e));
    }
}

/// A latent confounder between two measured effects leaves a bidirected
/// edge, with circles at the exogenous causes.
#[test]
fn latent_confounder_yields_bidirected_edge() {
    let (dag, [a, b, x, y]) = latent_confounder();
    let pag = DagToPag::new(dag).convert().unwrap();

    assert!(pag.edge(x, y).unwrap().is_bidirected());
    // a o-> x and b o-> y.
    assert_eq!(pag.endpoint(a, x), Some(Endpoint::Arrow));
    assert_eq!(pag.endpoint(x, a), Some(Endpoint::Circle));
    assert_eq!(pag.endpoint(b, y), Some(Endpoint::Arrow));
    assert_eq!(pag.endpoint(y, b), Some(Endpoint::Circle));
    assert!(!pag.is_adjacent_to(a, b));
    assert!(!pag.is_adjacent_to(a, y));
    assert!(!pag.is_adjacent_to(b, x));
}

/// Soundness: adjacency in the PAG agrees with the inducing-path test on
/// the input DAG for every measured pair, and every arrowhead placed at a
/// node is witnessed by an inducing path into that node.
#[test]
fn adjacency_and_arrowheads_agree_with_inducing_paths() {
    for (dag, _) in [
        (chain4().0, ()),
        (latent_fork().0, ()),
        (latent_confounder().0, ()),
    ] {
        let pag = DagToPag::new(dag.clone()).convert().unwrap();
        let measured = dag.measured_nodes();
        let sel = FxHashSet::default();
        for i in 0..measured.len() {
            for j in i + 1..measured.len() {
                let (x, y) = (measured[i], measured[j]);
                assert_eq!(
                    pag.is_adjacent_to(x, y),
                    dag.exists_inducing_path(x, y, &sel).unwrap(),
                    "adjacency mismatch for {}-{}",
                    dag.name_of(x),
                    dag.name_of(y)
                );
                if pag.endpoint(x, y) == Some(Endpoint::Arrow) {
                    assert!(
                        dag.exists_inducing_path_into(x, y, &sel).unwrap(),
                        "unwitnessed arrowhead at {}",
                        dag.name_of(y)
                    );
                }
                if pag.endpoint(y, x) == Some(Endpoint::Arrow) {
                    assert!(
                        dag.exists_inducing_path_into(y, x, &sel).unwrap(),
                        "unwitnessed arrowhead at {}",
                        dag.name_of(x)
                    );
                }
            }
        }
    }
}

/// Idempotence: re-running the engine on an already-oriented PAG changes
/// nothing.
#[test]
fn orientation_is_idempotent() {
    let (dag, _) = latent_confounder();
    let pag = DagToPag::new(dag.clone()).convert().unwrap();

    let mut again = pag.clone();
    let mut engine = FciOrient::new(Box::new(OracleStrategy::dag_oracle(dag)));
    engine.orient(&mut again).unwrap();
    assert_eq!(again, pag);
}

/// MAG -> PAG round trip through the derived MAG reproduces the PAG.
#[test]
fn mag_round_trip_reproduces_pag() {
    let (dag, _) = latent_confounder();
    let pag = DagToPag::new(dag).convert().unwrap();
    let mag = ancestra_search::mag_from_pag(&pag).unwrap();
    let pag2 = MagToPag::new(mag).convert().unwrap();
    assert_eq!(pag2, pag);
}

/// The injected cache short-circuits repeated conversions of the same
/// DAG and distinguishes structurally different inputs.
#[test]
fn cache_is_keyed_by_structure() {
    let (dag1, _) = chain4();
    let (dag2, _) = latent_fork();
    let cache = Arc::new(PagCache::new());

    let mut c1 = DagToPag::new(dag1.clone());
    c1.set_cache(cache.clone());
    let p1 = c1.convert().unwrap();
    let p1_again = c1.convert().unwrap();
    assert_eq!(p1, p1_again);
    assert_eq!(cache.len(), 1);

    let mut c2 = DagToPag::new(dag2);
    c2.set_cache(cache.clone());
    let _ = c2.convert().unwrap();
    assert_eq!(cache.len(), 2);

    // A fresh but structurally identical DAG hits the first entry.
    let (dag1_copy, _) = chain4();
    let mut c3 = DagToPag::new(dag1_copy);
    c3.set_cache(cache.clone());
    let p3 = c3.convert().unwrap();
    assert_eq!(p3, p1);
    assert_eq!(cache.len(), 2);
}

/// Interrupting a conversion's engine run leaves a graph over the same
/// skeleton (partial orientation, never structural damage).
#[test]
fn interrupted_engine_preserves_skeleton() {
    use std::sync::atomic::AtomicBool;

    let (dag, _) = latent_confounder();
    let pag = DagToPag::new(dag.clone()).convert().unwrap();

    let mut partial = pag.clone();
    let mut engine = FciOrient::new(Box::new(OracleStrategy::dag_oracle(dag)));
    engine.set_interrupt(Arc::new(AtomicBool::new(true)));
    engine.orient(&mut partial).unwrap();

    assert_eq!(partial.edge_count(), pag.edge_count());
    for e in pag.edges() {
        assert!(partial.is_adjacent_to(e.node1, e.node2));
    }
}

/// Spirtes mode (arrow-complete only) still orients the confounder's
/// arrowheads.
#[test]
fn spirtes_rule_set_orients_colliders() {
    let (dag, [_, _, x, y]) = latent_confounder();
    let mut conv = DagToPag::new(dag);
    conv.set_complete_rule_set_used(false);
    let pag = conv.convert().unwrap();
    assert!(pag.edge(x, y).unwrap().is_bidirected());
}

/// An empty graph converts to an empty PAG.
#[test]
fn empty_graph_converts() {
    let dag = MixedGraph::new();
    let pag = DagToPag::new(dag).convert().unwrap();
    assert_eq!(pag.node_count(), 0);
    assert_eq!(pag.edge_count(), 0);
}
