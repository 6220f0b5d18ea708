//! Legality checking for MAGs and PAGs.
//!
//! Illegality is an expected, common outcome while testing search
//! output, so both checks return structured results with a
//! human-readable reason instead of erroring.

use ancestra_graph::{MixedGraph, NodeId, NodeType};
use rustc_hash::FxHashSet;

use crate::errors::SearchError;
use crate::transform::{mag_from_pag, MagToPag};

/// The outcome of a MAG legality check.
#[derive(Debug, Clone)]
pub struct LegalMagResult {
    /// Whether the graph is a legal MAG.
    pub legal: bool,
    /// Why not, or a confirmation when legal.
    pub reason: String,
}

/// The outcome of a PAG legality check.
#[derive(Debug, Clone)]
pub struct LegalPagResult {
    /// Whether the graph is a legal PAG.
    pub legal: bool,
    /// Why not, or a confirmation when legal.
    pub reason: String,
}

/// Checks the MAG conditions: all nodes measured; every edge directed,
/// bidirected, or undirected; directed part acyclic; no directed path
/// between the endpoints of a bidirected edge; maximality (no inducing
/// path between non-adjacent pairs); no parent or spouse incident on an
/// undirected edge's endpoints.
pub fn is_legal_mag(
    mag: &MixedGraph,
    selection: &FxHashSet<NodeId>,
) -> Result<LegalMagResult, SearchError> {
    for n in mag.nodes() {
        if n.node_type == NodeType::Latent {
            return Ok(LegalMagResult {
                legal: false,
                reason: format!("Node {} is not measured", n.name),
            });
        }
    }

    for e in mag.edges() {
        if !(e.is_directed() || e.is_bidirected() || e.is_undirected()) {
            return Ok(LegalMagResult {
                legal: false,
                reason: format!(
                    "Edge {} should be directed, bidirected, or undirected",
                    mag.edge_string(e)
                ),
            });
        }
    }

    for n in mag.nodes() {
        if mag.exists_directed_path(n.id, n.id) {
            return Ok(LegalMagResult {
                legal: false,
                reason: format!(
                    "Acyclicity violated: there is a directed cyclic path from {} to itself",
                    n.name
                ),
            });
        }
    }

    for e in mag.edges() {
        if !e.is_bidirected() {
            continue;
        }
        for (x, y) in [(e.node1, e.node2), (e.node2, e.node1)] {
            if let Some(path) = mag.directed_path(x, y) {
                let rendered: Vec<&str> = path.iter().map(|&n| mag.name_of(n)).collect();
                return Ok(LegalMagResult {
                    legal: false,
                    reason: format!(
                        "Bidirected edge semantics is violated: there is a directed path for {} \
                         from {} to {}. This is almost cyclic; for bidirected edges there should \
                         not be a path from either endpoint to the other. An example path is {}",
                        mag.edge_string(e),
                        mag.name_of(x),
                        mag.name_of(y),
                        rendered.join(" -> ")
                    ),
                });
            }
        }
    }

    let measured = mag.measured_nodes();
    for i in 0..measured.len() {
        for j in i + 1..measured.len() {
            let (x, y) = (measured[i], measured[j]);
            if mag.is_adjacent_to(x, y) {
                continue;
            }
            if mag.exists_inducing_path(x, y, selection)? {
                return Ok(LegalMagResult {
                    legal: false,
                    reason: format!(
                        "This is not maximal; there is an inducing path between non-adjacent {} and {}",
                        mag.name_of(x),
                        mag.name_of(y)
                    ),
                });
            }
        }
    }

    for e in mag.edges() {
        if !e.is_undirected() {
            continue;
        }
        for endpoint in [e.node1, e.node2] {
            for &z in mag.adjacent_nodes(endpoint) {
                if mag.is_parent_of(z, endpoint) || mag.is_spouse_of(z, endpoint) {
                    return Ok(LegalMagResult {
                        legal: false,
                        reason: format!(
                            "For undirected edge {}, {} should not be a parent or a spouse of {}",
                            mag.edge_string(e),
                            mag.name_of(z),
                            mag.name_of(endpoint)
                        ),
                    });
                }
            }
        }
    }

    Ok(LegalMagResult {
        legal: true,
        reason: "This is a legal MAG".into(),
    })
}

/// Checks the PAG conditions: all nodes measured; the implied MAG (via
/// [`mag_from_pag`]) is legal; and the PAG of that MAG reproduces the
/// original graph. On a round-trip mismatch the first differing edge is
/// reported.
pub fn is_legal_pag(
    pag: &MixedGraph,
    selection: &FxHashSet<NodeId>,
) -> Result<LegalPagResult, SearchError> {
    for n in pag.nodes() {
        if n.node_type != NodeType::Measured {
            return Ok(LegalPagResult {
                legal: false,
                reason: format!("Node {} is not measured", n.name),
            });
        }
    }

    let mag = mag_from_pag(pag)?;
    let legal_mag = is_legal_mag(&mag, selection)?;
    if !legal_mag.legal {
        return Ok(LegalPagResult {
            legal: false,
            reason: format!("{} in a MAG implied by this graph", legal_mag.reason),
        });
    }

    let pag2 = MagToPag::new(mag).convert()?;
    if &pag2 != pag {
        let mut edge_mismatch = String::new();
        for e in pag.edges() {
            match pag2.edge(e.node1, e.node2) {
                Some(e2)
                    if e2.pair() == e.pair()
                        && e2.canonical_endpoints() == e.canonical_endpoints() => {}
                Some(e2) => {
                    edge_mismatch = format!(
                        "For example, the original graph has edge {} whereas the reconstituted \
                         graph has edge {}",
                        pag.edge_string(e),
                        pag2.edge_string(e2)
                    );
                    break;
                }
                None => {
                    edge_mismatch = format!(
                        "For example, the original graph has edge {} which the reconstituted \
                         graph lacks",
                        pag.edge_string(e)
                    );
                    break;
                }
            }
        }
        let mut reason = String::from(
            "The MAG implied by this graph was a legal MAG, but one cannot recover the original \
             graph by finding the PAG of the implied MAG, so this is between a MAG and a PAG",
        );
        if !edge_mismatch.is_empty() {
            reason.push_str(". ");
            reason.push_str(&edge_mismatch);
        }
        return Ok(LegalPagResult {
            legal: false,
            reason,
        });
    }

    Ok(LegalPagResult {
        legal: true,
        reason: "This is a legal PAG".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directed_cycle_fails_acyclicity() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(b, c).unwrap();
        g.add_directed_edge(c, a).unwrap();
        let r = is_legal_mag(&g, &FxHashSet::default()).unwrap();
        assert!(!r.legal);
        assert!(r.reason.contains("Acyclicity violated"));
    }

    #[test]
    fn almost_cycle_fails_bidirected_semantics() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        g.add_directed_edge(a, b).unwrap();
        let c = g.add_measured_node("C").unwrap();
        // a -> b -> c with a <-> c: a directed path between spouse ends.
        g.add_directed_edge(b, c).unwrap();
        g.add_bidirected_edge(a, c).unwrap();
        let r = is_legal_mag(&g, &FxHashSet::default()).unwrap();
        assert!(!r.legal);
        assert!(r.reason.contains("almost cyclic"));
    }

    #[test]
    fn bidirected_chain_is_a_legal_mag() {
        // a <-> b <-> c: the collider at b blocks the path marginally, so
        // the non-adjacent pair is separable and the graph is maximal.
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_bidirected_edge(a, b).unwrap();
        g.add_bidirected_edge(b, c).unwrap();
        let r = is_legal_mag(&g, &FxHashSet::default()).unwrap();
        assert!(r.legal, "{}", r.reason);
    }

    #[test]
    fn non_maximal_mag_reports_inducing_path() {
        // a <-> b <-> c where b is an ancestor of a selection variable:
        // the path a <-> b <-> c is inducing, so the non-adjacent pair
        // {a, c} violates maximality.
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        let s = g.add_node("S", ancestra_graph::NodeType::Selection).unwrap();
        g.add_bidirected_edge(a, b).unwrap();
        g.add_bidirected_edge(b, c).unwrap();
        g.add_directed_edge(b, s).unwrap();
        let mut selection = FxHashSet::default();
        selection.insert(s);
        let r = is_legal_mag(&g, &selection).unwrap();
        assert!(!r.legal);
        assert!(r.reason.contains("not maximal"));
    }

    #[test]
    fn undirected_edge_with_incident_parent_is_illegal() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_undirected_edge(a, b).unwrap();
        g.add_directed_edge(c, a).unwrap();
        let r = is_legal_mag(&g, &FxHashSet::default()).unwrap();
        assert!(!r.legal);
        assert!(r.reason.contains("parent or a spouse"));
    }

    #[test]
    fn pag_with_cyclic_implied_mag_mentions_acyclicity() {
        // Scenario 4: the derived MAG has a directed cycle.
        let mut pag = MixedGraph::new();
        let a = pag.add_measured_node("A").unwrap();
        let b = pag.add_measured_node("B").unwrap();
        let c = pag.add_measured_node("C").unwrap();
        pag.add_directed_edge(a, b).unwrap();
        pag.add_directed_edge(b, c).unwrap();
        pag.add_directed_edge(c, a).unwrap();
        let r = is_legal_pag(&pag, &FxHashSet::default()).unwrap();
        assert!(!r.legal);
        assert!(r.reason.contains("Acyclicity violated"));
    }
}
