//! Meek's rules: implied orientation for patterns without latents.
//!
//! The simpler sibling of the FCI rules, used by non-latent-variable
//! algorithms on CPDAGs/patterns (directed and undirected edges only).
//! Rules 1-4 are applied to fixpoint, two-sided per pair, each arrowhead
//! gated by background knowledge. Returns the set of nodes incident to
//! any orientation, for callers that revisit only the affected
//! neighborhood.

use ancestra_graph::{Endpoint, MixedGraph, NodeId};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;

use crate::errors::SearchError;
use crate::knowledge::Knowledge;
use crate::sepsets::Combinations;

/// Meek-rules propagation over a pattern.
#[derive(Debug, Clone, Default)]
pub struct MeekRules {
    knowledge: Knowledge,
    prevent_cycles: bool,
}

impl MeekRules {
    /// A propagator with empty knowledge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets background knowledge.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    /// When set, an orientation that would complete a directed cycle is
    /// skipped.
    pub fn set_prevent_cycles(&mut self, prevent: bool) {
        self.prevent_cycles = prevent;
    }

    /// Applies rules 1-4 to fixpoint. Returns the nodes incident to any
    /// orientation made.
    pub fn orient_implied(
        &self,
        graph: &mut MixedGraph,
    ) -> Result<FxHashSet<NodeId>, SearchError> {
        let mut visited = FxHashSet::default();
        loop {
            let mut changed = self.meek_r1(graph, &mut visited)?;
            if !changed {
                changed = self.meek_r2(graph, &mut visited)?;
            }
            if !changed {
                changed = self.meek_r3(graph, &mut visited)?;
            }
            if !changed {
                changed = self.meek_r4(graph, &mut visited)?;
            }
            if !changed {
                break;
            }
        }
        Ok(visited)
    }

    fn direct(
        &self,
        from: NodeId,
        to: NodeId,
        graph: &mut MixedGraph,
        visited: &mut FxHashSet<NodeId>,
        rule: &str,
    ) -> Result<bool, SearchError> {
        // In a pattern the tail marks of undirected edges are orientable;
        // only knowledge constrains the arrowhead here.
        let from_name = graph.name_of(from).to_string();
        let to_name = graph.name_of(to).to_string();
        if self.knowledge.is_required(&to_name, &from_name)
            || self.knowledge.is_forbidden(&from_name, &to_name)
        {
            return Ok(false);
        }
        if self.prevent_cycles && graph.exists_directed_path(to, from) {
            return Ok(false);
        }
        graph.set_endpoint(from, to, Endpoint::Arrow)?;
        graph.set_endpoint(to, from, Endpoint::Tail)?;
        debug!(
            from = graph.name_of(from),
            to = graph.name_of(to),
            rule, "meek orientation"
        );
        visited.insert(from);
        visited.insert(to);
        Ok(true)
    }

    /// R1: b -> a, a --- c, b and c nonadjacent orients a -> c.
    fn meek_r1(
        &self,
        graph: &mut MixedGraph,
        visited: &mut FxHashSet<NodeId>,
    ) -> Result<bool, SearchError> {
        let mut changed = false;
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for a in nodes {
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(a).iter().copied().collect();
            if adj.len() < 2 {
                continue;
            }
            for combo in Combinations::new(adj.len(), 2) {
                let b = adj[combo[0]];
                let c = adj[combo[1]];
                if graph.is_adjacent_to(b, c) {
                    continue;
                }
                if graph.endpoint(b, a) == Some(Endpoint::Arrow) && is_undirected(graph, a, c) {
                    changed |= self.direct(a, c, graph, visited, "R1")?;
                } else if graph.endpoint(c, a) == Some(Endpoint::Arrow)
                    && is_undirected(graph, a, b)
                {
                    changed |= self.direct(a, b, graph, visited, "R1")?;
                }
            }
        }
        Ok(changed)
    }

    /// R2: b -> a -> c with b --- c orients b -> c.
    fn meek_r2(
        &self,
        graph: &mut MixedGraph,
        visited: &mut FxHashSet<NodeId>,
    ) -> Result<bool, SearchError> {
        let mut changed = false;
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for a in nodes {
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(a).iter().copied().collect();
            if adj.len() < 2 {
                continue;
            }
            for combo in Combinations::new(adj.len(), 2) {
                let b = adj[combo[0]];
                let c = adj[combo[1]];
                if graph.is_parent_of(b, a)
                    && graph.is_parent_of(a, c)
                    && is_undirected(graph, b, c)
                {
                    changed |= self.direct(b, c, graph, visited, "R2")?;
                } else if graph.is_parent_of(c, a)
                    && graph.is_parent_of(a, b)
                    && is_undirected(graph, c, b)
                {
                    changed |= self.direct(c, b, graph, visited, "R2")?;
                }
            }
        }
        Ok(changed)
    }

    /// R3: a --- b, a --- c, a --- d, c -> b, d -> b, c and d nonadjacent
    /// orients a -> b.
    fn meek_r3(
        &self,
        graph: &mut MixedGraph,
        visited: &mut FxHashSet<NodeId>,
    ) -> Result<bool, SearchError> {
        let mut changed = false;
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for a in nodes {
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(a).iter().copied().collect();
            if adj.len() < 3 {
                continue;
            }
            for &b in &adj {
                if !is_undirected(graph, a, b) {
                    continue;
                }
                let others: SmallVec<[NodeId; 8]> =
                    adj.iter().copied().filter(|&n| n != b).collect();
                let mut fired = false;
                for combo in Combinations::new(others.len(), 2) {
                    let c = others[combo[0]];
                    let d = others[combo[1]];
                    if graph.is_adjacent_to(c, d) {
                        continue;
                    }
                    if !is_undirected(graph, a, c) || !is_undirected(graph, a, d) {
                        continue;
                    }
                    if graph.is_parent_of(c, b) && graph.is_parent_of(d, b) {
                        fired = self.direct(a, b, graph, visited, "R3")?;
                        if fired {
                            break;
                        }
                    }
                }
                if fired {
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// R4: with d adjacent to a, pairs (b, c) of the other neighbors of a
    /// where a --- b and a --- c: b -> c <- d orients a -> c, and
    /// c -> d -> b orients a -> b.
    fn meek_r4(
        &self,
        graph: &mut MixedGraph,
        visited: &mut FxHashSet<NodeId>,
    ) -> Result<bool, SearchError> {
        let mut changed = false;
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for a in nodes {
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(a).iter().copied().collect();
            if adj.len() < 3 {
                continue;
            }
            for &d in &adj {
                let others: SmallVec<[NodeId; 8]> =
                    adj.iter().copied().filter(|&n| n != d).collect();
                for combo in Combinations::new(others.len(), 2) {
                    let b = others[combo[0]];
                    let c = others[combo[1]];
                    if !is_undirected(graph, a, b) || !is_undirected(graph, a, c) {
                        continue;
                    }
                    if graph.is_parent_of(b, c) && graph.is_parent_of(d, c) {
                        if self.direct(a, c, graph, visited, "R4")? {
                            changed = true;
                            break;
                        }
                    } else if graph.is_parent_of(c, d) && graph.is_parent_of(d, b) {
                        if self.direct(a, b, graph, visited, "R4")? {
                            changed = true;
                            break;
                        }
                    }
                }
            }
        }
        Ok(changed)
    }
}

fn is_undirected(graph: &MixedGraph, a: NodeId, b: NodeId) -> bool {
    graph.edge(a, b).map(|e| e.is_undirected()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r1_propagates_away_from_collider() {
        // b -> a --- c with b, c nonadjacent: orient a -> c.
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(b, a).unwrap();
        g.add_undirected_edge(a, c).unwrap();

        let meek = MeekRules::new();
        let visited = meek.orient_implied(&mut g).unwrap();
        assert!(g.is_parent_of(a, c));
        assert!(visited.contains(&a) && visited.contains(&c));
    }

    #[test]
    fn r2_closes_transitive_triangle() {
        // b -> a -> c, b --- c: orient b -> c.
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(b, a).unwrap();
        g.add_directed_edge(a, c).unwrap();
        g.add_undirected_edge(b, c).unwrap();

        let meek = MeekRules::new();
        meek.orient_implied(&mut g).unwrap();
        assert!(g.is_parent_of(b, c));
    }

    #[test]
    fn fixpoint_makes_no_further_changes() {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(b, a).unwrap();
        g.add_undirected_edge(a, c).unwrap();
        let meek = MeekRules::new();
        meek.orient_implied(&mut g).unwrap();
        let snapshot = g.clone();
        let visited = meek.orient_implied(&mut g).unwrap();
        assert!(visited.is_empty());
        assert_eq!(g, snapshot);
    }
}
