//! The FCI orientation engine: Zhang's rules R0-R10 as a fixed-point
//! loop over edge endpoint marks.
//!
//! Two final-orientation rule sets are supported, selected by
//! [`FciOrient::set_complete_rule_set_used`]:
//!
//! - Spirtes (arrow complete): R1-R4 to fixpoint;
//! - Zhang (arrow and tail complete, the default): R1-R4 to fixpoint,
//!   then R5 once, R6/R7 to fixpoint, and R8-R10 to fixpoint.
//!
//! R0 and R4 are the only rules that need more than the working graph;
//! they are delegated to the injected [`R0R4Strategy`]. Every arrowhead
//! placement is gated by [`is_arrowhead_allowed`] against background
//! knowledge.
//!
//! Rule application order within an epoch is fixed, iteration follows the
//! graph's insertion-ordered adjacency, and symmetric rules are applied
//! two-sided per unordered pair, so runs are reproducible. Long loops
//! check a cooperative interrupt flag and return the partially oriented
//! graph when it is raised; callers must treat such a result as
//! incomplete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ancestra_graph::{Endpoint, MixedGraph, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::discriminating::{list_discriminating_paths, DiscriminatingPath};
use crate::errors::SearchError;
use crate::knowledge::Knowledge;
use crate::sepsets::Combinations;
use crate::strategy::R0R4Strategy;
use crate::triple::Triple;

/// Whether an arrowhead may be placed at y on the edge between x and y.
///
/// Allowed when the mark at y is already an arrowhead (no change), never
/// when it is a fixed tail, and otherwise only when knowledge neither
/// requires y -> x nor forbids x -> y (a forbidden x -> y is still
/// admissible when the mark at x is already an arrowhead, since the edge
/// then becomes bidirected rather than directed).
pub fn is_arrowhead_allowed(
    graph: &MixedGraph,
    x: NodeId,
    y: NodeId,
    knowledge: &Knowledge,
) -> bool {
    if !graph.is_adjacent_to(x, y) {
        return false;
    }
    let at_y = graph.endpoint(x, y);
    let at_x = graph.endpoint(y, x);
    if at_y == Some(Endpoint::Arrow) {
        return true;
    }
    if at_y == Some(Endpoint::Tail) {
        return false;
    }
    let xn = graph.name_of(x);
    let yn = graph.name_of(y);
    if knowledge.is_required(yn, xn) {
        return false;
    }
    if knowledge.is_forbidden(xn, yn) && at_x != Some(Endpoint::Arrow) {
        return false;
    }
    at_y == Some(Endpoint::Circle)
}

/// The orientation engine.
pub struct FciOrient {
    strategy: Box<dyn R0R4Strategy>,
    knowledge: Knowledge,
    complete_rule_set_used: bool,
    max_discriminating_path_length: Option<usize>,
    use_r4: bool,
    prevent_cycles: bool,
    change_flag: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl FciOrient {
    /// Creates an engine around a strategy, inheriting the strategy's
    /// knowledge.
    pub fn new(strategy: Box<dyn R0R4Strategy>) -> Self {
        let knowledge = strategy.knowledge().clone();
        Self {
            strategy,
            knowledge,
            complete_rule_set_used: true,
            max_discriminating_path_length: None,
            use_r4: true,
            prevent_cycles: false,
            change_flag: false,
            interrupt: None,
        }
    }

    /// Selects the Zhang (true, default) or Spirtes (false) rule set.
    pub fn set_complete_rule_set_used(&mut self, complete: bool) {
        self.complete_rule_set_used = complete;
    }

    /// Bounds the number of nodes on any discriminating path (None =
    /// unbounded). Bounds below 4 nodes are rejected, since no
    /// discriminating path is shorter.
    pub fn set_max_discriminating_path_length(
        &mut self,
        max: Option<usize>,
    ) -> Result<(), SearchError> {
        if let Some(m) = max {
            if m < 4 {
                return Err(SearchError::InvalidArgument(format!(
                    "max discriminating path length must be >= 4 nodes, got {m}"
                )));
            }
        }
        self.max_discriminating_path_length = max;
        Ok(())
    }

    /// Enables or disables R4 entirely.
    pub fn set_use_r4(&mut self, use_r4: bool) {
        self.use_r4 = use_r4;
    }

    /// When set, a tail/arrow orientation that would complete a directed
    /// cycle is skipped instead of applied.
    pub fn set_prevent_cycles(&mut self, prevent: bool) {
        self.prevent_cycles = prevent;
    }

    /// Replaces the background knowledge.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    /// Installs a cooperative interrupt flag. Long loops poll it and
    /// break early, leaving the graph partially oriented.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Performs the full FCI orientation: R0 followed by the final
    /// orientation rules. Returns the unshielded-collider triples
    /// oriented by R0.
    pub fn orient(
        &mut self,
        graph: &mut MixedGraph,
    ) -> Result<FxHashSet<Triple>, SearchError> {
        info!("starting FCI orientation");
        let mut triples = FxHashSet::default();
        self.rule_r0(graph, &mut triples)?;
        self.final_orientation(graph)?;
        Ok(triples)
    }

    /// R0: reorients everything to circles, applies background-knowledge
    /// orientations, and orients every unshielded triple the strategy
    /// judges a collider.
    pub fn rule_r0(
        &mut self,
        graph: &mut MixedGraph,
        unshielded_triples: &mut FxHashSet<Triple>,
    ) -> Result<(), SearchError> {
        graph.reorient_all_with(Endpoint::Circle);
        self.orient_background_knowledge(graph)?;

        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for b in nodes {
            if self.interrupted() {
                break;
            }
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(b).iter().copied().collect();
            if adj.len() < 2 {
                continue;
            }
            for combo in Combinations::new(adj.len(), 2) {
                let a = adj[combo[0]];
                let c = adj[combo[1]];
                if graph.is_adjacent_to(a, c) {
                    continue;
                }
                if graph.is_def_collider(a, b, c) {
                    continue;
                }
                if self.strategy.is_unshielded_collider(graph, a, b, c)? {
                    if !is_arrowhead_allowed(graph, a, b, &self.knowledge) {
                        continue;
                    }
                    if !is_arrowhead_allowed(graph, c, b, &self.knowledge) {
                        continue;
                    }
                    graph.set_endpoint(a, b, Endpoint::Arrow)?;
                    graph.set_endpoint(c, b, Endpoint::Arrow)?;
                    unshielded_triples.insert(Triple::new(a, b, c)?);
                    debug!(
                        a = graph.name_of(a),
                        b = graph.name_of(b),
                        c = graph.name_of(c),
                        "R0: unshielded collider"
                    );
                    self.change_flag = true;
                }
            }
        }
        Ok(())
    }

    /// Orients edges implied by background knowledge: forbidden pairs get
    /// an arrowhead against the forbidden direction, required pairs
    /// become directed edges.
    pub fn orient_background_knowledge(
        &mut self,
        graph: &mut MixedGraph,
    ) -> Result<(), SearchError> {
        for (from, to) in self.knowledge.forbidden_edges() {
            let (Some(from), Some(to)) =
                (graph.node_by_name(&from), graph.node_by_name(&to))
            else {
                continue;
            };
            if graph.edge(from, to).is_none() {
                continue;
            }
            if !is_arrowhead_allowed(graph, to, from, &self.knowledge) {
                continue;
            }
            // Orient to *-> from.
            graph.set_endpoint(to, from, Endpoint::Arrow)?;
            debug!(
                from = graph.name_of(to),
                to = graph.name_of(from),
                "knowledge: forbidden edge arrowhead"
            );
            self.change_flag = true;
        }
        for (from, to) in self.knowledge.required_edges() {
            let (Some(from), Some(to)) =
                (graph.node_by_name(&from), graph.node_by_name(&to))
            else {
                continue;
            };
            if graph.edge(from, to).is_none() {
                continue;
            }
            if !is_arrowhead_allowed(graph, from, to, &self.knowledge) {
                continue;
            }
            graph.set_endpoint(to, from, Endpoint::Tail)?;
            graph.set_endpoint(from, to, Endpoint::Arrow)?;
            debug!(
                from = graph.name_of(from),
                to = graph.name_of(to),
                "knowledge: required edge"
            );
            self.change_flag = true;
        }
        Ok(())
    }

    /// The final orientation rules, per the selected rule set.
    pub fn final_orientation(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        if self.complete_rule_set_used {
            self.zhang_final_orientation(graph)
        } else {
            self.spirtes_final_orientation(graph)
        }
    }

    fn r1_to_r4_fixpoint(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        self.change_flag = true;
        while self.change_flag && !self.interrupted() {
            self.change_flag = false;
            self.rules_r1_r2_cycle(graph)?;
            self.rule_r3(graph)?;
            self.rule_r4(graph)?;
            debug!("epoch");
        }
        Ok(())
    }

    fn spirtes_final_orientation(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        self.r1_to_r4_fixpoint(graph)
    }

    fn zhang_final_orientation(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        self.r1_to_r4_fixpoint(graph)?;

        // By Zhang's remark, R5 is applied once, then R6/R7 to fixpoint,
        // then R8-R10 to fixpoint.
        self.rule_r5(graph)?;

        self.change_flag = true;
        while self.change_flag && !self.interrupted() {
            self.change_flag = false;
            self.rule_r6(graph)?;
            self.rule_r7(graph)?;
        }

        self.change_flag = true;
        while self.change_flag && !self.interrupted() {
            self.change_flag = false;
            self.rules_r8_r9_r10(graph)?;
        }
        Ok(())
    }

    /// Applies R1 and R2 two-sided over every unordered pair of
    /// neighbors of every node.
    pub fn rules_r1_r2_cycle(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for b in nodes {
            if self.interrupted() {
                break;
            }
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(b).iter().copied().collect();
            if adj.len() < 2 {
                continue;
            }
            for combo in Combinations::new(adj.len(), 2) {
                let a = adj[combo[0]];
                let c = adj[combo[1]];
                // The pair enumeration sees each unordered pair once, so
                // both orders are tried explicitly.
                self.rule_r1(a, b, c, graph)?;
                self.rule_r1(c, b, a, graph)?;
                self.rule_r2(a, b, c, graph)?;
                self.rule_r2(c, b, a, graph)?;
            }
        }
        Ok(())
    }

    /// R1: a *-> b o-* c with a, c nonadjacent orients b -> c.
    pub fn rule_r1(
        &mut self,
        a: NodeId,
        b: NodeId,
        c: NodeId,
        graph: &mut MixedGraph,
    ) -> Result<(), SearchError> {
        if graph.is_adjacent_to(a, c) {
            return Ok(());
        }
        if graph.endpoint(a, b) == Some(Endpoint::Arrow)
            && graph.endpoint(c, b) == Some(Endpoint::Circle)
        {
            if !is_arrowhead_allowed(graph, b, c, &self.knowledge) {
                return Ok(());
            }
            if self.would_close_cycle(graph, b, c) {
                return Ok(());
            }
            graph.set_endpoint(c, b, Endpoint::Tail)?;
            graph.set_endpoint(b, c, Endpoint::Arrow)?;
            debug!(
                b = graph.name_of(b),
                c = graph.name_of(c),
                "R1: away from collider"
            );
            self.change_flag = true;
        }
        Ok(())
    }

    /// R2: a -> b *-> c or a *-> b -> c, with a o-* c, orients the circle
    /// at c to an arrowhead.
    pub fn rule_r2(
        &mut self,
        a: NodeId,
        b: NodeId,
        c: NodeId,
        graph: &mut MixedGraph,
    ) -> Result<(), SearchError> {
        if !(graph.is_adjacent_to(a, c) && graph.endpoint(a, c) == Some(Endpoint::Circle)) {
            return Ok(());
        }
        let ab_arrow = graph.endpoint(a, b) == Some(Endpoint::Arrow);
        let bc_arrow = graph.endpoint(b, c) == Some(Endpoint::Arrow);
        let tail_at_a = graph.endpoint(b, a) == Some(Endpoint::Tail);
        let tail_at_b = graph.endpoint(c, b) == Some(Endpoint::Tail);
        if ab_arrow && bc_arrow && (tail_at_a || tail_at_b) {
            if !is_arrowhead_allowed(graph, a, c, &self.knowledge) {
                return Ok(());
            }
            graph.set_endpoint(a, c, Endpoint::Arrow)?;
            debug!(
                a = graph.name_of(a),
                c = graph.name_of(c),
                "R2: away from ancestor"
            );
            self.change_flag = true;
        }
        Ok(())
    }

    /// R3: a *-> b <-* c, a *-o d o-* c, a, c nonadjacent, d *-o b,
    /// orients d *-> b.
    pub fn rule_r3(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        'nodes: for b in nodes {
            if self.interrupted() {
                break;
            }
            let adj: SmallVec<[NodeId; 8]> = graph.adjacent_nodes(b).iter().copied().collect();
            if adj.len() < 3 {
                continue;
            }
            for combo in Combinations::new(adj.len(), 3) {
                let trio = [adj[combo[0]], adj[combo[1]], adj[combo[2]]];
                // Each of the three can play the d role; a and c are
                // symmetric in the collider test.
                for (a, d, c) in [
                    (trio[0], trio[1], trio[2]),
                    (trio[0], trio[2], trio[1]),
                    (trio[1], trio[0], trio[2]),
                ] {
                    if graph.is_adjacent_to(a, c) {
                        continue;
                    }
                    if !graph.is_def_collider(a, b, c) {
                        continue;
                    }
                    if !(graph.is_adjacent_to(a, d) && graph.is_adjacent_to(c, d)) {
                        continue;
                    }
                    if !(graph.endpoint(d, b) == Some(Endpoint::Circle)
                        && graph.endpoint(a, d) == Some(Endpoint::Circle)
                        && graph.endpoint(c, d) == Some(Endpoint::Circle))
                    {
                        continue;
                    }
                    if !is_arrowhead_allowed(graph, d, b, &self.knowledge) {
                        continue;
                    }
                    graph.set_endpoint(d, b, Endpoint::Arrow)?;
                    debug!(
                        d = graph.name_of(d),
                        b = graph.name_of(b),
                        "R3: double triangle"
                    );
                    self.change_flag = true;
                    continue 'nodes;
                }
            }
        }
        Ok(())
    }

    /// R4: lists the discriminating paths in the current graph, re-checks
    /// each against the mutated graph, and lets the strategy resolve the
    /// circle at v. Repeats until a listing round orients nothing.
    pub fn rule_r4(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        if !self.use_r4 {
            return Ok(());
        }
        loop {
            if self.interrupted() {
                break;
            }
            let paths = list_discriminating_paths(graph, self.max_discriminating_path_length);
            if paths.is_empty() {
                break;
            }
            let mut oriented_any = false;
            for path in &paths {
                if self.interrupted() {
                    break;
                }
                if !path.exists_in(graph) {
                    continue;
                }
                if self.strategy.resolve_discriminating_path(path, graph)? {
                    self.change_flag = true;
                    oriented_any = true;
                }
            }
            if !oriented_any {
                break;
            }
        }
        Ok(())
    }

    /// R5: a nondirected edge joined by an uncovered circle path becomes
    /// undirected, along with every edge on the path.
    pub fn rule_r5(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let edges: Vec<(NodeId, NodeId)> = graph
            .edges()
            .iter()
            .filter(|e| e.is_nondirected())
            .map(|e| (e.node1, e.node2))
            .collect();
        for (x, y) in edges {
            if self.interrupted() {
                break;
            }
            // The edge may have been reoriented by an earlier R5 firing.
            match graph.edge(x, y) {
                Some(e) if e.is_nondirected() => {}
                _ => continue,
            }
            let Some(interior) = uncovered_circle_path(graph, x, y) else {
                continue;
            };
            let mut full = vec![x];
            full.extend(interior.iter().copied());
            full.push(y);
            graph.set_endpoint(x, y, Endpoint::Tail)?;
            graph.set_endpoint(y, x, Endpoint::Tail)?;
            for pair in full.windows(2) {
                graph.set_endpoint(pair[0], pair[1], Endpoint::Tail)?;
                graph.set_endpoint(pair[1], pair[0], Endpoint::Tail)?;
            }
            debug!(
                x = graph.name_of(x),
                y = graph.name_of(y),
                "R5: uncovered circle path"
            );
            self.change_flag = true;
        }
        Ok(())
    }

    /// R6: a --- b o-* c orients the circle at b to a tail.
    pub fn rule_r6(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let undirected: Vec<(NodeId, NodeId)> = graph
            .edges()
            .iter()
            .filter(|e| e.is_undirected())
            .map(|e| (e.node1, e.node2))
            .collect();
        for (n1, n2) in undirected {
            for (a, b) in [(n1, n2), (n2, n1)] {
                let adj: SmallVec<[NodeId; 8]> =
                    graph.adjacent_nodes(b).iter().copied().collect();
                for c in adj {
                    if c != a && graph.endpoint(c, b) == Some(Endpoint::Circle) {
                        graph.set_endpoint(c, b, Endpoint::Tail)?;
                        debug!(
                            b = graph.name_of(b),
                            c = graph.name_of(c),
                            "R6: single tail"
                        );
                        self.change_flag = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// R7: a -o b o-* c with a, c nonadjacent orients the circle at b to
    /// a tail.
    pub fn rule_r7(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let edges: Vec<(NodeId, NodeId)> = graph
            .edges()
            .iter()
            .map(|e| (e.node1, e.node2))
            .collect();
        for (n1, n2) in edges {
            for (a, b) in [(n1, n2), (n2, n1)] {
                if !(graph.endpoint(a, b) == Some(Endpoint::Circle)
                    && graph.endpoint(b, a) == Some(Endpoint::Tail))
                {
                    continue;
                }
                let adj: SmallVec<[NodeId; 8]> =
                    graph.adjacent_nodes(b).iter().copied().collect();
                for c in adj {
                    if c != a
                        && !graph.is_adjacent_to(a, c)
                        && graph.endpoint(c, b) == Some(Endpoint::Circle)
                    {
                        graph.set_endpoint(c, b, Endpoint::Tail)?;
                        debug!(
                            b = graph.name_of(b),
                            c = graph.name_of(c),
                            "R7: single tail"
                        );
                        self.change_flag = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// Tries R8, R9, R10 in that order on every a o-> c edge.
    pub fn rules_r8_r9_r10(&mut self, graph: &mut MixedGraph) -> Result<(), SearchError> {
        let mut pd_cache: FxHashMap<(NodeId, NodeId, NodeId), bool> = FxHashMap::default();
        let nodes: Vec<NodeId> = graph.node_ids().collect();
        for c in nodes {
            if self.interrupted() {
                break;
            }
            for a in graph.nodes_into(c, Endpoint::Arrow) {
                if graph.endpoint(c, a) != Some(Endpoint::Circle) {
                    continue;
                }
                // We know a o-> c.
                if !self.rule_r8(a, c, graph)? {
                    if !self.rule_r9(a, c, graph, &mut pd_cache)? {
                        self.rule_r10(a, c, graph, &mut pd_cache)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// R8: a -> b -> c or a -o b -> c with a o-> c orients a -> c.
    pub fn rule_r8(
        &mut self,
        a: NodeId,
        c: NodeId,
        graph: &mut MixedGraph,
    ) -> Result<bool, SearchError> {
        if !is_partially_oriented(graph, a, c) {
            return Ok(false);
        }
        let common: Vec<NodeId> = graph
            .adjacent_nodes(a)
            .iter()
            .copied()
            .filter(|&b| graph.is_adjacent_to(b, c))
            .collect();
        for b in common {
            let tail_at_a = graph.endpoint(b, a) == Some(Endpoint::Tail);
            let b_to_c = graph.endpoint(c, b) == Some(Endpoint::Tail)
                && graph.endpoint(b, c) == Some(Endpoint::Arrow);
            let a_to_b = graph.endpoint(a, b) == Some(Endpoint::Arrow);
            let a_circle_b = graph.endpoint(a, b) == Some(Endpoint::Circle);
            if tail_at_a && b_to_c && (a_to_b || a_circle_b) {
                if self.would_close_cycle(graph, a, c) {
                    return Ok(false);
                }
                graph.set_endpoint(c, a, Endpoint::Tail)?;
                debug!(a = graph.name_of(a), c = graph.name_of(c), "R8");
                self.change_flag = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// R9: a o-> c with an uncovered potentially-directed path from a to
    /// c whose first interior node is nonadjacent to c orients a -> c.
    pub fn rule_r9(
        &mut self,
        a: NodeId,
        c: NodeId,
        graph: &mut MixedGraph,
        pd_cache: &mut FxHashMap<(NodeId, NodeId, NodeId), bool>,
    ) -> Result<bool, SearchError> {
        if !is_partially_oriented(graph, a, c) {
            return Ok(false);
        }
        let hops: Vec<NodeId> = graph.adjacent_nodes(a).to_vec();
        for hop in hops {
            if hop == c || graph.is_adjacent_to(hop, c) {
                continue;
            }
            if graph.endpoint(hop, a) == Some(Endpoint::Arrow) {
                continue;
            }
            if dfs_uncovered_pd(graph, a, hop, c, pd_cache, &mut FxHashSet::default()) {
                if self.would_close_cycle(graph, a, c) {
                    return Ok(false);
                }
                graph.set_endpoint(c, a, Endpoint::Tail)?;
                debug!(a = graph.name_of(a), c = graph.name_of(c), "R9");
                self.change_flag = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// R10: a o-> c with b -> c <- d and uncovered potentially-directed
    /// paths from a to b and to d whose first hops are distinct and
    /// nonadjacent orients a -> c.
    pub fn rule_r10(
        &mut self,
        a: NodeId,
        c: NodeId,
        graph: &mut MixedGraph,
        pd_cache: &mut FxHashMap<(NodeId, NodeId, NodeId), bool>,
    ) -> Result<(), SearchError> {
        if !is_partially_oriented(graph, a, c) {
            return Ok(());
        }
        let into: Vec<NodeId> = graph
            .nodes_into(c, Endpoint::Arrow)
            .into_iter()
            .filter(|&n| n != a)
            .collect();
        if into.len() < 2 {
            return Ok(());
        }
        let adj_a: Vec<NodeId> = graph.adjacent_nodes(a).to_vec();
        if adj_a.is_empty() {
            return Ok(());
        }

        for i in 0..into.len() {
            for j in i + 1..into.len() {
                let beta = into[i];
                let theta = into[j];
                if graph.endpoint(c, beta) != Some(Endpoint::Tail) {
                    continue;
                }
                if graph.endpoint(c, theta) != Some(Endpoint::Tail) {
                    continue;
                }

                let mut mu_candidates: SmallVec<[NodeId; 8]> = SmallVec::new();
                let mut omega_candidates: SmallVec<[NodeId; 8]> = SmallVec::new();
                for &hop in &adj_a {
                    if exists_uncovered_pd_via(graph, a, hop, beta, pd_cache) {
                        mu_candidates.push(hop);
                    }
                    if exists_uncovered_pd_via(graph, a, hop, theta, pd_cache) {
                        omega_candidates.push(hop);
                    }
                }
                for &mu in &mu_candidates {
                    for &omega in &omega_candidates {
                        if mu == omega || graph.is_adjacent_to(mu, omega) {
                            continue;
                        }
                        if self.would_close_cycle(graph, a, c) {
                            return Ok(());
                        }
                        graph.set_endpoint(c, a, Endpoint::Tail)?;
                        debug!(a = graph.name_of(a), c = graph.name_of(c), "R10");
                        self.change_flag = true;
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    fn would_close_cycle(&self, graph: &MixedGraph, from: NodeId, to: NodeId) -> bool {
        self.prevent_cycles && graph.exists_directed_path(to, from)
    }
}

fn is_partially_oriented(graph: &MixedGraph, a: NodeId, c: NodeId) -> bool {
    graph.endpoint(a, c) == Some(Endpoint::Arrow)
        && graph.endpoint(c, a) == Some(Endpoint::Circle)
}

/// An uncovered potentially-directed path that starts with the step
/// (alpha, hop) and ends at target. The trivial path alpha-hop counts
/// when hop is the target.
fn exists_uncovered_pd_via(
    graph: &MixedGraph,
    alpha: NodeId,
    hop: NodeId,
    target: NodeId,
    cache: &mut FxHashMap<(NodeId, NodeId, NodeId), bool>,
) -> bool {
    if graph.endpoint(hop, alpha) == Some(Endpoint::Arrow) {
        return false;
    }
    if hop == target {
        return true;
    }
    dfs_uncovered_pd(graph, alpha, hop, target, cache, &mut FxHashSet::default())
}

/// Memoized DFS for an uncovered potentially-directed path continuing
/// from (prev, curr) to target: each step must carry no arrowhead into
/// the current node, and each consecutive triple must be unshielded.
fn dfs_uncovered_pd(
    graph: &MixedGraph,
    prev: NodeId,
    curr: NodeId,
    target: NodeId,
    cache: &mut FxHashMap<(NodeId, NodeId, NodeId), bool>,
    visited_edges: &mut FxHashSet<(NodeId, NodeId)>,
) -> bool {
    let key = (prev, curr, target);
    if let Some(&memo) = cache.get(&key) {
        return memo;
    }
    if !visited_edges.insert((prev, curr)) {
        cache.insert(key, false);
        return false;
    }

    let mut found = false;
    let next_nodes: Vec<NodeId> = graph.adjacent_nodes(curr).to_vec();
    for next in next_nodes {
        if next == prev {
            continue;
        }
        if graph.endpoint(next, curr) == Some(Endpoint::Arrow) {
            continue;
        }
        if graph.is_adjacent_to(prev, next) {
            continue;
        }
        if next == target {
            found = true;
            break;
        }
        if dfs_uncovered_pd(graph, curr, next, target, cache, visited_edges) {
            found = true;
            break;
        }
    }

    visited_edges.remove(&(prev, curr));
    cache.insert(key, found);
    found
}

/// A DFS for an uncovered all-circle path from x to y, excluding the
/// direct edge. Returns the interior node sequence when one exists with
/// the R5 side conditions (first interior nonadjacent to y, last interior
/// nonadjacent to x).
fn uncovered_circle_path(graph: &MixedGraph, x: NodeId, y: NodeId) -> Option<Vec<NodeId>> {
    fn circle_circle(graph: &MixedGraph, a: NodeId, b: NodeId) -> bool {
        graph.edge(a, b).map(|e| e.is_nondirected()).unwrap_or(false)
    }

    fn dfs(
        graph: &MixedGraph,
        x: NodeId,
        y: NodeId,
        prev: NodeId,
        curr: NodeId,
        path: &mut Vec<NodeId>,
    ) -> bool {
        for &next in graph.adjacent_nodes(curr) {
            if next == prev || next == x || path.contains(&next) {
                continue;
            }
            if !circle_circle(graph, curr, next) {
                continue;
            }
            // Uncovered at curr.
            if graph.is_adjacent_to(prev, next) {
                continue;
            }
            if next == y {
                // Side conditions: the last interior node must be
                // nonadjacent to x.
                if !graph.is_adjacent_to(x, curr) {
                    return true;
                }
                continue;
            }
            path.push(next);
            if dfs(graph, x, y, curr, next, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    for &first in graph.adjacent_nodes(x) {
        if first == y || !circle_circle(graph, x, first) {
            continue;
        }
        // First interior must be nonadjacent to y.
        if graph.is_adjacent_to(first, y) {
            continue;
        }
        let mut path = vec![first];
        if dfs(graph, x, y, x, first, &mut path) {
            return Some(path);
        }
    }
    None
}
