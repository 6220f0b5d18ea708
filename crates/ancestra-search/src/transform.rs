//! Graph-to-PAG converters and the PAG-to-MAG transform.
//!
//! [`DagToPag`] builds the adjacency skeleton by pairwise inducing-path
//! tests over the measured nodes of a DAG (latents and selection implicit
//! in the node types), then runs the orientation engine with the DAG
//! oracle strategy. [`MagToPag`] skips skeleton construction and runs the
//! engine with the MAG oracle strategy. [`mag_from_pag`] completes a PAG
//! into its canonical MAG, which the legality checker round-trips.
//!
//! Conversion results can be memoized in a caller-owned [`PagCache`]:
//! lifetime and eviction are the caller's decision, and the cache is safe
//! to share across threads.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use ancestra_graph::{Endpoint, MixedGraph, NodeId, NodeType};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::errors::SearchError;
use crate::knowledge::Knowledge;
use crate::orient::FciOrient;
use crate::strategy::OracleStrategy;

/// A thread-safe, caller-owned memoization cache for graph-to-PAG
/// conversions, keyed by the structural identity of the input graph.
#[derive(Debug, Default)]
pub struct PagCache {
    inner: Mutex<FxHashMap<u64, Vec<(MixedGraph, MixedGraph)>>>,
}

impl PagCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn fingerprint(graph: &MixedGraph) -> u64 {
        let mut h = DefaultHasher::new();
        for n in graph.nodes() {
            n.name.as_ref().hash(&mut h);
            (n.node_type == NodeType::Measured).hash(&mut h);
            (n.node_type == NodeType::Latent).hash(&mut h);
        }
        let mut edges: Vec<_> = graph
            .edges()
            .iter()
            .map(|e| {
                let (a, b) = e.pair();
                let (ea, eb) = e.canonical_endpoints();
                (
                    graph.name_of(a).to_string(),
                    graph.name_of(b).to_string(),
                    ea,
                    eb,
                )
            })
            .collect();
        edges.sort();
        for (a, b, ea, eb) in edges {
            a.hash(&mut h);
            b.hash(&mut h);
            ea.symbol().hash(&mut h);
            eb.symbol().hash(&mut h);
        }
        h.finish()
    }

    /// The cached PAG for this input graph, if any.
    pub fn get(&self, input: &MixedGraph) -> Option<MixedGraph> {
        let key = Self::fingerprint(input);
        let inner = self.inner.lock().expect("cache lock");
        inner.get(&key).and_then(|bucket| {
            bucket
                .iter()
                .find(|(stored, _)| stored == input)
                .map(|(_, pag)| pag.clone())
        })
    }

    /// Stores a conversion result.
    pub fn insert(&self, input: &MixedGraph, pag: MixedGraph) {
        let key = Self::fingerprint(input);
        let mut inner = self.inner.lock().expect("cache lock");
        let bucket = inner.entry(key).or_default();
        if !bucket.iter().any(|(stored, _)| stored == input) {
            bucket.push((input.clone(), pag));
        }
    }

    /// Number of cached conversions.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("cache lock")
            .values()
            .map(|b| b.len())
            .sum()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Completes a PAG into its canonical MAG.
///
/// Partially oriented edges lose their circles toward the arrow (o-> to
/// ->, -o to ->), and the circle component is oriented into a DAG without
/// new unshielded colliders by repeatedly picking a simplicial vertex of
/// the remaining circle subgraph and directing its circle edges into it.
pub fn mag_from_pag(pag: &MixedGraph) -> Result<MixedGraph, SearchError> {
    let mut mag = pag.clone();

    // Resolve lone circles against fixed marks.
    let pairs: Vec<(NodeId, NodeId)> = mag.edges().iter().map(|e| (e.node1, e.node2)).collect();
    for (a, b) in &pairs {
        let (a, b) = (*a, *b);
        let at_b = mag.endpoint(a, b);
        let at_a = mag.endpoint(b, a);
        match (at_a, at_b) {
            (Some(Endpoint::Circle), Some(Endpoint::Arrow)) => {
                mag.set_endpoint(b, a, Endpoint::Tail)?;
            }
            (Some(Endpoint::Arrow), Some(Endpoint::Circle)) => {
                mag.set_endpoint(a, b, Endpoint::Tail)?;
            }
            (Some(Endpoint::Tail), Some(Endpoint::Circle)) => {
                mag.set_endpoint(a, b, Endpoint::Arrow)?;
            }
            (Some(Endpoint::Circle), Some(Endpoint::Tail)) => {
                mag.set_endpoint(b, a, Endpoint::Arrow)?;
            }
            _ => {}
        }
    }

    // Orient the o-o component without creating unshielded colliders.
    let mut remaining: FxHashSet<(NodeId, NodeId)> = mag
        .edges()
        .iter()
        .filter(|e| e.is_nondirected())
        .map(|e| e.pair())
        .collect();

    while !remaining.is_empty() {
        let circle_neighbors = |mag: &MixedGraph,
                                remaining: &FxHashSet<(NodeId, NodeId)>,
                                v: NodeId|
         -> Vec<NodeId> {
            mag.adjacent_nodes(v)
                .iter()
                .copied()
                .filter(|&u| {
                    let key = if u <= v { (u, v) } else { (v, u) };
                    remaining.contains(&key)
                })
                .collect()
        };

        // Prefer a simplicial vertex of the circle subgraph; fall back to
        // the first vertex with circle edges so malformed inputs still
        // terminate.
        let mut pick: Option<NodeId> = None;
        let mut fallback: Option<NodeId> = None;
        for v in mag.node_ids() {
            let nbrs = circle_neighbors(&mag, &remaining, v);
            if nbrs.is_empty() {
                continue;
            }
            if fallback.is_none() {
                fallback = Some(v);
            }
            let simplicial = nbrs
                .iter()
                .enumerate()
                .all(|(i, &u)| nbrs[i + 1..].iter().all(|&w| mag.is_adjacent_to(u, w)));
            if simplicial {
                pick = Some(v);
                break;
            }
        }
        let v = match pick.or(fallback) {
            Some(v) => v,
            None => break,
        };
        for u in circle_neighbors(&mag, &remaining, v) {
            mag.set_endpoint(v, u, Endpoint::Tail)?;
            mag.set_endpoint(u, v, Endpoint::Arrow)?;
            let key = if u <= v { (u, v) } else { (v, u) };
            remaining.remove(&key);
        }
    }

    Ok(mag)
}

/// Converts a DAG (possibly with latent and selection nodes) to the PAG
/// over its measured nodes.
pub struct DagToPag {
    dag: MixedGraph,
    knowledge: Knowledge,
    complete_rule_set_used: bool,
    max_discriminating_path_length: Option<usize>,
    cache: Option<Arc<PagCache>>,
}

impl DagToPag {
    /// Prepares a conversion of this DAG.
    pub fn new(dag: MixedGraph) -> Self {
        Self {
            dag,
            knowledge: Knowledge::new(),
            complete_rule_set_used: true,
            max_discriminating_path_length: None,
            cache: None,
        }
    }

    /// Sets background knowledge for the orientation phase.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    /// Selects the Zhang (true, default) or Spirtes (false) rule set.
    pub fn set_complete_rule_set_used(&mut self, complete: bool) {
        self.complete_rule_set_used = complete;
    }

    /// Bounds discriminating-path length in the R4 phase.
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

    /// Installs a shared conversion cache.
    pub fn set_cache(&mut self, cache: Arc<PagCache>) {
        self.cache = Some(cache);
    }

    /// Runs the conversion.
    pub fn convert(&self) -> Result<MixedGraph, SearchError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&self.dag) {
                return Ok(hit);
            }
        }
        info!("DAG -> PAG conversion");

        let selection: FxHashSet<NodeId> = self
            .dag
            .nodes()
            .iter()
            .filter(|n| n.node_type == NodeType::Selection)
            .map(|n| n.id)
            .collect();
        let measured = self.dag.measured_nodes();

        // Skeleton: an edge exactly where an inducing path exists.
        let mut pag = self.dag.empty_subgraph(&measured);
        for i in 0..measured.len() {
            for j in i + 1..measured.len() {
                let (x, y) = (measured[i], measured[j]);
                if self.dag.exists_inducing_path(x, y, &selection)? {
                    pag.add_nondirected_edge(x, y)?;
                }
            }
        }

        let mut strategy = OracleStrategy::dag_oracle(self.dag.clone());
        strategy.set_selection(selection);
        strategy.set_knowledge(self.knowledge.clone());
        let mut engine = FciOrient::new(Box::new(strategy));
        engine.set_complete_rule_set_used(self.complete_rule_set_used);
        engine.set_max_discriminating_path_length(self.max_discriminating_path_length)?;
        engine.orient(&mut pag)?;

        if let Some(cache) = &self.cache {
            cache.insert(&self.dag, pag.clone());
        }
        Ok(pag)
    }
}

/// Converts a MAG to its PAG.
pub struct MagToPag {
    mag: MixedGraph,
    knowledge: Knowledge,
    complete_rule_set_used: bool,
    max_discriminating_path_length: Option<usize>,
}

impl MagToPag {
    /// Prepares a conversion of this MAG.
    pub fn new(mag: MixedGraph) -> Self {
        Self {
            mag,
            knowledge: Knowledge::new(),
            complete_rule_set_used: true,
            max_discriminating_path_length: None,
        }
    }

    /// Sets background knowledge for the orientation phase.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    /// Selects the Zhang (true, default) or Spirtes (false) rule set.
    pub fn set_complete_rule_set_used(&mut self, complete: bool) {
        self.complete_rule_set_used = complete;
    }

    /// Runs the conversion: the MAG's own skeleton, reoriented to
    /// circles, under the engine with the MAG oracle strategy.
    pub fn convert(&self) -> Result<MixedGraph, SearchError> {
        info!("MAG -> PAG conversion");
        let mut pag = self.mag.clone();
        pag.reorient_all_with(Endpoint::Circle);

        let mut strategy = OracleStrategy::mag_oracle(self.mag.clone());
        strategy.set_knowledge(self.knowledge.clone());
        let mut engine = FciOrient::new(Box::new(strategy));
        engine.set_complete_rule_set_used(self.complete_rule_set_used);
        engine.set_max_discriminating_path_length(self.max_discriminating_path_length)?;
        engine.orient(&mut pag)?;
        Ok(pag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fully measured chain keeps exactly its own skeleton (every edge
    /// inducing-path-witnessed, no extras), and with no colliders and no
    /// latents every endpoint stays a circle: reversed chains are Markov
    /// equivalent.
    #[test]
    fn chain_dag_converts_to_circle_chain() {
        let mut dag = MixedGraph::new();
        let a = dag.add_measured_node("A").unwrap();
        let b = dag.add_measured_node("B").unwrap();
        let c = dag.add_measured_node("C").unwrap();
        let d = dag.add_measured_node("D").unwrap();
        dag.add_directed_edge(a, b).unwrap();
        dag.add_directed_edge(b, c).unwrap();
        dag.add_directed_edge(c, d).unwrap();

        let pag = DagToPag::new(dag.clone()).convert().unwrap();
        assert_eq!(pag.edge_count(), 3);
        for (x, y) in [(a, b), (b, c), (c, d)] {
            let e = pag.edge(x, y).expect("chain adjacency preserved");
            assert!(e.is_nondirected(), "got {}", pag.edge_string(e));
        }
        assert!(pag.edge(a, c).is_none());
        assert!(pag.edge(a, d).is_none());
    }

    /// A latent confounder leaves a bidirected edge between its measured
    /// children.
    #[test]
    fn latent_confounder_yields_bidirected_edge() {
        let mut dag = MixedGraph::new();
        let a = dag.add_measured_node("A").unwrap();
        let b = dag.add_measured_node("B").unwrap();
        let x = dag.add_measured_node("X").unwrap();
        let y = dag.add_measured_node("Y").unwrap();
        let l = dag.add_node("L", NodeType::Latent).unwrap();
        // a -> x <- L -> y <- b, L latent.
        dag.add_directed_edge(a, x).unwrap();
        dag.add_directed_edge(b, y).unwrap();
        dag.add_directed_edge(l, x).unwrap();
        dag.add_directed_edge(l, y).unwrap();

        let pag = DagToPag::new(dag).convert().unwrap();
        let e = pag.edge(x, y).expect("confounded pair stays adjacent");
        assert!(e.is_bidirected(), "got {}", pag.edge_string(e));
    }

    #[test]
    fn cache_returns_same_pag_without_recompute() {
        let mut dag = MixedGraph::new();
        let a = dag.add_measured_node("A").unwrap();
        let b = dag.add_measured_node("B").unwrap();
        dag.add_directed_edge(a, b).unwrap();

        let cache = Arc::new(PagCache::new());
        let mut conv = DagToPag::new(dag.clone());
        conv.set_cache(cache.clone());
        let p1 = conv.convert().unwrap();
        assert_eq!(cache.len(), 1);
        let p2 = conv.convert().unwrap();
        assert_eq!(p1, p2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn mag_from_pag_completes_circles() {
        // A o-o B o-o C (chordal circle component): the MAG has only
        // directed edges and no new unshielded collider.
        let mut pag = MixedGraph::new();
        let a = pag.add_measured_node("A").unwrap();
        let b = pag.add_measured_node("B").unwrap();
        let c = pag.add_measured_node("C").unwrap();
        pag.add_nondirected_edge(a, b).unwrap();
        pag.add_nondirected_edge(b, c).unwrap();

        let mag = mag_from_pag(&pag).unwrap();
        for e in mag.edges() {
            assert!(e.is_directed());
        }
        // No unshielded collider at b.
        assert!(!mag.is_def_collider(a, b, c));
    }
}
