//! # Mixed Graph
//!
//! The core graph structure shared by every algorithm in this workspace.
//! A [`MixedGraph`] holds nodes and at most one edge per unordered node
//! pair, with each edge end independently marked tail, arrow, or circle.
//!
//! ## Determinism
//!
//! Nodes, adjacency lists, and edges are all stored in insertion order and
//! iterated in that order. Orientation algorithms built on this graph are
//! therefore reproducible run to run; hash maps are used only as indexes,
//! never as iteration sources.
//!
//! ## Mutation model
//!
//! During orientation only endpoint marks change. Edges are added or
//! removed only in skeleton phases (adjacency search, possible-d-sep
//! removal), so edge removal may be O(|E|) without affecting the hot path.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::edge::Edge;
use crate::endpoint::Endpoint;
use crate::errors::GraphError;
use crate::node::{NodeData, NodeId, NodeType};

/// A mixed graph with typed edge endpoints.
///
/// Serialization (behind the `serde` feature) round-trips through a
/// nodes-plus-edges snapshot; the hash indexes and adjacency lists are
/// rebuilt on deserialization.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "GraphSnapshot", into = "GraphSnapshot"))]
pub struct MixedGraph {
    nodes: Vec<NodeData>,
    node_index: FxHashMap<NodeId, usize>,
    name_index: FxHashMap<Arc<str>, NodeId>,
    /// Insertion-ordered neighbor lists, one per node (indexed in parallel
    /// with `nodes`).
    adjacency: Vec<Vec<NodeId>>,
    edges: Vec<Edge>,
    edge_index: FxHashMap<(NodeId, NodeId), usize>,
    next_id: u32,
}

/// Serialized form of a [`MixedGraph`]: nodes and edges in insertion
/// order.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct GraphSnapshot {
    nodes: Vec<NodeData>,
    edges: Vec<Edge>,
}

#[cfg(feature = "serde")]
impl From<MixedGraph> for GraphSnapshot {
    fn from(g: MixedGraph) -> Self {
        Self {
            nodes: g.nodes,
            edges: g.edges,
        }
    }
}

#[cfg(feature = "serde")]
impl From<GraphSnapshot> for MixedGraph {
    fn from(s: GraphSnapshot) -> Self {
        let mut g = MixedGraph::new();
        for n in s.nodes {
            g.next_id = g.next_id.max(n.id.0 + 1);
            g.node_index.insert(n.id, g.nodes.len());
            g.name_index.insert(n.name.clone(), n.id);
            g.nodes.push(n);
            g.adjacency.push(Vec::new());
        }
        for e in s.edges {
            // A snapshot written by this crate is always well-formed.
            let _ = g.add_edge(e);
        }
        g
    }
}

impl MixedGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a measured node with the given name.
    pub fn add_measured_node(&mut self, name: &str) -> Result<NodeId, GraphError> {
        self.add_node(name, NodeType::Measured)
    }

    /// Adds a node, failing on duplicate names.
    pub fn add_node(&mut self, name: &str, node_type: NodeType) -> Result<NodeId, GraphError> {
        if self.name_index.contains_key(name) {
            return Err(GraphError::DuplicateNode(name.to_string()));
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let name: Arc<str> = Arc::from(name);
        self.node_index.insert(id, self.nodes.len());
        self.name_index.insert(name.clone(), id);
        self.nodes.push(NodeData {
            id,
            name,
            node_type,
        });
        self.adjacency.push(Vec::new());
        Ok(id)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Looks up a node id by name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// The display name of a node ("?" for unknown ids).
    pub fn name_of(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.name.as_ref()).unwrap_or("?")
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[NodeData] {
        &self.nodes
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// The measured node ids in insertion order.
    pub fn measured_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_measured())
            .map(|n| n.id)
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn canonical(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn require_node(&self, id: NodeId) -> Result<(), GraphError> {
        if self.node_index.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(format!("{:?}", id)))
        }
    }

    /// Adds an edge; fails on self-loops, unknown nodes, and duplicate
    /// pairs (a graph has at most one edge per unordered pair).
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        self.require_node(edge.node1)?;
        self.require_node(edge.node2)?;
        if edge.node1 == edge.node2 {
            return Err(GraphError::InvalidArgument(format!(
                "self-loop at {}",
                self.name_of(edge.node1)
            )));
        }
        let key = Self::canonical(edge.node1, edge.node2);
        if self.edge_index.contains_key(&key) {
            return Err(GraphError::DuplicateEdge(
                self.name_of(edge.node1).to_string(),
                self.name_of(edge.node2).to_string(),
            ));
        }
        self.edge_index.insert(key, self.edges.len());
        let i1 = self.node_index[&edge.node1];
        let i2 = self.node_index[&edge.node2];
        self.adjacency[i1].push(edge.node2);
        self.adjacency[i2].push(edge.node1);
        self.edges.push(edge);
        Ok(())
    }

    /// Adds x -> y.
    pub fn add_directed_edge(&mut self, x: NodeId, y: NodeId) -> Result<(), GraphError> {
        self.add_edge(Edge::directed(x, y))
    }

    /// Adds x <-> y.
    pub fn add_bidirected_edge(&mut self, x: NodeId, y: NodeId) -> Result<(), GraphError> {
        self.add_edge(Edge::bidirected(x, y))
    }

    /// Adds x --- y.
    pub fn add_undirected_edge(&mut self, x: NodeId, y: NodeId) -> Result<(), GraphError> {
        self.add_edge(Edge::undirected(x, y))
    }

    /// Adds x o-o y.
    pub fn add_nondirected_edge(&mut self, x: NodeId, y: NodeId) -> Result<(), GraphError> {
        self.add_edge(Edge::nondirected(x, y))
    }

    /// Removes the edge between x and y. Returns true if one was present.
    pub fn remove_edge(&mut self, x: NodeId, y: NodeId) -> bool {
        let key = Self::canonical(x, y);
        let Some(idx) = self.edge_index.remove(&key) else {
            return false;
        };
        self.edges.remove(idx);
        // Later edges shift down one slot.
        for stored in self.edge_index.values_mut() {
            if *stored > idx {
                *stored -= 1;
            }
        }
        if let Some(&i) = self.node_index.get(&x) {
            self.adjacency[i].retain(|&n| n != y);
        }
        if let Some(&i) = self.node_index.get(&y) {
            self.adjacency[i].retain(|&n| n != x);
        }
        true
    }

    /// The edge between x and y, if any.
    pub fn edge(&self, x: NodeId, y: NodeId) -> Option<&Edge> {
        let key = Self::canonical(x, y);
        self.edge_index.get(&key).map(|&i| &self.edges[i])
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True if x and y are adjacent.
    pub fn is_adjacent_to(&self, x: NodeId, y: NodeId) -> bool {
        self.edge_index
            .contains_key(&Self::canonical(x, y))
    }

    /// The neighbors of x in insertion order (empty for unknown nodes).
    pub fn adjacent_nodes(&self, x: NodeId) -> &[NodeId] {
        match self.node_index.get(&x) {
            Some(&i) => &self.adjacency[i],
            None => &[],
        }
    }

    /// The mark at `y` on the edge between x and y (the endpoint proximal
    /// to the *second* argument), or None if the pair is not adjacent.
    pub fn endpoint(&self, x: NodeId, y: NodeId) -> Option<Endpoint> {
        self.edge(x, y).and_then(|e| e.endpoint_at(y))
    }

    /// Sets the mark at `y` on the edge between x and y.
    pub fn set_endpoint(
        &mut self,
        x: NodeId,
        y: NodeId,
        endpoint: Endpoint,
    ) -> Result<(), GraphError> {
        let key = Self::canonical(x, y);
        let idx = *self.edge_index.get(&key).ok_or_else(|| {
            GraphError::InvalidArgument(format!(
                "no edge between {} and {}",
                self.name_of(x),
                self.name_of(y)
            ))
        })?;
        self.edges[idx].set_endpoint_at(y, endpoint);
        Ok(())
    }

    /// Sets every endpoint mark in the graph to `endpoint`.
    ///
    /// FCI's R0 starts from the circle-circle skeleton produced by calling
    /// this with [`Endpoint::Circle`].
    pub fn reorient_all_with(&mut self, endpoint: Endpoint) {
        for e in &mut self.edges {
            e.endpoint1 = endpoint;
            e.endpoint2 = endpoint;
        }
    }

    /// True if a *-> b <-* c: both edges present with arrowheads at b.
    ///
    /// The triple need not be unshielded; shielded definite colliders are
    /// meaningful to the inducing-path tests.
    pub fn is_def_collider(&self, a: NodeId, b: NodeId, c: NodeId) -> bool {
        self.endpoint(a, b) == Some(Endpoint::Arrow) && self.endpoint(c, b) == Some(Endpoint::Arrow)
    }

    /// The neighbors x of y whose edge carries `endpoint` at y, in
    /// insertion order.
    pub fn nodes_into(&self, y: NodeId, endpoint: Endpoint) -> Vec<NodeId> {
        self.adjacent_nodes(y)
            .iter()
            .copied()
            .filter(|&x| self.endpoint(x, y) == Some(endpoint))
            .collect()
    }

    /// True if x -> y (tail at x, arrowhead at y).
    pub fn is_parent_of(&self, x: NodeId, y: NodeId) -> bool {
        match self.edge(x, y) {
            Some(e) => {
                e.endpoint_at(x) == Some(Endpoint::Tail) && e.endpoint_at(y) == Some(Endpoint::Arrow)
            }
            None => false,
        }
    }

    /// The parents of y in insertion order.
    pub fn parents(&self, y: NodeId) -> Vec<NodeId> {
        self.adjacent_nodes(y)
            .iter()
            .copied()
            .filter(|&x| self.is_parent_of(x, y))
            .collect()
    }

    /// The children of x in insertion order.
    pub fn children(&self, x: NodeId) -> Vec<NodeId> {
        self.adjacent_nodes(x)
            .iter()
            .copied()
            .filter(|&y| self.is_parent_of(x, y))
            .collect()
    }

    /// True if x and y are connected by a bidirected edge (spouses).
    pub fn is_spouse_of(&self, x: NodeId, y: NodeId) -> bool {
        self.edge(x, y).map(|e| e.is_bidirected()).unwrap_or(false)
    }

    /// Renders an edge as e.g. "X o-> Y" using node names.
    pub fn edge_string(&self, e: &Edge) -> String {
        format!(
            "{} {}-{} {}",
            self.name_of(e.node1),
            // The mark at node1 is drawn mirrored on the left side.
            match e.endpoint1 {
                Endpoint::Tail => "-",
                Endpoint::Arrow => "<",
                Endpoint::Circle => "o",
            },
            e.endpoint2.symbol(),
            self.name_of(e.node2)
        )
    }

    /// Builds a graph with the same nodes (ids preserved) and no edges.
    pub fn empty_copy(&self) -> MixedGraph {
        MixedGraph {
            nodes: self.nodes.clone(),
            node_index: self.node_index.clone(),
            name_index: self.name_index.clone(),
            adjacency: vec![Vec::new(); self.nodes.len()],
            edges: Vec::new(),
            edge_index: FxHashMap::default(),
            next_id: self.next_id,
        }
    }

    /// Builds a graph over a subset of this graph's nodes (ids preserved),
    /// with no edges.
    pub fn empty_subgraph(&self, keep: &[NodeId]) -> MixedGraph {
        let mut g = MixedGraph::new();
        g.next_id = self.next_id;
        for node in &self.nodes {
            if keep.contains(&node.id) {
                g.node_index.insert(node.id, g.nodes.len());
                g.name_index.insert(node.name.clone(), node.id);
                g.nodes.push(node.clone());
                g.adjacency.push(Vec::new());
            }
        }
        g
    }
}

impl PartialEq for MixedGraph {
    /// Two graphs are equal when they have the same named/typed nodes and
    /// the same endpoint assignment on every unordered pair.
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }
        for n in &self.nodes {
            match other.node(n.id) {
                Some(m) if m.name == n.name && m.node_type == n.node_type => {}
                _ => return false,
            }
        }
        for e in &self.edges {
            match other.edge(e.node1, e.node2) {
                Some(o) => {
                    if o.pair() != e.pair() || o.canonical_endpoints() != e.canonical_endpoints() {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

impl Eq for MixedGraph {}
