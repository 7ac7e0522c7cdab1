use crate::{GraphError, NodeCommand};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub type NodeId = String;
pub type EdgeId = String;

/// Node kind is registry data, not a closed enum; alternative kind sets can
/// be registered without touching this crate.
pub type NodeKind = String;

/// Canvas coordinate of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A single pipeline stage in the workflow graph
///
/// Serialized field names match the backend contract: `type` for the kind
/// and `data` for the configuration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    #[serde(rename = "data", default)]
    pub config: HashMap<String, Value>,
}

/// Directed connection: `source` produces data consumed by `target`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Immutable copy of the graph for persistence. Pure data: node configs are
/// JSON values, never callbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Authoritative in-memory graph for one editing session
///
/// Every mutation is synchronous and in-memory; nothing here touches the
/// network. Patch operations tolerate absent ids (out-of-order UI events)
/// and report whether they applied.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from a persisted snapshot.
    ///
    /// Rejects duplicate node/edge ids and edges whose endpoints are missing.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut node_ids = HashSet::new();
        for node in &snapshot.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateId(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &snapshot.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::DuplicateId(edge.id.clone()));
            }
            if !node_ids.contains(edge.source.as_str()) {
                return Err(GraphError::UnknownEndpoint(edge.source.clone()));
            }
            if !node_ids.contains(edge.target.as_str()) {
                return Err(GraphError::UnknownEndpoint(edge.target.clone()));
            }
        }

        Ok(Self {
            nodes: snapshot.nodes,
            edges: snapshot.edges,
        })
    }

    /// Add a node with a fresh id and empty configuration. Always succeeds;
    /// non-finite coordinates are clamped to the origin.
    pub fn add_node(&mut self, kind: impl Into<NodeKind>, position: Position) -> NodeId {
        let position = if position.is_finite() {
            position
        } else {
            tracing::warn!("non-finite node position clamped to origin");
            Position::new(0.0, 0.0)
        };

        let node = Node {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            position,
            config: HashMap::new(),
        };
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Remove a node and every edge referencing it. No-op when absent.
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| e.source != id && e.target != id);
    }

    /// Move a node. Returns whether a node was patched; non-finite
    /// coordinates are dropped.
    pub fn patch_node_position(&mut self, id: &str, position: Position) -> bool {
        if !position.is_finite() {
            tracing::warn!(node = id, "ignoring non-finite position patch");
            return false;
        }
        match self.find_node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Shallow-merge a partial configuration into a node. Returns whether a
    /// node was patched.
    pub fn patch_node_config(&mut self, id: &str, partial: HashMap<String, Value>) -> bool {
        match self.find_node_mut(id) {
            Some(node) => {
                node.config.extend(partial);
                true
            }
            None => false,
        }
    }

    /// Connect two existing nodes. Self-loops and duplicate ordered pairs
    /// are rejected.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<EdgeId, GraphError> {
        if self.find_node(source).is_none() {
            return Err(GraphError::UnknownEndpoint(source.to_string()));
        }
        if self.find_node(target).is_none() {
            return Err(GraphError::UnknownEndpoint(target.to_string()));
        }
        if source == target {
            return Err(GraphError::SelfLoop(source.to_string()));
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return Err(GraphError::DuplicateEdge {
                src: source.to_string(),
                target: target.to_string(),
            });
        }

        let edge = Edge {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    /// Remove an edge by id. No-op when absent.
    pub fn remove_edge(&mut self, id: &str) {
        self.edges.retain(|e| e.id != id);
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Immutable copy of the current graph for persistence
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Structural validation: every edge endpoint must exist and the graph
    /// must be acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut index_of = HashMap::new();

        for node in &self.nodes {
            let idx = graph.add_node(node.id.as_str());
            index_of.insert(node.id.as_str(), idx);
        }

        for edge in &self.edges {
            let from = index_of
                .get(edge.source.as_str())
                .ok_or_else(|| GraphError::UnknownEndpoint(edge.source.clone()))?;
            let to = index_of
                .get(edge.target.as_str())
                .ok_or_else(|| GraphError::UnknownEndpoint(edge.target.clone()))?;
            graph.add_edge(*from, *to, ());
        }

        if toposort(&graph, None).is_err() {
            return Err(GraphError::CyclicGraph);
        }

        Ok(())
    }

    /// Apply a node-level command. Returns whether the target node existed.
    ///
    /// Node actions travel as data carrying the node id instead of being
    /// stored inside node config, so snapshots stay serializable.
    pub fn apply(&mut self, command: NodeCommand) -> bool {
        match command {
            NodeCommand::AttachUpload {
                node_id,
                file_id,
                filename,
                file_path,
                file_type,
            } => {
                let patch = HashMap::from([
                    ("file_id".to_string(), Value::String(file_id)),
                    ("filename".to_string(), Value::String(filename)),
                    ("file_path".to_string(), Value::String(file_path)),
                    ("file_type".to_string(), Value::String(file_type)),
                    (
                        "source_type".to_string(),
                        Value::String("upload".to_string()),
                    ),
                ]);
                self.patch_node_config(&node_id, patch)
            }
            NodeCommand::SetStrategy { node_id, strategy } => self.patch_node_config(
                &node_id,
                HashMap::from([("strategy".to_string(), Value::String(strategy))]),
            ),
            NodeCommand::PatchConfig { node_id, patch } => self.patch_node_config(&node_id, patch),
        }
    }
}
