//! Core model for the workflow-graph editor
//!
//! This crate holds the authoritative in-memory graph for an editing session,
//! the node-type registry, and the configuration form engine. It performs no
//! network I/O; persistence and execution live in `ingestclient`.

mod command;
mod error;
mod form;
mod graph;
mod registry;

pub use command::NodeCommand;
pub use error::GraphError;
pub use form::{FieldSpec, FormDraft, InputKind, VisibilityRule};
pub use graph::{Edge, EdgeId, GraphModel, GraphSnapshot, Node, NodeId, NodeKind, Position};
pub use registry::{NodeTypeDef, NodeTypeRegistry};

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
