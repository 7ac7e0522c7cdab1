use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    UnknownEndpoint(String),

    #[error("Self-loop rejected on node: {0}")]
    SelfLoop(String),

    #[error("Duplicate edge: {src} -> {target}")]
    DuplicateEdge { src: String, target: String },

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Cyclic graph")]
    CyclicGraph,

    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    #[error("Unknown field '{field}' for kind '{kind}'")]
    UnknownField { kind: String, field: String },
}
