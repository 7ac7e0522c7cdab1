use crate::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Node-level action dispatched to the graph model
///
/// Commands are plain data so they can be logged, replayed, or queued; the
/// graph model is the single handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum NodeCommand {
    /// Bind an uploaded file to a data-source node
    AttachUpload {
        node_id: NodeId,
        file_id: String,
        filename: String,
        file_path: String,
        file_type: String,
    },

    /// Change the partition strategy of a data-source node
    SetStrategy { node_id: NodeId, strategy: String },

    /// Generic configuration merge
    PatchConfig {
        node_id: NodeId,
        patch: HashMap<String, Value>,
    },
}
