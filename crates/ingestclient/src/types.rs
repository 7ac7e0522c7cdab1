use chrono::{DateTime, Utc};
use ingestcore::{Edge, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create/update payload: always a full snapshot of the graph, never a diff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Workflow as persisted by the remote service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartExecutionResponse {
    pub execution_id: String,
    #[serde(default)]
    pub status: String,
}

/// Remote execution status automaton. The service creates records as
/// `pending` before its background task flips them to `running`; both are
/// non-terminal. `completed` and `failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Completed | ExecutionState::Failed)
    }
}

/// Polled execution record. `results` is opaque pass-through data.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionReport {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionState,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Bookkeeping returned by the document upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub file_path: String,
    pub file_type: String,
    #[serde(default)]
    pub size: u64,
}
