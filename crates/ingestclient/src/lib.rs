//! HTTP client layer for the workflow service
//!
//! Translates graph snapshots into workflow resources on the remote service
//! and drives the run/poll lifecycle of executions. The local view of an
//! execution is always a possibly-stale read replica of the server's record.

mod api;
mod error;
mod session;
mod tracker;
mod types;

pub use api::ApiClient;
pub use error::ClientError;
pub use session::WorkflowSession;
pub use tracker::{ExecutionHandle, ExecutionTracker, PollConfig, TrackerEvent, TrackerState};
pub use types::{
    ExecutionReport, ExecutionState, SaveWorkflowRequest, StartExecutionResponse, UploadResponse,
    WorkflowResource,
};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
