use crate::types::{SaveWorkflowRequest, WorkflowResource};
use crate::{ApiClient, ClientError};
use ingestcore::GraphSnapshot;
use std::sync::Arc;

/// Binds an editing session to "the current workflow" on the service
///
/// The first successful save creates the resource; later saves update it in
/// place, so Save is idempotent. A failed save leaves the previous binding
/// untouched and can simply be retried.
#[derive(Debug)]
pub struct WorkflowSession {
    api: Arc<ApiClient>,
    current: Option<WorkflowResource>,
}

impl WorkflowSession {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, current: None }
    }

    /// Persist a full graph snapshot under the session's workflow
    pub async fn save(
        &mut self,
        name: &str,
        description: &str,
        snapshot: GraphSnapshot,
    ) -> Result<&WorkflowResource, ClientError> {
        let request = SaveWorkflowRequest {
            name: name.to_string(),
            description: description.to_string(),
            nodes: snapshot.nodes,
            edges: snapshot.edges,
        };

        let saved = match self.current.as_ref() {
            Some(existing) => self.api.update_workflow(&existing.id, &request).await?,
            None => self.api.create_workflow(&request).await?,
        };

        tracing::info!(workflow = %saved.id, "workflow saved");
        Ok(self.current.insert(saved))
    }

    /// Id of the bound workflow, if any save has succeeded
    pub fn workflow_id(&self) -> Option<&str> {
        self.current.as_ref().map(|w| w.id.as_str())
    }

    pub fn current(&self) -> Option<&WorkflowResource> {
        self.current.as_ref()
    }

    /// Bind to a previously saved workflow (history panel selection)
    pub async fn open(&mut self, workflow_id: &str) -> Result<&WorkflowResource, ClientError> {
        let workflow = self.api.get_workflow(workflow_id).await?;
        Ok(self.current.insert(workflow))
    }

    /// All previously saved workflows, for history views
    pub async fn list(&self) -> Result<Vec<WorkflowResource>, ClientError> {
        self.api.list_workflows().await
    }
}
