use crate::types::{
    ExecutionReport, SaveWorkflowRequest, StartExecutionResponse, UploadResponse, WorkflowResource,
};
use crate::ClientError;

/// HTTP client for the workflow service
///
/// All paths live under a fixed `/api` prefix relative to the configured
/// base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base).map_err(|_| ClientError::InvalidBaseUrl(base.clone()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    pub async fn create_workflow(
        &self,
        request: &SaveWorkflowRequest,
    ) -> Result<WorkflowResource, ClientError> {
        tracing::info!(name = %request.name, "creating workflow");
        let response = self
            .http
            .post(self.url("/workflows"))
            .json(request)
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }

    pub async fn update_workflow(
        &self,
        workflow_id: &str,
        request: &SaveWorkflowRequest,
    ) -> Result<WorkflowResource, ClientError> {
        tracing::info!(workflow = workflow_id, "updating workflow");
        let response = self
            .http
            .put(self.url(&format!("/workflows/{workflow_id}")))
            .json(request)
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }

    pub async fn list_workflows(&self) -> Result<Vec<WorkflowResource>, ClientError> {
        let response = self
            .http
            .get(self.url("/workflows"))
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }

    pub async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowResource, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/workflows/{workflow_id}")))
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }

    pub async fn start_execution(
        &self,
        workflow_id: &str,
    ) -> Result<StartExecutionResponse, ClientError> {
        tracing::info!(workflow = workflow_id, "starting execution");
        let response = self
            .http
            .post(self.url(&format!("/workflows/{workflow_id}/execute")))
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }

    pub async fn get_execution(&self, execution_id: &str) -> Result<ExecutionReport, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/executions/{execution_id}")))
            .send()
            .await
            .map_err(ClientError::poll)?
            .error_for_status()
            .map_err(ClientError::poll)?;

        response.json().await.map_err(ClientError::poll)
    }

    /// Upload a document for a data-source node
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        tracing::info!(filename, "uploading document");
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::persistence)?
            .error_for_status()
            .map_err(ClientError::persistence)?;

        response.json().await.map_err(ClientError::persistence)
    }
}
