use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No saved workflow; save the workflow before executing")]
    NoWorkflow,

    #[error("Execution already in flight: {0}")]
    ExecutionInFlight(String),

    #[error("Persistence call failed: {source}")]
    Persistence {
        #[source]
        source: reqwest::Error,
    },

    #[error("Status poll failed: {source}")]
    Poll {
        #[source]
        source: reqwest::Error,
    },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    pub(crate) fn persistence(source: reqwest::Error) -> Self {
        Self::Persistence { source }
    }

    pub(crate) fn poll(source: reqwest::Error) -> Self {
        Self::Poll { source }
    }
}
