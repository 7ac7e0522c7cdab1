use crate::types::ExecutionState;
use crate::{ApiClient, ClientError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;

/// Polling parameters for the tracker
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first poll after a successful start
    pub initial_delay: Duration,
    /// Fixed interval between polls; no backoff
    pub interval: Duration,
    /// Hard bound on the number of polls per execution
    pub max_polls: u32,
    /// Consecutive transient poll failures tolerated before giving up
    pub max_poll_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            interval: Duration::from_millis(1500),
            max_polls: 400,
            max_poll_failures: 3,
        }
    }
}

/// Locally observed execution state
///
/// `PollFailed` means this client lost track of the execution; the remote
/// run may still be in flight. It is distinct from the remote `Failed`.
#[derive(Debug, Clone)]
pub enum TrackerState {
    Idle,
    Running {
        execution_id: String,
        progress: u8,
    },
    Completed {
        execution_id: String,
        results: Option<Value>,
    },
    Failed {
        execution_id: String,
        error_message: String,
    },
    PollFailed {
        execution_id: String,
        error: String,
    },
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TrackerState::Idle | TrackerState::Running { .. })
    }
}

/// Events emitted while tracking an execution
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    Started {
        execution_id: String,
    },
    Progress {
        execution_id: String,
        progress: u8,
    },
    Completed {
        execution_id: String,
        results: Option<Value>,
    },
    Failed {
        execution_id: String,
        error_message: String,
    },
    PollAborted {
        execution_id: String,
        error: String,
    },
}

/// Handle to one tracked execution
///
/// Dropping the handle does not stop the poll loop; `abandon` does. A new
/// `start` on the tracker also invalidates this handle's loop.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    pub execution_id: String,
    state: watch::Receiver<TrackerState>,
    cancel: CancellationToken,
}

impl ExecutionHandle {
    pub fn state(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    /// Stop polling without waiting for a terminal status
    pub fn abandon(&self) {
        self.cancel.cancel();
    }

    /// Wait until the execution reaches a terminal local state
    pub async fn wait(&mut self) -> TrackerState {
        loop {
            let state = self.state.borrow_and_update().clone();
            if state.is_terminal() {
                return state;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}

/// Drives the run/poll/terminate lifecycle for one execution at a time
pub struct ExecutionTracker {
    api: Arc<ApiClient>,
    config: PollConfig,
    events: broadcast::Sender<TrackerEvent>,
    current: Mutex<Option<ExecutionHandle>>,
}

impl ExecutionTracker {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_config(api, PollConfig::default())
    }

    pub fn with_config(api: Arc<ApiClient>, config: PollConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            config,
            events,
            current: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Start executing a persisted workflow and begin polling its status.
    ///
    /// Fails with `NoWorkflow` before any network call when no workflow id
    /// exists, and with `ExecutionInFlight` while a previous execution is
    /// still being tracked.
    pub async fn start(
        &self,
        workflow_id: Option<&str>,
    ) -> Result<ExecutionHandle, ClientError> {
        let workflow_id = workflow_id.ok_or(ClientError::NoWorkflow)?;

        let mut current = self.current.lock().await;
        if let Some(previous) = current.as_ref() {
            if !previous.state().is_terminal() && !previous.cancel.is_cancelled() {
                return Err(ClientError::ExecutionInFlight(
                    previous.execution_id.clone(),
                ));
            }
            // Invalidate any still-scheduled poll of the finished execution
            // so a stale result cannot race the new one.
            previous.cancel.cancel();
        }

        let started = self.api.start_execution(workflow_id).await?;
        let execution_id = started.execution_id;
        tracing::info!(execution = %execution_id, workflow = workflow_id, "execution started");

        let (state_tx, state_rx) = watch::channel(TrackerState::Running {
            execution_id: execution_id.clone(),
            progress: 0,
        });
        let cancel = CancellationToken::new();

        let _ = self.events.send(TrackerEvent::Started {
            execution_id: execution_id.clone(),
        });

        tokio::spawn(poll_loop(
            self.api.clone(),
            self.config.clone(),
            execution_id.clone(),
            state_tx,
            cancel.clone(),
            self.events.clone(),
        ));

        let handle = ExecutionHandle {
            execution_id,
            state: state_rx,
            cancel,
        };
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Local state of the most recent execution, `Idle` if none started
    pub async fn state(&self) -> TrackerState {
        match self.current.lock().await.as_ref() {
            Some(handle) => handle.state(),
            None => TrackerState::Idle,
        }
    }
}

async fn poll_loop(
    api: Arc<ApiClient>,
    config: PollConfig,
    execution_id: String,
    state: watch::Sender<TrackerState>,
    cancel: CancellationToken,
    events: broadcast::Sender<TrackerEvent>,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(config.initial_delay) => {}
    }

    let mut failures = 0u32;
    for _ in 0..config.max_polls {
        if cancel.is_cancelled() {
            return;
        }

        match api.get_execution(&execution_id).await {
            Ok(report) => {
                failures = 0;
                // The token may have been cancelled while the request was in
                // flight; a stale result must not contaminate a newer run.
                if cancel.is_cancelled() {
                    return;
                }
                match report.status {
                    ExecutionState::Pending | ExecutionState::Running => {
                        tracing::debug!(execution = %execution_id, progress = report.progress, "still running");
                        state.send_replace(TrackerState::Running {
                            execution_id: execution_id.clone(),
                            progress: report.progress,
                        });
                        let _ = events.send(TrackerEvent::Progress {
                            execution_id: execution_id.clone(),
                            progress: report.progress,
                        });
                    }
                    ExecutionState::Completed => {
                        tracing::info!(execution = %execution_id, "execution completed");
                        state.send_replace(TrackerState::Completed {
                            execution_id: execution_id.clone(),
                            results: report.results.clone(),
                        });
                        let _ = events.send(TrackerEvent::Completed {
                            execution_id,
                            results: report.results,
                        });
                        return;
                    }
                    ExecutionState::Failed => {
                        let error_message = report
                            .error_message
                            .unwrap_or_else(|| "execution failed".to_string());
                        tracing::warn!(execution = %execution_id, error = %error_message, "execution failed");
                        state.send_replace(TrackerState::Failed {
                            execution_id: execution_id.clone(),
                            error_message: error_message.clone(),
                        });
                        let _ = events.send(TrackerEvent::Failed {
                            execution_id,
                            error_message,
                        });
                        return;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(execution = %execution_id, failures, "poll failed: {e}");
                if failures >= config.max_poll_failures {
                    let error = e.to_string();
                    state.send_replace(TrackerState::PollFailed {
                        execution_id: execution_id.clone(),
                        error: error.clone(),
                    });
                    let _ = events.send(TrackerEvent::PollAborted {
                        execution_id,
                        error,
                    });
                    return;
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.interval) => {}
        }
    }

    // Poll limit reached without a terminal status
    let error = format!("gave up after {} polls", config.max_polls);
    tracing::warn!(execution = %execution_id, "{error}");
    state.send_replace(TrackerState::PollFailed {
        execution_id: execution_id.clone(),
        error: error.clone(),
    });
    let _ = events.send(TrackerEvent::PollAborted {
        execution_id,
        error,
    });
}
