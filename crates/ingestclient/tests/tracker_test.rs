use ingestclient::{
    ApiClient, ClientError, ExecutionTracker, PollConfig, TrackerEvent, TrackerState,
    WorkflowSession,
};
use ingestcore::{GraphModel, Position};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_poll() -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_millis(10),
        interval: Duration::from_millis(10),
        max_polls: 50,
        max_poll_failures: 3,
    }
}

fn execution_json(
    id: &str,
    status: &str,
    progress: u8,
    results: Option<serde_json::Value>,
    error: Option<&str>,
) -> serde_json::Value {
    json!({
        "id": id,
        "workflow_id": "wf-001",
        "status": status,
        "progress": progress,
        "results": results,
        "error_message": error,
    })
}

async fn tracker_for(server: &MockServer) -> ExecutionTracker {
    let api = Arc::new(ApiClient::new(&server.uri()).unwrap());
    ExecutionTracker::with_config(api, fast_poll())
}

async fn mount_start(server: &MockServer, execution_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/workflows/wf-001/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "execution_id": execution_id,
            "status": "started"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_execution_gating_without_saved_workflow() {
    let server = MockServer::start().await;

    // No request of any kind may be issued
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let tracker = tracker_for(&server).await;
    let err = tracker.start(None).await.unwrap_err();

    assert!(matches!(err, ClientError::NoWorkflow));
    assert!(matches!(tracker.state().await, TrackerState::Idle));
}

#[tokio::test]
async fn test_save_then_execute_scenario() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-001",
            "name": "wf-A",
            "description": "desc",
            "nodes": [
                {"id": "1", "type": "data-source", "position": {"x": 0.0, "y": 0.0}, "data": {}},
                {"id": "2", "type": "connector", "position": {"x": 100.0, "y": 0.0}, "data": {}}
            ],
            "edges": [{"id": "e1", "source": "1", "target": "2"}]
        })))
        .mount(&server)
        .await;
    mount_start(&server, "ex-1").await;

    // First poll: running at 40%; afterwards: completed at 100%
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "running", 40, None, None,
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1",
            "completed",
            100,
            Some(json!({"texts_processed": 12})),
            None,
        )))
        .mount(&server)
        .await;

    let api = Arc::new(ApiClient::new(&server.uri()).unwrap());
    let mut session = WorkflowSession::new(api.clone());
    let tracker = ExecutionTracker::with_config(api, fast_poll());
    let mut events = tracker.subscribe();

    let mut graph = GraphModel::new();
    let a = graph.add_node("data-source", Position::new(0.0, 0.0));
    let b = graph.add_node("connector", Position::new(100.0, 0.0));
    graph.add_edge(&a, &b).unwrap();

    session.save("wf-A", "desc", graph.snapshot()).await.unwrap();

    let mut handle = tracker.start(session.workflow_id()).await.unwrap();
    assert_eq!(handle.execution_id, "ex-1");

    let terminal = handle.wait().await;
    match terminal {
        TrackerState::Completed { execution_id, results } => {
            assert_eq!(execution_id, "ex-1");
            assert_eq!(results, Some(json!({"texts_processed": 12})));
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    // The running poll surfaced progress before the terminal event
    let mut saw_progress_40 = false;
    while let Ok(event) = events.try_recv() {
        if let TrackerEvent::Progress { progress: 40, .. } = event {
            saw_progress_40 = true;
        }
    }
    assert!(saw_progress_40, "tracker must expose intermediate progress");
}

#[tokio::test]
async fn test_terminal_absorption_stops_polling() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "completed", 100, None, None,
        )))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let mut handle = tracker.start(Some("wf-001")).await.unwrap();
    handle.wait().await;

    let polls_at_completion = poll_count(&server).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        poll_count(&server).await,
        polls_at_completion,
        "no further polls may be issued after a terminal status"
    );
    assert_eq!(polls_at_completion, 1);
}

#[tokio::test]
async fn test_pending_status_keeps_polling() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    // Backend creates records as pending before flipping them to running
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "pending", 0, None, None,
        )))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "completed", 100, None, None,
        )))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let mut handle = tracker.start(Some("wf-001")).await.unwrap();

    assert!(matches!(handle.wait().await, TrackerState::Completed { .. }));
    assert_eq!(poll_count(&server).await, 3);
}

#[tokio::test]
async fn test_remote_failure_surfaces_error_message() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1",
            "failed",
            50,
            None,
            Some("Workflow not found"),
        )))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let mut handle = tracker.start(Some("wf-001")).await.unwrap();

    match handle.wait().await {
        TrackerState::Failed { error_message, .. } => {
            assert_eq!(error_message, "Workflow not found");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_poll_failure_is_bounded_and_distinct_from_remote_failed() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let mut handle = tracker.start(Some("wf-001")).await.unwrap();

    match handle.wait().await {
        TrackerState::PollFailed { .. } => {}
        other => panic!("expected PollFailed, got {other:?}"),
    }
    assert_eq!(
        poll_count(&server).await,
        3,
        "tracker retries transient failures a bounded number of times"
    );
}

#[tokio::test]
async fn test_transient_poll_failure_recovers() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    // Two transient failures, under the retry bound, then success
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "completed", 100, None, None,
        )))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let mut handle = tracker.start(Some("wf-001")).await.unwrap();

    assert!(matches!(handle.wait().await, TrackerState::Completed { .. }));
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let server = MockServer::start().await;
    mount_start(&server, "ex-1").await;

    Mock::given(method("GET"))
        .and(path("/api/executions/ex-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
            "ex-1", "running", 10, None, None,
        )))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server).await;
    let handle = tracker.start(Some("wf-001")).await.unwrap();

    let err = tracker.start(Some("wf-001")).await.unwrap_err();
    assert!(matches!(err, ClientError::ExecutionInFlight(id) if id == "ex-1"));

    handle.abandon();
}

#[tokio::test]
async fn test_restart_after_terminal_begins_new_execution() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/workflows/wf-001/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "execution_id": "ex-1", "status": "started"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/workflows/wf-001/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "execution_id": "ex-2", "status": "started"
        })))
        .mount(&server)
        .await;

    for id in ["ex-1", "ex-2"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/executions/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(execution_json(
                id, "completed", 100, None, None,
            )))
            .mount(&server)
            .await;
    }

    let tracker = tracker_for(&server).await;
    let mut first = tracker.start(Some("wf-001")).await.unwrap();
    first.wait().await;

    let mut second = tracker.start(Some("wf-001")).await.unwrap();
    assert_eq!(second.execution_id, "ex-2");
    assert!(matches!(second.wait().await, TrackerState::Completed { .. }));
}

async fn poll_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with("/api/executions/"))
        .count()
}
