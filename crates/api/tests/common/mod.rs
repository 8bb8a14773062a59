#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use jobwire_api::config::ServerConfig;
use jobwire_api::router::build_app_router;
use jobwire_api::state::AppState;
use jobwire_broker::{Backend, MemoryBroker};
use jobwire_ops::OperationRegistry;
use jobwire_worker::{BrokerConfig, PoolConfig, WorkerPool};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        max_body_bytes: 4 * 1024 * 1024,
        broker: BrokerConfig {
            url: "memory://".to_string(),
            result_expires: Duration::from_secs(3600),
        },
        pool: PoolConfig {
            slots: 2,
            poll_interval: Duration::from_millis(20),
            retry_backoff: Duration::from_millis(20),
        },
    }
}

pub fn memory_backend() -> Backend {
    let memory = Arc::new(MemoryBroker::new(Duration::from_secs(3600)));
    Backend {
        broker: memory.clone(),
        store: memory,
        in_process: true,
    }
}

/// Build the full application router over an in-memory backend with no
/// workers running. Submitted jobs stay `PENDING`.
pub fn build_test_app() -> (Router, Backend) {
    let backend = memory_backend();
    (build_app_with(&backend), backend)
}

pub fn build_app_with(backend: &Backend) -> Router {
    let config = test_config();
    let state = AppState::new(config.clone(), backend);
    build_app_router(state, &config)
}

/// Running worker pool; stops when dropped.
pub struct TestWorkers {
    cancel: CancellationToken,
}

impl Drop for TestWorkers {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a worker pool consuming from `backend`.
pub fn start_workers(backend: &Backend) -> TestWorkers {
    let pool = WorkerPool::new(
        Arc::clone(&backend.broker),
        Arc::clone(&backend.store),
        Arc::new(OperationRegistry::standard()),
        test_config().pool,
    );
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move { pool.run(token).await });
    TestWorkers { cancel }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit a job and return its id, asserting the 202 response.
pub async fn submit(app: &Router, body: serde_json::Value) -> String {
    let response = post_json(app.clone(), "/api/v1/process", body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    json["task_id"].as_str().unwrap().to_string()
}

/// Poll `/api/v1/status/{id}` until the job reaches a terminal state.
pub async fn poll_until_terminal(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = get(app.clone(), &format!("/api/v1/status/{id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["state"] == "SUCCESS" || json["state"] == "FAILURE" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not reach a terminal state");
}
