//! Shared setup for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use solscan_mcp_server::{
    api::create_router, audit::FileCallLog, config::Config, dispatcher::Dispatcher,
    solscan::SolscanClient, AppState,
};
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-token-do-not-log";

pub async fn test_state(upstream: &str, log_path: &Path, timeout: Duration) -> AppState {
    let log_file = log_path.display().to_string();
    let config = Config::from_lookup(|key| match key {
        "SOLSCAN_API_TOKEN" => Some(TEST_TOKEN.to_string()),
        "SOLSCAN_API_BASE" => Some(upstream.to_string()),
        "LOG_FILE" => Some(log_file.clone()),
        _ => None,
    })
    .unwrap();

    let client = SolscanClient::new(upstream, config.api_token.clone(), timeout).unwrap();
    let log = FileCallLog::open(&config.log_file).await.unwrap();
    AppState::new(config, Dispatcher::new(Arc::new(client), Arc::new(log)))
}

pub fn app(state: &AppState) -> Router {
    create_router(state.clone())
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends `request` and collects the whole body. Only use with responses
/// that terminate.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub fn read_log(path: &Path) -> Vec<Value> {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is valid JSON"))
        .collect()
}

/// Waits until the log holds `count` entries or two seconds pass.
pub async fn wait_for_log(path: &Path, count: usize) -> Vec<Value> {
    for _ in 0..40 {
        let entries = read_log(path);
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    read_log(path)
}

/// Starts a TCP listener that accepts connections and never answers.
pub async fn silent_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// Names of the SSE events in a complete event-stream body, in order.
pub fn sse_event_names(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(|name| name.trim().to_string())
        .collect()
}
