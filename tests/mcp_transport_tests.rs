//! JSON-RPC over `/api/rpc` and the MCP SSE session transport.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::StreamExt;
use mockito::Matcher;
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use common::{app, post_json, read_log, send, silent_upstream, test_state, wait_for_log};

async fn rpc(state: &solscan_mcp_server::AppState, body: Value) -> Value {
    let (status, body) = send(app(state), post_json("/api/rpc", &body.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_rpc_initialize_and_list() {
    let dir = tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("calls.log"), Duration::from_secs(1)).await;

    let init = rpc(&state, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
    assert_eq!(init["result"]["serverInfo"]["name"], "solscan-api");

    let list = rpc(&state, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let names: Vec<&str> = list["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "get-token-info",
            "get-sol-token-price",
            "get-latest-blocks",
            "get-account-info",
            "get-account-activities",
        ]
    );
}

#[tokio::test]
async fn test_rpc_tools_call_returns_structured_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2.0/token/price")
        .match_query(Matcher::UrlEncoded("address".into(), "So1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"data":[{"date":20240101,"price":101.5}]}"#)
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let log_path = dir.path().join("calls.log");
    let state = test_state(&server.url(), &log_path, Duration::from_secs(5)).await;

    let resp = rpc(
        &state,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "get-sol-token-price", "arguments": {"address": "So1"}}
        }),
    )
    .await;

    assert_eq!(resp["id"], 7);
    assert_eq!(resp["result"]["structuredContent"]["data"][0]["price"], 101.5);
    assert_eq!(resp["result"]["isError"], false);
    assert_eq!(read_log(&log_path).len(), 1);
}

#[tokio::test]
async fn test_rpc_maps_tool_failures_to_error_codes() {
    let dir = tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("calls.log"), Duration::from_secs(1)).await;

    let unknown = rpc(
        &state,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "list-sol-tokens", "arguments": {}}
        }),
    )
    .await;
    assert_eq!(unknown["error"]["code"], -32601);
    assert_eq!(unknown["error"]["data"]["kind"], "unknown_tool");

    let invalid = rpc(
        &state,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "get-latest-blocks",
            "params": {"limit": "ten"}
        }),
    )
    .await;
    assert_eq!(invalid["error"]["code"], -32602);
    let malformed = invalid["error"]["data"]["malformed"].as_array().unwrap();
    assert_eq!(malformed.len(), 1);
    assert!(malformed[0].as_str().unwrap().starts_with("limit"));
}

#[tokio::test]
async fn test_messages_for_unknown_session_are_rejected() {
    let dir = tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("calls.log"), Duration::from_secs(1)).await;

    let (status, _) = send(
        app(&state),
        post_json(
            "/messages/?session_id=0123456789abcdef0123456789abcdef",
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(&state), post_json("/messages/", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rpc_non_object_arguments_are_logged() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("calls.log");
    let state = test_state("http://127.0.0.1:9", &log_path, Duration::from_secs(1)).await;

    let resp = rpc(
        &state,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "get-latest-blocks", "arguments": "limit=5"}
        }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(resp["error"]["data"]["kind"], "invalid_parameters");

    let resp = rpc(
        &state,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "no-such-tool", "arguments": [1]}
        }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32601);
    assert_eq!(resp["error"]["data"]["kind"], "unknown_tool");

    let entries = read_log(&log_path);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["arguments"], "limit=5");
    assert_eq!(entries[1]["tool"], "no-such-tool");
}

#[tokio::test]
async fn test_rpc_unparseable_body_is_parse_error() {
    let dir = tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("calls.log"), Duration::from_secs(1)).await;

    let (status, body) = send(app(&state), post_json("/api/rpc", "{\"jsonrpc\": ")).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

/// Reads from an SSE body until `needle` shows up, returning everything read.
async fn read_until<S>(stream: &mut S, needle: &str) -> String
where
    S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let mut seen = String::new();
    let read = async {
        while let Some(chunk) = stream.next().await {
            seen.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
            if seen.contains(needle) {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("event arrived in time");
    seen
}

#[tokio::test]
async fn test_sse_session_round_trip() {
    let dir = tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", &dir.path().join("calls.log"), Duration::from_secs(1)).await;

    let response = app(&state)
        .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut events = response.into_body().into_data_stream();

    let opening = read_until(&mut events, "\n\n").await;
    assert!(opening.contains("event: endpoint"));
    let endpoint = opening
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .unwrap()
        .trim()
        .to_string();
    assert!(endpoint.starts_with("/messages/?session_id="));
    assert_eq!(state.sessions.len(), 1);

    let (status, body) = send(
        app(&state),
        post_json(&endpoint, r#"{"jsonrpc":"2.0","id":"abc","method":"tools/list"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, "Accepted");

    let message = read_until(&mut events, "get-account-activities").await;
    assert!(message.contains("event: message"));
    assert!(message.contains(r#""id":"abc""#));

    drop(events);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_closing_session_cancels_pending_call() {
    let upstream = silent_upstream().await;
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("calls.log");
    let state = test_state(&upstream, &log_path, Duration::from_secs(30)).await;

    let response = app(&state)
        .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut events = response.into_body().into_data_stream();
    let opening = read_until(&mut events, "\n\n").await;
    let endpoint = opening
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .unwrap()
        .trim()
        .to_string();

    let (status, _) = send(
        app(&state),
        post_json(
            &endpoint,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"get-latest-blocks","arguments":{"limit":5}}}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Let the call reach the upstream before the client goes away.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(read_log(&log_path).is_empty());
    drop(events);

    let entries = wait_for_log(&log_path, 1).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["tool"], "get-latest-blocks");
    assert_eq!(entries[0]["status"], "cancelled");
    assert!(state.sessions.is_empty());
}
