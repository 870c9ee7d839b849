// src/api/tools.rs
//
// Unary and streaming HTTP access to the tool dispatcher.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    dispatcher::{Dispatcher, ToolInvocation},
    solscan::models::ToolError,
    tools::{self, ResponseKind},
    AppState,
};

pub type EventStream = ReceiverStream<Result<Event, Infallible>>;

/// HTTP status used when a tool call fails.
pub fn status_for(err: &ToolError) -> StatusCode {
    match err {
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        ToolError::InvalidParameters { .. } => StatusCode::BAD_REQUEST,
        ToolError::ClientError { .. } => StatusCode::BAD_GATEWAY,
        ToolError::UpstreamUnavailable { status: Some(_), .. } => StatusCode::SERVICE_UNAVAILABLE,
        ToolError::UpstreamUnavailable { status: None, .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

pub fn error_response(err: &ToolError) -> Response {
    (status_for(err), Json(json!({ "error": err.to_json() }))).into_response()
}

// An empty body means no arguments. Only a body that is not JSON at all is
// rejected here; the dispatcher checks the shape.
fn parse_invocation(name: String, body: &[u8]) -> Result<ToolInvocation, ToolError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ToolInvocation::new(name, Map::new()));
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| ToolError::InvalidParameters {
        tool: name.clone(),
        missing: vec![],
        malformed: vec![format!("body: {}", e)],
    })?;
    Ok(ToolInvocation::from_arguments(name, Some(value)))
}

/// POST /api/tools/:name
/// Runs one tool call and returns the Solscan payload as-is.
pub async fn call_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let invocation = match parse_invocation(name, &body) {
        Ok(invocation) => invocation,
        Err(e) => return error_response(&e),
    };

    match state.dispatcher.dispatch(invocation).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/tools/:name/stream
/// Runs one tool call and delivers the result as server-sent events. The
/// stream always ends with either a `done` event or a single `error` event.
pub async fn stream_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Sse<EventStream> {
    let (tx, rx) = mpsc::channel(16);

    match parse_invocation(name, &body) {
        Ok(invocation) => {
            tokio::spawn(stream_tool_call(state.dispatcher.clone(), invocation, tx));
        }
        Err(e) => {
            // Fresh channel; this cannot be full.
            let _ = tx.try_send(Ok(error_event(&e)));
        }
    }

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

async fn stream_tool_call(
    dispatcher: Arc<Dispatcher>,
    invocation: ToolInvocation,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) {
    let name = invocation.name.clone();
    let cancel = CancellationToken::new();

    let dispatch = dispatcher.dispatch_cancellable(invocation, &cancel);
    tokio::pin!(dispatch);

    // A dropped receiver means the client disconnected.
    let result = tokio::select! {
        result = &mut dispatch => result,
        _ = tx.closed() => {
            cancel.cancel();
            dispatch.await
        }
    };

    let events = match result {
        Some(Ok(payload)) => {
            let shape = tools::lookup(&name)
                .map(|def| def.response)
                .unwrap_or(ResponseKind::SingleObject);
            success_events(&name, shape, payload)
        }
        Some(Err(e)) => vec![error_event(&e)],
        None => return,
    };

    for event in events {
        if tx.send(Ok(event)).await.is_err() {
            debug!(tool = %name, "Stream receiver dropped before all events were sent");
            return;
        }
    }
}

/// Splits a successful payload into events. Paginated lists produce one
/// `item` per element of the payload's `data` array.
pub fn success_events(tool: &str, shape: ResponseKind, payload: Value) -> Vec<Event> {
    let mut events = Vec::new();
    let items = match (shape, payload.get("data").and_then(Value::as_array)) {
        (ResponseKind::PaginatedList, Some(items)) => {
            for item in items {
                events.push(Event::default().event("item").data(item.to_string()));
            }
            Some(items.len())
        }
        _ => {
            events.push(Event::default().event("result").data(payload.to_string()));
            None
        }
    };

    let done = json!({ "tool": tool, "items": items });
    events.push(Event::default().event("done").data(done.to_string()));
    events
}

pub fn error_event(err: &ToolError) -> Event {
    let body = err.to_json();
    if let ToolError::UpstreamUnavailable { .. } = err {
        error!(error = %err, "Streaming tool call failed upstream");
    }
    Event::default().event("error").data(body.to_string())
}
