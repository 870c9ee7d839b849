//! MCP over SSE session transport.
//!
//! `GET /sse` opens a session stream whose first event (`endpoint`) tells the
//! client where to post messages. Each `POST /messages/?session_id=...` is
//! answered with `202 Accepted` and its JSON-RPC response is pushed on the
//! session stream as a `message` event. Dropping the stream closes the
//! session and cancels any tool calls still waiting on Solscan.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use dashmap::DashMap;
use futures::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    mcp::{handler::handle_mcp_request, protocol::Request},
    AppState,
};

pub const MESSAGES_PATH: &str = "/messages/";

type EventSender = mpsc::Sender<Result<Event, Infallible>>;

struct Session {
    tx: EventSender,
    cancel: CancellationToken,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<Uuid, Session>>,
}

impl SessionRegistry {
    fn open(&self) -> (Uuid, SessionStream) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        self.inner.insert(
            id,
            Session {
                tx,
                cancel: cancel.clone(),
            },
        );
        let stream = SessionStream {
            id,
            inner: ReceiverStream::new(rx),
            sessions: self.clone(),
            cancel,
        };
        (id, stream)
    }

    fn get(&self, id: &Uuid) -> Option<(EventSender, CancellationToken)> {
        self.inner
            .get(id)
            .map(|session| (session.tx.clone(), session.cancel.clone()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Event stream for one session; removes the session when dropped.
pub struct SessionStream {
    id: Uuid,
    inner: ReceiverStream<Result<Event, Infallible>>,
    sessions: SessionRegistry,
    cancel: CancellationToken,
}

impl Stream for SessionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.sessions.inner.remove(&self.id);
        info!(session = %self.id, "MCP SSE session closed");
    }
}

/// GET /sse
pub async fn sse_connect_handler(State(state): State<AppState>) -> Sse<SessionStream> {
    let (id, stream) = state.sessions.open();
    let endpoint = format!("{}?session_id={}", MESSAGES_PATH, id.simple());

    if let Some((tx, _)) = state.sessions.get(&id) {
        // Fresh channel; this cannot be full.
        let _ = tx.try_send(Ok(Event::default().event("endpoint").data(endpoint)));
    }
    info!(session = %id, "MCP SSE session opened");

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// POST /messages/?session_id={id}
pub async fn post_message_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    body: Bytes,
) -> Response {
    let raw_id = match query.session_id {
        Some(id) => id,
        None => return (StatusCode::BAD_REQUEST, "session_id is required").into_response(),
    };
    let id = match Uuid::parse_str(&raw_id) {
        Ok(id) => id,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response(),
    };
    let (tx, cancel) = match state.sessions.get(&id) {
        Some(session) => session,
        None => {
            warn!(session = %id, "Message for unknown session");
            return (StatusCode::NOT_FOUND, "Could not find session").into_response();
        }
    };
    let request: Request = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(session = %id, "Unparseable message: {}", e);
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    tokio::spawn(async move {
        let Some(response) = handle_mcp_request(request, state, &cancel).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(json) => {
                if tx.send(Ok(Event::default().event("message").data(json))).await.is_err() {
                    debug!(session = %id, "Session closed before response was delivered");
                }
            }
            Err(e) => error!(session = %id, "Failed to serialize response: {}", e),
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
