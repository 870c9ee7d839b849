//! # API Module
//!
//! This module contains the HTTP transports for the Solscan MCP server. All of
//! them feed the same [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! ## Available Endpoints
//!
//! ### Tools
//! - `POST /api/tools/:name` - Call a tool, JSON response
//! - `POST /api/tools/:name/stream` - Call a tool, server-sent events
//!
//! ### MCP
//! - `POST /api/rpc` - JSON-RPC request/response
//! - `GET /sse` - Open an MCP SSE session
//! - `POST /messages/?session_id=...` - Post a JSON-RPC message to a session
//!
//! ### Operations
//! - `GET /api/health` - Liveness and registered tools

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod health;
pub mod rpc;
pub mod sessions;
pub mod tools;

pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        // Health check
        .route("/health", get(health::health_handler))
        // Tool calls
        .route("/tools/:name", post(tools::call_tool_handler))
        .route("/tools/:name/stream", post(tools::stream_tool_handler))
        // JSON-RPC endpoint for MCP tool calls
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .route("/sse", get(sessions::sse_connect_handler))
        .route(sessions::MESSAGES_PATH, post(sessions::post_message_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
