use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};

// Forward JSON-RPC requests over HTTP to the MCP handler
pub async fn rpc_handler(State(state): State<AppState>, body: Bytes) -> Json<Response> {
    let req = match serde_json::from_slice::<Request>(&body) {
        Ok(req) => req,
        Err(parse_error) => {
            debug!("JSON-RPC parse error: {}", parse_error);
            return Json(Response::error(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", parse_error),
            ));
        }
    };

    // A dropped connection drops this future, and the upstream call with it.
    let cancel = CancellationToken::new();
    match handle_mcp_request(req, state, &cancel).await {
        Some(resp) => Json(resp),
        None => Json(Response::error(
            Value::Null,
            error_codes::INVALID_REQUEST,
            "Notifications are not supported over HTTP".into(),
        )),
    }
}
