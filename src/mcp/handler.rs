//! # MCP Handler Module
//!
//! This module implements the Model Context Protocol (MCP) for the Solscan
//! server. It answers `initialize`, `ping` and `tools/list` directly and hands
//! every `tools/call` to the [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! Tool names are also accepted as method names, so `{"method":
//! "get-latest-blocks", "params": {...}}` is rewritten into the equivalent
//! `tools/call`.

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    dispatcher::ToolInvocation,
    mcp::protocol::{error_codes, Request, Response},
    tools, utils, AppState,
};

pub const SERVER_NAME: &str = "solscan-api";
pub const PROTOCOL_VERSION: &str = "2025-06-18";

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": payload.to_string() }]);
    let structured = match payload {
        Value::Object(map) => Value::Object(map),
        other => json!({ "data": other }),
    };
    json!({
        "content": content,
        "structuredContent": structured,
        "isError": false
    })
}

/// This is the main entry point for all incoming MCP requests. Returns `None`
/// for notifications, which get no reply.
///
/// `cancel` is observed only while a tool call is waiting on Solscan.
pub async fn handle_mcp_request(
    req: Request,
    state: AppState,
    cancel: &CancellationToken,
) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Ignoring notification {}", req.method);
        return None;
    }

    let method = req.method.clone();
    let response = match method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state, cancel).await,
        // Convenience aliases: a tool name used directly as the method is
        // rewritten into tools/call to reuse the same logic
        name if tools::lookup(name).is_ok() => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc,
                id: req.id,
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": name,
                    "arguments": req.params.unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state, cancel).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the Solscan API.
async fn handle_tool_call(req: Request, state: AppState, cancel: &CancellationToken) -> Response {
    let Request { id, params, .. } = req;

    let params = match params {
        Some(p) => p,
        None => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match utils::get_required_arg::<String>(&params, "name", &id) {
        Ok(name) => name,
        Err(resp) => return resp,
    };

    let invocation = ToolInvocation::from_arguments(tool_name, params.get("arguments").cloned());

    match state.dispatcher.dispatch_cancellable(invocation, cancel).await {
        Some(Ok(payload)) => Response::success(id, make_texty_result(payload)),
        Some(Err(e)) => Response::tool_error(id, &e),
        None => Response::error(
            id,
            error_codes::REQUEST_CANCELLED,
            "Request cancelled".into(),
        ),
    }
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Solscan API MCP server for Solana token metadata, prices, latest blocks and account data.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

fn handle_tools_list(req: &Request) -> Response {
    let tools: Vec<Value> = tools::all().map(|def| def.describe()).collect();
    Response::success(req.id.clone(), json!({ "tools": tools }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texty_result_keeps_objects() {
        let result = make_texty_result(json!({"name": "Wrapped SOL"}));
        assert_eq!(result["structuredContent"]["name"], "Wrapped SOL");
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], r#"{"name":"Wrapped SOL"}"#);
        assert_eq!(result["isError"], false);
    }

    #[test]
    fn test_texty_result_wraps_non_objects() {
        let result = make_texty_result(json!([1, 2, 3]));
        assert_eq!(result["structuredContent"], json!({"data": [1, 2, 3]}));
    }

    #[test]
    fn test_tools_list_advertises_registry() {
        let req = Request {
            jsonrpc: "2.0".into(),
            id: json!(1),
            method: "tools/list".into(),
            params: None,
        };
        let resp = handle_tools_list(&req);
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "get-token-info");
        assert_eq!(
            tools[0]["inputSchema"]["required"],
            json!(["contract_address"])
        );
    }
}
