// src/solscan/models.rs
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolKind;

// --- Error types for tool dispatch ---

/// Every way a tool call can fail, as seen by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid parameters for {tool}: {}", describe_fields(.missing, .malformed))]
    InvalidParameters {
        tool: String,
        missing: Vec<String>,
        malformed: Vec<String>,
    },
    #[error("upstream rejected request ({status}): {message}")]
    ClientError { message: String, status: u16 },
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        status: Option<u16>,
    },
}

fn describe_fields(missing: &[String], malformed: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing {}", missing.join(", ")));
    }
    if !malformed.is_empty() {
        parts.push(format!("malformed {}", malformed.join("; ")));
    }
    parts.join("; ")
}

/// Stable labels for [`ToolError`] variants, used in logs and error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownTool,
    InvalidParameters,
    ClientError,
    UpstreamUnavailable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidParameters => "invalid_parameters",
            FailureKind::ClientError => "client_error",
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

impl ToolError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ToolError::UnknownTool(_) => FailureKind::UnknownTool,
            ToolError::InvalidParameters { .. } => FailureKind::InvalidParameters,
            ToolError::ClientError { .. } => FailureKind::ClientError,
            ToolError::UpstreamUnavailable { .. } => FailureKind::UpstreamUnavailable,
        }
    }

    /// HTTP status reported by Solscan, when the failure came from a response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ToolError::ClientError { status, .. } => Some(*status),
            ToolError::UpstreamUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    /// Structured form shared by the REST error body, SSE error events and
    /// JSON-RPC error data.
    pub fn to_json(&self) -> Value {
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
            "upstream_status": self.upstream_status(),
        });
        if let ToolError::InvalidParameters {
            missing, malformed, ..
        } = self
        {
            body["missing"] = serde_json::json!(missing);
            body["malformed"] = serde_json::json!(malformed);
        }
        body
    }
}

// --- Upstream request/result ---

/// A fully resolved call against the Solscan API. Carries no credential; the
/// client attaches it when sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub tool: ToolKind,
    /// Path relative to the API base, e.g. `/v2.0/token/meta`.
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    /// Joins the path onto `base` without duplicating slashes.
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path)
    }
}

/// Outcome of one upstream call: the opaque Solscan payload or a typed failure.
pub type UpstreamResult = Result<Value, ToolError>;
