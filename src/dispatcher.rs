//! # Dispatcher
//!
//! Resolves a [`ToolInvocation`] against the tool registry, validates its
//! arguments, performs the single upstream call and records the outcome.
//!
//! Unknown tools and invalid arguments are rejected before any network I/O.
//! Exactly one log entry is written per dispatch, after the upstream call has
//! completed, and a failing log write never changes the returned result.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{CallLogSink, LogEntry, LogOutcome};
use crate::solscan::{
    client::UpstreamClient,
    models::{ToolError, UpstreamResult},
};
use crate::tools;

/// One inbound tool call: a name and its arguments as received. Arguments
/// are checked against the tool's parameters only after the name resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments: Value::Object(arguments),
        }
    }

    /// Absent or `null` arguments become an empty object. Anything else is
    /// kept as-is and rejected at dispatch if it is not an object.
    pub fn from_arguments(name: impl Into<String>, arguments: Option<Value>) -> Self {
        match arguments {
            None | Some(Value::Null) => Self::new(name, Map::new()),
            Some(value) => Self {
                name: name.into(),
                arguments: value,
            },
        }
    }
}

pub struct Dispatcher {
    client: Arc<dyn UpstreamClient>,
    log: Arc<dyn CallLogSink>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn UpstreamClient>, log: Arc<dyn CallLogSink>) -> Self {
        Self { client, log }
    }

    pub async fn dispatch(&self, invocation: ToolInvocation) -> UpstreamResult {
        let timestamp = Utc::now();
        let started = Instant::now();

        let result = self.execute(&invocation).await;

        self.record(invocation, timestamp, started, LogOutcome::from_result(&result))
            .await;
        result
    }

    /// Like [`Dispatcher::dispatch`], but abandons the upstream call as soon as
    /// `cancel` fires. A cancelled dispatch returns `None` and is logged with a
    /// `cancelled` outcome.
    pub async fn dispatch_cancellable(
        &self,
        invocation: ToolInvocation,
        cancel: &CancellationToken,
    ) -> Option<UpstreamResult> {
        let timestamp = Utc::now();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.execute(&invocation) => Some(result),
        };

        let outcome = match &result {
            Some(result) => LogOutcome::from_result(result),
            None => {
                info!(tool = %invocation.name, "Tool call cancelled by caller");
                LogOutcome::Cancelled
            }
        };
        self.record(invocation, timestamp, started, outcome).await;
        result
    }

    async fn execute(&self, invocation: &ToolInvocation) -> UpstreamResult {
        let definition = tools::lookup(&invocation.name).map_err(|e| {
            warn!(tool = %invocation.name, "Unknown tool requested");
            e
        })?;
        let arguments = invocation
            .arguments
            .as_object()
            .ok_or_else(|| ToolError::InvalidParameters {
                tool: definition.name.to_string(),
                missing: vec![],
                malformed: vec!["arguments: expected an object".to_string()],
            })?;
        let request = definition.build_request(arguments)?;

        info!(tool = %definition.name, "Dispatching tool call");
        self.client.call(request).await
    }

    async fn record(
        &self,
        invocation: ToolInvocation,
        timestamp: DateTime<Utc>,
        started: Instant,
        outcome: LogOutcome,
    ) {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp,
            tool: invocation.name,
            arguments: invocation.arguments,
            duration_ms: started.elapsed().as_millis() as u64,
            outcome,
        };
        if let Err(e) = self.log.record(&entry).await {
            error!(error = %e, tool = %entry.tool, id = %entry.id, "Failed to write call log entry");
        }
    }
}
