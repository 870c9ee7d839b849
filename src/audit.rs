//! Append-only tool call log.
//!
//! Every dispatch produces exactly one [`LogEntry`], written as a single JSON
//! line. Writers are serialized so concurrent dispatches never interleave
//! partial entries. A failed write is returned as [`LoggingFailure`] and is
//! never allowed to change the tool response.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::solscan::models::{FailureKind, UpstreamResult};

/// Longest payload excerpt kept in a success summary.
const SUMMARY_LEN: usize = 256;

#[derive(Error, Debug)]
pub enum LoggingFailure {
    #[error("failed to open call log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write call log: {0}")]
    Write(#[from] std::io::Error),
}

/// How a dispatch ended, as recorded in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogOutcome {
    Success {
        summary: String,
    },
    Failure {
        kind: String,
        message: String,
        upstream_status: Option<u16>,
    },
    Cancelled,
}

impl LogOutcome {
    pub fn from_result(result: &UpstreamResult) -> Self {
        match result {
            Ok(payload) => LogOutcome::Success {
                summary: summarize(payload),
            },
            Err(err) => LogOutcome::Failure {
                kind: err.kind().as_str().to_string(),
                message: err.to_string(),
                upstream_status: err.upstream_status(),
            },
        }
    }

    pub fn is_failure_of(&self, kind: FailureKind) -> bool {
        matches!(self, LogOutcome::Failure { kind: k, .. } if k == kind.as_str())
    }
}

/// One request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub tool: String,
    pub arguments: Value,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub outcome: LogOutcome,
}

fn summarize(payload: &Value) -> String {
    let text = payload.to_string();
    if text.len() <= SUMMARY_LEN {
        return text;
    }
    let mut end = SUMMARY_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &text[..end], text.len())
}

/// Destination for call log entries.
#[async_trait]
pub trait CallLogSink: Send + Sync {
    async fn record(&self, entry: &LogEntry) -> Result<(), LoggingFailure>;
}

/// JSON Lines file opened once in append mode.
pub struct FileCallLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileCallLog {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LoggingFailure> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| LoggingFailure::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CallLogSink for FileCallLog {
    async fn record(&self, entry: &LogEntry) -> Result<(), LoggingFailure> {
        // Encode before taking the lock so the critical section is one write.
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
