// src/solscan/mod.rs

pub mod client;
pub use client::{SolscanClient, UpstreamClient};

pub mod models;
pub use models::{FailureKind, ToolError, UpstreamRequest, UpstreamResult};
