// src/lib.rs

use std::sync::Arc;

// Re-export modules
pub mod api;
pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod mcp;
pub mod solscan;
pub mod tools;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Resolves and executes tool calls against Solscan
    pub dispatcher: Arc<dispatcher::Dispatcher>,
    /// Open MCP SSE sessions keyed by session id
    pub sessions: api::sessions::SessionRegistry,
}

impl AppState {
    pub fn new(config: config::Config, dispatcher: dispatcher::Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
            sessions: api::sessions::SessionRegistry::default(),
        }
    }
}
