// src/config.rs

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use secrecy::{Secret, SecretString};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://pro-api.solscan.io";
pub const DEFAULT_PORT: u16 = 3011;
pub const DEFAULT_LOG_FILE: &str = "solscan_api.log";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub host: IpAddr,
    pub port: u16,

    /// Solscan Pro API credential. Never logged; `Debug` prints it redacted.
    pub api_token: SecretString,
    pub api_base: String,
    /// Upper bound on a single upstream call.
    pub upstream_timeout: Duration,

    /// Append-only tool call log.
    pub log_file: PathBuf,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("SOLSCAN_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("SOLSCAN_API_TOKEN environment variable is not set"))?;

        let api_base = lookup("SOLSCAN_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Url::parse(&api_base).context("SOLSCAN_API_BASE must be a valid URL")?;

        let host = match lookup("HOST") {
            Some(h) => h.parse().context("HOST must be a valid IP address")?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match lookup("PORT") {
            Some(p) => p.parse().context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(t) => t
                .parse::<u64>()
                .context("UPSTREAM_TIMEOUT_SECS must be a valid number")?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("UPSTREAM_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Config {
            host,
            port,
            api_token: Secret::new(api_token),
            api_base,
            upstream_timeout: Duration::from_secs(timeout_secs),
            log_file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        })
    }
}
