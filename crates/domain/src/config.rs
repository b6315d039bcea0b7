//! Environment-driven configuration for the monitor binary.

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Collaborator endpoints plus the list of addresses to watch, derived from
/// `.env`/process variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    monitor_addresses: Vec<String>,
    bitcoin_api_url: String,
    blockcypher_token: Option<String>,
    ethereum_rpc_url: String,
    thorchain_api_url: String,
    poll_interval: Duration,
    request_timeout: Duration,
    dedup_capacity: Option<u64>,
}

impl BootstrapConfig {
    /// Configuration with default polling, timeout and dedup settings.
    pub fn new(
        monitor_addresses: Vec<String>,
        bitcoin_api_url: impl Into<String>,
        ethereum_rpc_url: impl Into<String>,
        thorchain_api_url: impl Into<String>,
    ) -> Self {
        Self {
            monitor_addresses,
            bitcoin_api_url: bitcoin_api_url.into(),
            blockcypher_token: None,
            ethereum_rpc_url: ethereum_rpc_url.into(),
            thorchain_api_url: thorchain_api_url.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            dedup_capacity: None,
        }
    }

    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// required process variables. Missing or malformed entries surface as
    /// `ConfigError` so the binary can refuse to start.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let monitor_addresses: Vec<String> = get_required_var("MONITOR_ADDRESS")?
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        if monitor_addresses.is_empty() {
            return Err(ConfigError::MissingVar {
                key: "MONITOR_ADDRESS",
            });
        }

        let poll_interval_secs =
            get_optional_number("MONITOR_POLL_INTERVAL_SECS")?.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let request_timeout_secs = get_optional_number("MONITOR_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            monitor_addresses,
            bitcoin_api_url: get_required_var("BITCOIN_API_URL")?,
            blockcypher_token: get_optional_var("BLOCKCYPHER_TOKEN"),
            ethereum_rpc_url: get_required_var("ETHEREUM_RPC_URL")?,
            thorchain_api_url: get_required_var("THORCHAIN_API_URL")?,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
            dedup_capacity: get_optional_number("MONITOR_DEDUP_CAPACITY")?,
        })
    }

    pub fn monitor_addresses(&self) -> &[String] {
        &self.monitor_addresses
    }

    pub fn bitcoin_api_url(&self) -> &str {
        &self.bitcoin_api_url
    }

    pub fn blockcypher_token(&self) -> Option<&str> {
        self.blockcypher_token.as_deref()
    }

    pub fn ethereum_rpc_url(&self) -> &str {
        &self.ethereum_rpc_url
    }

    pub fn thorchain_api_url(&self) -> &str {
        &self.thorchain_api_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `None` keeps every seen hash for the lifetime of the process.
    pub fn dedup_capacity(&self) -> Option<u64> {
        self.dedup_capacity
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    get_optional_var(key).ok_or(ConfigError::MissingVar { key })
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_optional_number(key: &'static str) -> Result<Option<u64>, ConfigError> {
    get_optional_var(key)
        .map(|value| {
            value
                .parse()
                .map_err(|source| ConfigError::InvalidNumber { key, source })
        })
        .transpose()
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("XCHAIN_WATCH_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
