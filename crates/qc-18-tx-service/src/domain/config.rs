//! Transaction service configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main tx service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TxServiceConfig {
    /// Node connection used by the networked querier
    pub node: NodeConfig,
    /// Page size limits for event searches
    pub pagination: PaginationConfig,
    /// Subsystem identifier used in telemetry
    pub telemetry_subsystem_id: String,
}

impl Default for TxServiceConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            pagination: PaginationConfig::default(),
            telemetry_subsystem_id: "18".to_string(),
        }
    }
}

impl TxServiceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("node.rpc_url cannot be empty".into()));
        }

        if self.node.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "node timeout cannot be 0".into(),
            ));
        }

        if self.pagination.default_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "default_limit cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Node RPC endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:26657".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Page size used when neither the request nor the config sets one.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Limit applied when a request leaves it unset
    pub default_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PaginationConfig {
    /// Default limit, never zero.
    pub fn effective_default_limit(&self) -> u64 {
        if self.default_limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.default_limit
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
