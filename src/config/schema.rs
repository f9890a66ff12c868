//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! middleware. All types derive Serde traits for deserialization from config
//! files; every section has defaults so a minimal file (or none) works.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RosettaConfig {
    /// `ONLINE` or `OFFLINE`.
    pub mode: String,

    /// `MAINNET`, `TESTNET`/`ANVIL`, `QA02` or `PRINET`.
    pub network: String,

    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Findora node connection and supervision.
    pub node: NodeConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host part of the bind address.
    pub host: String,

    /// Required; there is no default port.
    pub port: Option<u16>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Findora node settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Remote JSON-RPC endpoint. When unset the local node is supervised and
    /// reached on [`DEFAULT_RPC_URL`].
    pub rpc_url: Option<String>,

    /// Node binary launched when no remote endpoint is configured.
    pub binary: String,
}

/// Where a locally supervised node listens.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            binary: "/app/geth".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Per JSON-RPC call timeout in seconds.
    pub rpc_secs: u64,

    /// Grace period for the node to exit after an interrupt.
    pub node_stop_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            rpc_secs: 10,
            node_stop_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter, overridden by `RUST_LOG`.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
