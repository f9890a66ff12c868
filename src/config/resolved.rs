//! Resolved runtime configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::params::{ChainParams, Network};
use crate::config::loader::ConfigError;
use crate::config::schema::{ObservabilityConfig, RosettaConfig, DEFAULT_RPC_URL};
use crate::config::validation::{validate_config, ValidationError};
use crate::rosetta::types::NetworkIdentifier;

/// Whether outbound connections to the node are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Online,
    Offline,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Online => "ONLINE",
            Mode::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(Mode::Online),
            "OFFLINE" => Ok(Mode::Offline),
            other => Err(other.to_string()),
        }
    }
}

/// Validated, immutable configuration shared by every subsystem.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub mode: Mode,
    pub network: NetworkIdentifier,
    pub params: ChainParams,
    pub rpc_url: String,
    /// True when the node is reached over a user-supplied URL and not
    /// supervised locally.
    pub remote_rpc: bool,
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub node_binary: PathBuf,
    pub node_arguments: String,
    pub request_timeout: Duration,
    pub rpc_timeout: Duration,
    pub node_stop_timeout: Duration,
    pub observability: ObservabilityConfig,
}

impl Configuration {
    /// Defaults for everything but mode and network.
    pub fn new(mode: Mode, network: Network) -> Self {
        let schema = RosettaConfig::default();
        let params = *network.params();
        Self {
            mode,
            network: params.network_identifier(),
            params,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            remote_rpc: false,
            host: schema.listener.host,
            port: 8080,
            max_body_bytes: schema.listener.max_body_bytes,
            node_binary: PathBuf::from(schema.node.binary),
            node_arguments: params.node_arguments.to_string(),
            request_timeout: Duration::from_secs(schema.timeouts.request_secs),
            rpc_timeout: Duration::from_secs(schema.timeouts.rpc_secs),
            node_stop_timeout: Duration::from_secs(schema.timeouts.node_stop_secs),
            observability: schema.observability,
        }
    }

    /// Validate a raw configuration and resolve it.
    pub fn from_config(config: &RosettaConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        // Both parse after validation succeeded.
        let mode = config
            .mode
            .parse::<Mode>()
            .map_err(|m| ConfigError::Validation(vec![ValidationError::InvalidMode(m)]))?;
        let network = Network::from_setting(&config.network).ok_or_else(|| {
            ConfigError::Validation(vec![ValidationError::InvalidNetwork(
                config.network.clone(),
            )])
        })?;

        let mut resolved = Self::new(mode, network);
        if let Some(url) = &config.node.rpc_url {
            resolved.rpc_url = url.clone();
            resolved.remote_rpc = true;
        }
        resolved.host = config.listener.host.clone();
        resolved.port = config.listener.port.unwrap_or(resolved.port);
        resolved.max_body_bytes = config.listener.max_body_bytes;
        resolved.node_binary = PathBuf::from(&config.node.binary);
        resolved.request_timeout = Duration::from_secs(config.timeouts.request_secs);
        resolved.rpc_timeout = Duration::from_secs(config.timeouts.rpc_secs);
        resolved.node_stop_timeout = Duration::from_secs(config.timeouts.node_stop_secs);
        resolved.observability = config.observability.clone();
        Ok(resolved)
    }

    pub fn is_online(&self) -> bool {
        self.mode == Mode::Online
    }

    /// Whether startup should launch the local node.
    pub fn supervises_node(&self) -> bool {
        self.is_online() && !self.remote_rpc
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
