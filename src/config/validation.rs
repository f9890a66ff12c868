//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required settings (mode, network, port) are populated and known
//! - Validate value ranges (timeouts > 0, ports valid, URLs parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RosettaConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::blockchain::params::Network;
use crate::config::resolved::Mode;
use crate::config::schema::RosettaConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("MODE must be populated")]
    MissingMode,

    #[error("{0} is not a valid mode")]
    InvalidMode(String),

    #[error("NETWORK must be populated")]
    MissingNetwork,

    #[error("{0} is not a valid network")]
    InvalidNetwork(String),

    #[error("PORT must be populated")]
    MissingPort,

    #[error("unable to parse port {0}")]
    InvalidPort(u16),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid RPC URL {url}: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("invalid metrics address {0}")]
    InvalidMetricsAddress(String),

    #[error("node binary must be set when no RPC URL is configured")]
    MissingNodeBinary,
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &RosettaConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.mode.is_empty() {
        errors.push(ValidationError::MissingMode);
    } else if config.mode.parse::<Mode>().is_err() {
        errors.push(ValidationError::InvalidMode(config.mode.clone()));
    }

    if config.network.is_empty() {
        errors.push(ValidationError::MissingNetwork);
    } else if Network::from_setting(&config.network).is_none() {
        errors.push(ValidationError::InvalidNetwork(config.network.clone()));
    }

    match config.listener.port {
        None => errors.push(ValidationError::MissingPort),
        Some(0) => errors.push(ValidationError::InvalidPort(0)),
        Some(_) => {}
    }

    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.rpc_secs", config.timeouts.rpc_secs),
        ("timeouts.node_stop_secs", config.timeouts.node_stop_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    match &config.node.rpc_url {
        Some(url) => {
            if let Err(e) = url.parse::<url::Url>() {
                errors.push(ValidationError::InvalidRpcUrl {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        }
        None => {
            if config.node.binary.is_empty() {
                errors.push(ValidationError::MissingNodeBinary);
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
