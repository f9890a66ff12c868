//! Rosetta Construction API.
//!
//! # Data Flow
//! ```text
//! public key ─→ derive ─→ address
//! operations ─→ preprocess ─→ options
//!   options ─→ metadata (node: gas price ∥ pending nonce) ─→ metadata + fee
//! operations + metadata ─→ payloads ─→ unsigned tx + signing payload
//! unsigned tx + signature ─→ combine ─→ signed tx
//! unsigned | signed tx ─→ parse ─→ operations + signers
//! signed tx ─→ hash ─→ tx identifier
//! signed tx ─→ submit (node) ─→ tx identifier
//! ```
//!
//! # Design Decisions
//! - Stages are stateless; everything a later stage needs travels in the
//!   options, metadata or transaction strings
//! - Only metadata and submit reach the node, and both refuse in offline mode
//!   before any call is made
//! - Inputs are re-validated on every call

pub mod combine;
pub mod context;
pub mod derive;
pub mod error;
pub mod hash;
pub mod intent;
pub mod metadata;
pub mod parse;
pub mod payloads;
pub mod preprocess;
pub mod submit;
pub mod transaction;

use std::sync::Arc;

use crate::blockchain::Client;
use crate::config::Configuration;
use crate::rosetta::types::NetworkIdentifier;

pub use context::Context;
pub use error::{ConstructionError, ConstructionResult};

/// Construction endpoints bound to one configured network.
#[derive(Clone)]
pub struct ConstructionService {
    config: Arc<Configuration>,
    client: Option<Arc<dyn Client>>,
}

impl ConstructionService {
    /// `client` is ignored in offline mode.
    pub fn new(config: Arc<Configuration>, client: Option<Arc<dyn Client>>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The node client, or `OfflineModeUnavailable`.
    fn online_client(&self) -> ConstructionResult<&Arc<dyn Client>> {
        online_client(&self.config, self.client.as_ref())
    }
}

/// Reject requests for any network but the configured one.
pub fn check_network(config: &Configuration, network: &NetworkIdentifier) -> ConstructionResult<()> {
    if *network != config.network {
        tracing::debug!(
            requested = %format!("{}/{}", network.blockchain, network.network),
            "network mismatch"
        );
        return Err(ConstructionError::NetworkMismatch);
    }
    Ok(())
}

pub(crate) fn online_client<'a>(
    config: &Configuration,
    client: Option<&'a Arc<dyn Client>>,
) -> ConstructionResult<&'a Arc<dyn Client>> {
    if !config.is_online() {
        return Err(ConstructionError::OfflineModeUnavailable);
    }
    client.ok_or(ConstructionError::OfflineModeUnavailable)
}

impl std::fmt::Debug for ConstructionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionService")
            .field("network", &self.config.network.network)
            .field("mode", &self.config.mode)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}
