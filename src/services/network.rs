//! Network discovery endpoints.

use std::sync::Arc;

use crate::blockchain::params::{
    operation_statuses, OperationType, CALL_METHODS, HISTORICAL_BALANCE_SUPPORTED,
    INCLUDE_MEMPOOL_COINS, NODE_VERSION, ROSETTA_VERSION,
};
use crate::config::Configuration;
use crate::construction::error::{all_errors, ConstructionResult};
use crate::construction::check_network;
use crate::rosetta::types::{
    Allow, MetadataRequest, NetworkListResponse, NetworkOptionsResponse, NetworkRequest, Version,
};

pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct NetworkService {
    config: Arc<Configuration>,
}

impl NetworkService {
    pub fn new(config: Arc<Configuration>) -> Self {
        Self { config }
    }

    /// The single configured network. Available offline.
    pub fn list(&self, _request: &MetadataRequest) -> NetworkListResponse {
        NetworkListResponse {
            network_identifiers: vec![self.config.network.clone()],
        }
    }

    /// Versions and the capabilities this middleware supports. Available offline.
    pub fn options(&self, request: &NetworkRequest) -> ConstructionResult<NetworkOptionsResponse> {
        check_network(&self.config, &request.network_identifier)?;
        Ok(NetworkOptionsResponse {
            version: Version {
                rosetta_version: ROSETTA_VERSION.to_string(),
                node_version: NODE_VERSION.to_string(),
                middleware_version: Some(MIDDLEWARE_VERSION.to_string()),
            },
            allow: Allow {
                operation_statuses: operation_statuses(),
                operation_types: OperationType::ALL.iter().map(|t| t.to_string()).collect(),
                errors: all_errors(),
                historical_balance_lookup: HISTORICAL_BALANCE_SUPPORTED,
                call_methods: CALL_METHODS.iter().map(|m| m.to_string()).collect(),
                mempool_coins: INCLUDE_MEMPOOL_COINS,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::params::Network;
    use crate::config::Mode;
    use crate::construction::ConstructionError;
    use crate::rosetta::types::NetworkIdentifier;

    fn service() -> NetworkService {
        NetworkService::new(Arc::new(Configuration::new(Mode::Offline, Network::Mainnet)))
    }

    fn request(network: &str) -> NetworkRequest {
        NetworkRequest {
            network_identifier: NetworkIdentifier::new("Findora", network),
            metadata: None,
        }
    }

    #[test]
    fn test_list_returns_configured_network() {
        let response = service().list(&MetadataRequest::default());
        assert_eq!(
            response.network_identifiers,
            vec![NetworkIdentifier::new("Findora", "Mainnet")]
        );
    }

    #[test]
    fn test_options() {
        let response = service().options(&request("Mainnet")).unwrap();
        assert_eq!(response.version.rosetta_version, "1.4.10");
        assert_eq!(response.version.node_version, "1.9.24");
        assert_eq!(response.version.middleware_version.as_deref(), Some("0.0.4"));

        let allow = response.allow;
        assert_eq!(allow.operation_statuses.len(), 2);
        assert!(allow.operation_statuses[0].successful);
        assert!(!allow.operation_statuses[1].successful);
        assert_eq!(allow.operation_types.len(), 11);
        assert!(allow.operation_types.contains(&"CALL".to_string()));
        assert_eq!(allow.errors.len(), 10);
        assert!(allow.historical_balance_lookup);
        assert!(!allow.mempool_coins);
        assert!(allow.call_methods.contains(&"eth_getBlockByNumber".to_string()));
    }

    #[test]
    fn test_options_wrong_network() {
        assert!(matches!(
            service().options(&request("Anvil")),
            Err(ConstructionError::NetworkMismatch)
        ));
    }
}
