//! Mempool endpoints.

use std::sync::Arc;

use alloy::primitives::hex;

use crate::blockchain::Client;
use crate::config::Configuration;
use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::{check_network, online_client, Context};
use crate::rosetta::types::{
    MempoolResponse, MempoolTransactionRequest, NetworkRequest, TransactionIdentifier,
};

#[derive(Clone)]
pub struct MempoolService {
    config: Arc<Configuration>,
    client: Option<Arc<dyn Client>>,
}

impl MempoolService {
    pub fn new(config: Arc<Configuration>, client: Option<Arc<dyn Client>>) -> Self {
        Self { config, client }
    }

    /// Hashes of every pending and queued transaction on the node.
    pub async fn mempool(&self, ctx: &Context, request: &NetworkRequest) -> ConstructionResult<MempoolResponse> {
        check_network(&self.config, &request.network_identifier)?;
        let client = online_client(&self.config, self.client.as_ref())?;

        let hashes = ctx
            .guard(async {
                client
                    .get_mempool()
                    .await
                    .map_err(ConstructionError::ClientCommunication)
            })
            .await?;

        Ok(MempoolResponse {
            transaction_identifiers: hashes
                .into_iter()
                .map(|hash| TransactionIdentifier {
                    hash: hex::encode_prefixed(hash),
                })
                .collect(),
        })
    }

    pub async fn mempool_transaction(
        &self,
        _ctx: &Context,
        request: &MempoolTransactionRequest,
    ) -> ConstructionResult<()> {
        check_network(&self.config, &request.network_identifier)?;
        Err(ConstructionError::Unimplemented)
    }
}

impl std::fmt::Debug for MempoolService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MempoolService")
            .field("mode", &self.config.mode)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::test_support::{config, network, TX_HASH};
    use crate::config::Mode;

    fn request() -> NetworkRequest {
        NetworkRequest {
            network_identifier: network(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_mempool_offline() {
        let service = MempoolService::new(config(Mode::Offline), None);
        let err = service.mempool(&Context::background(), &request()).await.unwrap_err();
        assert!(matches!(err, ConstructionError::OfflineModeUnavailable));
    }

    #[tokio::test]
    async fn test_mempool_transaction_unimplemented() {
        let service = MempoolService::new(config(Mode::Offline), None);
        let request = MempoolTransactionRequest {
            network_identifier: network(),
            transaction_identifier: TransactionIdentifier {
                hash: TX_HASH.to_string(),
            },
        };
        let err = service
            .mempool_transaction(&Context::background(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ConstructionError::Unimplemented));
        assert_eq!(err.code(), 0);
    }
}
