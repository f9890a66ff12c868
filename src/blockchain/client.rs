//! Node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Define the [`Client`] capability the construction flow depends on
//! - Connect to the Findora node's JSON-RPC endpoint
//! - Bound every call with the configured RPC timeout
//! - Classify node rejections apart from transport failures

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::{RpcError, TransportResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainId, ClientError, ClientResult};
use crate::observability::metrics;

/// Everything the construction and mempool services need from the node.
///
/// Cancellation is by dropping the returned future.
#[async_trait]
pub trait Client: Send + Sync {
    /// Current gas price suggestion in wei.
    async fn suggest_gas_price(&self) -> ClientResult<u128>;

    /// Next nonce for `address`, counting pending transactions.
    async fn pending_nonce_at(&self, address: Address) -> ClientResult<u64>;

    /// Broadcast a signed transaction.
    async fn send_transaction(&self, tx: &TxEnvelope) -> ClientResult<()>;

    /// Hashes of every transaction in the node's pool.
    async fn get_mempool(&self) -> ClientResult<Vec<B256>>;
}

/// Shape of `txpool_content`; only the hashes are kept.
#[derive(Debug, Default, Deserialize)]
struct TxPoolContent {
    #[serde(default)]
    pending: BTreeMap<Address, BTreeMap<String, PoolTransaction>>,
    #[serde(default)]
    queued: BTreeMap<Address, BTreeMap<String, PoolTransaction>>,
}

#[derive(Debug, Deserialize)]
struct PoolTransaction {
    hash: B256,
}

impl TxPoolContent {
    fn hashes(self) -> Vec<B256> {
        let set: BTreeSet<B256> = self
            .pending
            .into_values()
            .chain(self.queued.into_values())
            .flat_map(|by_nonce| by_nonce.into_values())
            .map(|tx| tx.hash)
            .collect();
        set.into_iter().collect()
    }
}

/// [`Client`] backed by an alloy HTTP provider.
#[derive(Clone)]
pub struct NodeClient {
    provider: DynProvider,
    rpc_url: String,
    timeout_duration: Duration,
}

impl NodeClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(rpc_url: &str, rpc_timeout: Duration) -> ClientResult<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| ClientError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        tracing::info!(rpc_url = %rpc_url, timeout_secs = rpc_timeout.as_secs(), "Node client initialized");

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
            timeout_duration: rpc_timeout,
        })
    }

    /// Chain ID reported by the node.
    pub async fn get_chain_id(&self) -> ClientResult<ChainId> {
        self.call("eth_chainId", self.provider.get_chain_id())
            .await
            .map(ChainId)
    }

    /// Fails when the node serves a chain other than `expected`.
    pub async fn verify_chain_id(&self, expected: u64) -> ClientResult<()> {
        let actual = self.get_chain_id().await?.0;
        if actual != expected {
            return Err(ClientError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    async fn call<T, F>(&self, method: &'static str, fut: F) -> ClientResult<T>
    where
        F: Future<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                metrics::record_rpc_error(method);
                tracing::warn!(method, error = %e, "RPC error");
                match e {
                    RpcError::ErrorResp(payload) if method == "eth_sendRawTransaction" => {
                        Err(ClientError::Rejected(payload.message.to_string()))
                    }
                    other => Err(ClientError::Rpc(other.to_string())),
                }
            }
            Err(_) => {
                metrics::record_rpc_error(method);
                tracing::warn!(method, "RPC timeout");
                Err(ClientError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }
}

#[async_trait]
impl Client for NodeClient {
    async fn suggest_gas_price(&self) -> ClientResult<u128> {
        self.call("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn pending_nonce_at(&self, address: Address) -> ClientResult<u64> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending().into_future(),
        )
        .await
    }

    async fn send_transaction(&self, tx: &TxEnvelope) -> ClientResult<()> {
        let encoded = tx.encoded_2718();
        let pending = self
            .call(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(&encoded),
            )
            .await?;
        tracing::info!(tx_hash = %pending.tx_hash(), "Transaction submitted");
        Ok(())
    }

    async fn get_mempool(&self) -> ClientResult<Vec<B256>> {
        let content: TxPoolContent = self
            .call(
                "txpool_content",
                self.provider.raw_request("txpool_content".into(), ()),
            )
            .await?;
        Ok(content.hashes())
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("rpc_url", &self.rpc_url)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
