//! `/construction/metadata`: gas price and nonce from the node.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::blockchain::params::ChainParams;
use crate::construction::context::Context;
use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::preprocess::{check_multiplier, Options};
use crate::construction::transaction::quantity;
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    from_object, to_object, Amount, ConstructionMetadataRequest, ConstructionMetadataResponse,
};

/// Carried from Metadata to Payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(with = "quantity")]
    pub gas_price: U256,
}

/// Multipliers are applied in millionths.
const MULTIPLIER_SCALE: u128 = 1_000_000;

/// `ceil(gas_price * multiplier)`; exact when there is no multiplier.
///
/// The multiplier is rounded to six decimal places; the product is exact.
pub fn apply_multiplier(gas_price: u128, multiplier: Option<f64>) -> ConstructionResult<U256> {
    let Some(m) = multiplier else {
        return Ok(U256::from(gas_price));
    };
    check_multiplier(Some(m))?;
    let overflow = || {
        ConstructionError::InvalidOptions(format!(
            "suggested fee multiplier {} overflows the gas price",
            m
        ))
    };

    let millionths = (m * MULTIPLIER_SCALE as f64).round();
    if millionths >= u128::MAX as f64 {
        return Err(overflow());
    }
    let millionths = U256::from((millionths as u128).max(1));
    let scale = U256::from(MULTIPLIER_SCALE);
    let scaled = (U256::from(gas_price) * millionths + scale - U256::from(1)) / scale;
    if scaled > U256::from(u128::MAX) {
        return Err(overflow());
    }
    Ok(scaled)
}

/// Fee of a plain transfer at `gas_price`.
pub fn transfer_fee(params: &ChainParams, gas_price: U256) -> Amount {
    Amount {
        value: (gas_price * U256::from(params.transfer_gas_limit())).to_string(),
        currency: params.currency(),
        metadata: None,
    }
}

impl ConstructionService {
    pub async fn metadata(
        &self,
        ctx: &Context,
        request: &ConstructionMetadataRequest,
    ) -> ConstructionResult<ConstructionMetadataResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let client = self.online_client()?;

        let options: Options = from_object(request.options.clone().unwrap_or_default())
            .map_err(|e| ConstructionError::InvalidOptions(e.to_string()))?;
        check_multiplier(options.suggested_fee_multiplier)?;

        // Fail fast: the first error drops the other request.
        let (gas_price, nonce) = ctx
            .guard(async {
                tokio::try_join!(
                    async {
                        client
                            .suggest_gas_price()
                            .await
                            .map_err(ConstructionError::ClientCommunication)
                    },
                    async {
                        client
                            .pending_nonce_at(options.from)
                            .await
                            .map_err(ConstructionError::ClientCommunication)
                    },
                )
            })
            .await?;

        let gas_price = apply_multiplier(gas_price, options.suggested_fee_multiplier)?;
        tracing::debug!(from = %options.from, nonce, gas_price = %gas_price, "metadata fetched");

        let metadata = Metadata { nonce, gas_price };
        Ok(ConstructionMetadataResponse {
            metadata: to_object(&metadata).map_err(|e| ConstructionError::InvalidMetadata(e.to_string()))?,
            suggested_fee: Some(vec![transfer_fee(&self.config().params, gas_price)]),
        })
    }
}
