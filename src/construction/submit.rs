//! `/construction/submit`: broadcast a signed transaction.

use alloy::consensus::TxEnvelope;
use alloy::primitives::hex;

use crate::construction::context::Context;
use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::transaction::SignedTransaction;
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{ConstructionSubmitRequest, TransactionIdentifier, TransactionIdentifierResponse};

impl ConstructionService {
    pub async fn submit(
        &self,
        ctx: &Context,
        request: &ConstructionSubmitRequest,
    ) -> ConstructionResult<TransactionIdentifierResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let client = self.online_client()?;

        let signed = SignedTransaction::decode(&request.signed_transaction)?.to_signed()?;
        let hash = hex::encode_prefixed(signed.hash());
        let envelope = TxEnvelope::Legacy(signed);

        ctx.guard(async {
            client
                .send_transaction(&envelope)
                .await
                .map_err(ConstructionError::Submission)
        })
        .await?;

        tracing::info!(tx_hash = %hash, "transaction submitted");
        Ok(TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier { hash },
            metadata: None,
        })
    }
}
