//! `/construction/hash`: identifier of a signed transaction.

use alloy::primitives::hex;

use crate::construction::error::ConstructionResult;
use crate::construction::transaction::SignedTransaction;
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{ConstructionHashRequest, TransactionIdentifier, TransactionIdentifierResponse};

/// keccak256 of the signed RLP, recomputed from the fields.
pub fn transaction_identifier(signed_transaction: &str) -> ConstructionResult<TransactionIdentifier> {
    let signed = SignedTransaction::decode(signed_transaction)?.to_signed()?;
    Ok(TransactionIdentifier {
        hash: hex::encode_prefixed(signed.hash()),
    })
}

impl ConstructionService {
    pub fn hash(&self, request: &ConstructionHashRequest) -> ConstructionResult<TransactionIdentifierResponse> {
        check_network(self.config(), &request.network_identifier)?;
        Ok(TransactionIdentifierResponse {
            transaction_identifier: transaction_identifier(&request.signed_transaction)?,
            metadata: None,
        })
    }
}
