//! `/construction/payloads`: unsigned transaction and signing payload.

use alloy::primitives::{hex, Bytes};

use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::intent::match_transfer;
use crate::construction::metadata::Metadata;
use crate::construction::transaction::UnsignedTransaction;
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    from_object, AccountIdentifier, ConstructionPayloadsRequest, ConstructionPayloadsResponse,
    SignatureType, SigningPayload,
};

impl ConstructionService {
    pub fn payloads(
        &self,
        request: &ConstructionPayloadsRequest,
    ) -> ConstructionResult<ConstructionPayloadsResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let intent = match_transfer(&request.operations)?;
        let metadata: Metadata = from_object(request.metadata.clone().unwrap_or_default())
            .map_err(|e| ConstructionError::InvalidMetadata(e.to_string()))?;

        let params = &self.config().params;
        let unsigned = UnsignedTransaction {
            from: intent.from,
            to: intent.to,
            value: intent.value,
            data: Bytes::new(),
            nonce: metadata.nonce,
            gas_price: metadata.gas_price,
            gas: params.transfer_gas_limit(),
            chain_id: params.chain_id,
        };
        let signing_hash = unsigned.signing_hash()?;

        let sender = intent.from.to_checksum(None);
        let payload = SigningPayload {
            address: Some(sender.clone()),
            hex_bytes: hex::encode(signing_hash),
            account_identifier: Some(AccountIdentifier::new(sender)),
            signature_type: Some(SignatureType::EcdsaRecovery),
        };

        Ok(ConstructionPayloadsResponse {
            unsigned_transaction: unsigned.encode()?,
            payloads: vec![payload],
        })
    }
}
