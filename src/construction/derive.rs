//! `/construction/derive`: public key to address.

use alloy::primitives::{hex, Address};
use alloy::signers::k256::ecdsa::VerifyingKey;

use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    AccountIdentifier, ConstructionDeriveRequest, ConstructionDeriveResponse, CurveType, PublicKey,
};

/// Last 20 bytes of keccak256 over the uncompressed point. Accepts
/// compressed (33 byte) and uncompressed (65 byte) SEC1 keys.
pub fn derive_address(public_key: &PublicKey) -> ConstructionResult<Address> {
    if public_key.curve_type != CurveType::Secp256k1 {
        return Err(ConstructionError::UnsupportedCurveType);
    }
    let bytes = hex::decode(&public_key.hex_bytes)
        .map_err(|e| ConstructionError::InvalidPublicKey(e.to_string()))?;
    let key = VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|e| ConstructionError::InvalidPublicKey(e.to_string()))?;
    Ok(Address::from_public_key(&key))
}

impl ConstructionService {
    pub fn derive(&self, request: &ConstructionDeriveRequest) -> ConstructionResult<ConstructionDeriveResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let address = derive_address(&request.public_key)?;
        Ok(ConstructionDeriveResponse {
            account_identifier: Some(AccountIdentifier::new(address.to_checksum(None))),
            metadata: None,
        })
    }
}
