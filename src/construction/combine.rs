//! `/construction/combine`: attach a recoverable signature.

use alloy::consensus::SignableTransaction;
use alloy::primitives::{hex, Signature, U256};

use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::transaction::{SignedTransaction, UnsignedTransaction};
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    ConstructionCombineRequest, ConstructionCombineResponse, Signature as RosettaSignature,
    SignatureType,
};

/// Decode a 65-byte `r ‖ s ‖ v` signature, `v ∈ {0, 1, 27, 28}`.
pub fn decode_signature(hex_bytes: &str) -> ConstructionResult<Signature> {
    let bytes = hex::decode(hex_bytes).map_err(|e| ConstructionError::InvalidSignature(e.to_string()))?;
    if bytes.len() != 65 {
        return Err(ConstructionError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }
    let y_parity = match bytes[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => {
            return Err(ConstructionError::InvalidSignature(format!(
                "invalid recovery id {}",
                v
            )))
        }
    };
    Ok(Signature::new(
        U256::from_be_slice(&bytes[..32]),
        U256::from_be_slice(&bytes[32..64]),
        y_parity,
    ))
}

fn single_signature(signatures: &[RosettaSignature]) -> ConstructionResult<&RosettaSignature> {
    match signatures {
        [signature] => Ok(signature),
        _ => Err(ConstructionError::InvalidSignatureCount(signatures.len())),
    }
}

impl ConstructionService {
    pub fn combine(&self, request: &ConstructionCombineRequest) -> ConstructionResult<ConstructionCombineResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let unsigned = UnsignedTransaction::decode(&request.unsigned_transaction)?;

        let expected = self.config().params.chain_id;
        if unsigned.chain_id != expected {
            return Err(ConstructionError::ChainIdMismatch {
                expected,
                actual: unsigned.chain_id,
            });
        }

        let provided = single_signature(&request.signatures)?;
        if provided.signature_type != SignatureType::EcdsaRecovery {
            return Err(ConstructionError::UnsupportedSignatureType);
        }
        let signature = decode_signature(&provided.hex_bytes)?;

        let tx = unsigned.to_tx_legacy()?;
        let signing_hash = tx.signature_hash();
        let payload = hex::decode(&provided.signing_payload.hex_bytes)
            .map_err(|e| ConstructionError::InvalidSignature(e.to_string()))?;
        if payload.as_slice() != signing_hash.as_slice() {
            return Err(ConstructionError::SignaturePayloadMismatch);
        }

        let signer = signature
            .recover_address_from_prehash(&signing_hash)
            .map_err(|e| ConstructionError::InvalidSignature(e.to_string()))?;
        if signer != unsigned.from {
            return Err(ConstructionError::InvalidSignature(format!(
                "signed by {}, expected {}",
                signer.to_checksum(None),
                unsigned.from.to_checksum(None)
            )));
        }

        let signed = tx.into_signed(signature);
        tracing::debug!(tx_hash = %signed.hash(), "transaction combined");
        Ok(ConstructionCombineResponse {
            signed_transaction: SignedTransaction::from_signed(&signed)?.encode()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::test_support::*;
    use crate::rosetta::types::{AccountIdentifier, CurveType, PublicKey, SigningPayload};

    fn signature(hex_bytes: &str, payload: &str) -> RosettaSignature {
        RosettaSignature {
            hex_bytes: hex_bytes.to_string(),
            signing_payload: SigningPayload {
                address: Some(SENDER.to_string()),
                hex_bytes: payload.to_string(),
                account_identifier: Some(AccountIdentifier::new(SENDER)),
                signature_type: Some(SignatureType::EcdsaRecovery),
            },
            public_key: PublicKey {
                hex_bytes: PUBLIC_KEY.to_string(),
                curve_type: CurveType::Secp256k1,
            },
            signature_type: SignatureType::EcdsaRecovery,
        }
    }

    fn request(signatures: Vec<RosettaSignature>) -> ConstructionCombineRequest {
        ConstructionCombineRequest {
            network_identifier: network(),
            unsigned_transaction: UNSIGNED_RAW.to_string(),
            signatures,
        }
    }

    #[test]
    fn test_combine_vector() {
        let response = offline()
            .combine(&request(vec![signature(SIGNATURE, PAYLOAD)]))
            .unwrap();
        assert_eq!(response.signed_transaction, SIGNED_RAW);
    }

    #[test]
    fn test_combine_accepts_legacy_v() {
        let mut legacy_v = SIGNATURE[..128].to_string();
        legacy_v.push_str("1c");
        let response = offline()
            .combine(&request(vec![signature(&legacy_v, PAYLOAD)]))
            .unwrap();
        assert_eq!(response.signed_transaction, SIGNED_RAW);
    }

    #[test]
    fn test_combine_signature_count() {
        let err = offline().combine(&request(vec![])).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidSignatureCount(0)));

        let two = vec![signature(SIGNATURE, PAYLOAD), signature(SIGNATURE, PAYLOAD)];
        let err = offline().combine(&request(two)).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidSignatureCount(2)));
    }

    #[test]
    fn test_combine_signature_type() {
        let mut sig = signature(SIGNATURE, PAYLOAD);
        sig.signature_type = SignatureType::Ecdsa;
        let err = offline().combine(&request(vec![sig])).unwrap_err();
        assert!(matches!(err, ConstructionError::UnsupportedSignatureType));
    }

    #[test]
    fn test_combine_signature_length() {
        let err = offline()
            .combine(&request(vec![signature(&SIGNATURE[..128], PAYLOAD)]))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidSignature(_)));
    }

    #[test]
    fn test_combine_payload_mismatch() {
        let other = "00".repeat(32);
        let err = offline()
            .combine(&request(vec![signature(SIGNATURE, &other)]))
            .unwrap_err();
        assert!(matches!(err, ConstructionError::SignaturePayloadMismatch));
    }

    #[test]
    fn test_combine_wrong_signer() {
        // Same signature over a different sender no longer recovers to `from`.
        let unsigned = UNSIGNED_RAW.replace(SENDER, RECEIVER);
        let mut req = request(vec![]);
        req.unsigned_transaction = unsigned.clone();
        let hash = UnsignedTransaction::decode(&unsigned).unwrap().signing_hash().unwrap();
        req.signatures = vec![signature(SIGNATURE, &hex::encode(hash))];
        let err = offline().combine(&req).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidSignature(_)));
    }

    #[test]
    fn test_combine_chain_id_mismatch() {
        let unsigned = UNSIGNED_RAW.replace(r#""chain_id":"0x3""#, r#""chain_id":"0x868""#);
        let mut req = request(vec![signature(SIGNATURE, PAYLOAD)]);
        req.unsigned_transaction = unsigned;
        let err = offline().combine(&req).unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::ChainIdMismatch { expected: 3, actual: 2152 }
        ));
    }

    #[test]
    fn test_decode_signature_recovery_ids() {
        assert!(!decode_signature(&format!("{}00", &SIGNATURE[..128])).unwrap().v());
        assert!(decode_signature(&format!("{}01", &SIGNATURE[..128])).unwrap().v());
        assert!(matches!(
            decode_signature(&format!("{}05", &SIGNATURE[..128])),
            Err(ConstructionError::InvalidSignature(_))
        ));
    }
}
