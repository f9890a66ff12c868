//! `/construction/parse`: transaction back to operations.

use alloy::consensus::SignableTransaction;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::blockchain::params::OperationType;
use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::transaction::{quantity, SignedTransaction, UnsignedTransaction};
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    to_object, AccountIdentifier, Amount, ConstructionParseRequest, ConstructionParseResponse,
    Currency, Operation, OperationIdentifier,
};

/// Metadata recovered from a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetadata {
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(with = "quantity")]
    pub gas_price: U256,
    #[serde(with = "quantity")]
    pub chain_id: u64,
}

/// The canonical debit/credit pair for a native transfer.
///
/// A zero-value transfer debits `"0"`, never `"-0"`.
pub fn transfer_operations(currency: &Currency, from: Address, to: Address, value: U256) -> Vec<Operation> {
    let leg = |index: i64, address: Address, value: String, related: Option<Vec<OperationIdentifier>>| Operation {
        operation_identifier: OperationIdentifier::new(index),
        related_operations: related,
        operation_type: OperationType::Call.to_string(),
        status: None,
        account: Some(AccountIdentifier::new(address.to_checksum(None))),
        amount: Some(Amount {
            value,
            currency: currency.clone(),
            metadata: None,
        }),
        metadata: None,
    };
    let debit = if value.is_zero() {
        value.to_string()
    } else {
        format!("-{}", value)
    };
    vec![
        leg(0, from, debit, None),
        leg(1, to, value.to_string(), Some(vec![OperationIdentifier::new(0)])),
    ]
}

struct Parsed {
    from: Address,
    to: Address,
    value: U256,
    metadata: ParseMetadata,
    signers: Vec<AccountIdentifier>,
}

fn parse_unsigned(raw: &str) -> ConstructionResult<Parsed> {
    let tx = UnsignedTransaction::decode(raw)?;
    Ok(Parsed {
        from: tx.from,
        to: tx.to,
        value: tx.value,
        metadata: ParseMetadata {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            chain_id: tx.chain_id,
        },
        signers: Vec::new(),
    })
}

fn parse_signed(raw: &str) -> ConstructionResult<Parsed> {
    let wire = SignedTransaction::decode(raw)?;
    let signed = wire.to_signed()?;
    let sender = signed
        .signature()
        .recover_address_from_prehash(&signed.tx().signature_hash())
        .map_err(|e| ConstructionError::SignatureRecovery(e.to_string()))?;
    Ok(Parsed {
        from: sender,
        to: wire.to,
        value: wire.value,
        metadata: ParseMetadata {
            nonce: wire.nonce,
            gas_price: wire.gas_price,
            chain_id: signed.tx().chain_id.unwrap_or(0),
        },
        signers: vec![AccountIdentifier::new(sender.to_checksum(None))],
    })
}

impl ConstructionService {
    pub fn parse(&self, request: &ConstructionParseRequest) -> ConstructionResult<ConstructionParseResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let parsed = if request.signed {
            parse_signed(&request.transaction)?
        } else {
            parse_unsigned(&request.transaction)?
        };

        let metadata = to_object(&parsed.metadata)
            .map_err(|e| ConstructionError::MalformedTransaction(e.to_string()))?;
        Ok(ConstructionParseResponse {
            operations: transfer_operations(
                &self.config().params.currency(),
                parsed.from,
                parsed.to,
                parsed.value,
            ),
            account_identifier_signers: Some(parsed.signers),
            metadata: Some(metadata),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::test_support::*;

    const PARSE_OPS: &str = r#"[{"operation_identifier":{"index":0},"type":"CALL","account":{"address":"0xe3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309"},"amount":{"value":"-42894881044106498","currency":{"symbol":"FRA","decimals":18}}},{"operation_identifier":{"index":1},"related_operations":[{"index":0}],"type":"CALL","account":{"address":"0x57B414a0332B5CaB885a451c2a28a07d1e9b8a8d"},"amount":{"value":"42894881044106498","currency":{"symbol":"FRA","decimals":18}}}]"#;

    fn parse_metadata() -> serde_json::Value {
        serde_json::json!({"nonce": "0x0", "gas_price": "0x3b9aca00", "chain_id": "0x3"})
    }

    fn request(signed: bool, transaction: &str) -> ConstructionParseRequest {
        ConstructionParseRequest {
            network_identifier: network(),
            signed,
            transaction: transaction.to_string(),
        }
    }

    #[test]
    fn test_parse_unsigned() {
        let response = offline().parse(&request(false, UNSIGNED_RAW)).unwrap();
        assert_eq!(serde_json::to_string(&response.operations).unwrap(), PARSE_OPS);
        assert_eq!(response.account_identifier_signers, Some(vec![]));
        assert_eq!(
            serde_json::Value::Object(response.metadata.unwrap()),
            parse_metadata()
        );
    }

    #[test]
    fn test_parse_signed() {
        let response = offline().parse(&request(true, SIGNED_RAW)).unwrap();
        assert_eq!(serde_json::to_string(&response.operations).unwrap(), PARSE_OPS);
        assert_eq!(
            response.account_identifier_signers,
            Some(vec![AccountIdentifier::new(SENDER)])
        );
        assert_eq!(
            serde_json::Value::Object(response.metadata.unwrap()),
            parse_metadata()
        );
    }

    #[test]
    fn test_parse_wrong_flag() {
        assert!(matches!(
            offline().parse(&request(true, UNSIGNED_RAW)),
            Err(ConstructionError::MalformedTransaction(_))
        ));
        assert!(matches!(
            offline().parse(&request(false, SIGNED_RAW)),
            Err(ConstructionError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_parse_zero_value() {
        let zero = UNSIGNED_RAW.replace(r#""value":"0x9864aac3510d02""#, r#""value":"0x0""#);
        let response = offline().parse(&request(false, &zero)).unwrap();
        let amounts: Vec<&str> = response
            .operations
            .iter()
            .filter_map(|op| op.amount.as_ref().map(|a| a.value.as_str()))
            .collect();
        assert_eq!(amounts, ["0", "0"]);
    }

    #[test]
    fn test_parse_pre_eip155_chain_id() {
        // v = 28 carries no chain id.
        let legacy = SIGNED_RAW.replace(r#""v":"0x2a""#, r#""v":"0x1c""#);
        let response = offline().parse(&request(true, &legacy)).unwrap();
        let metadata = response.metadata.unwrap();
        assert_eq!(metadata["chain_id"], "0x0");
    }
}
