//! Transfer intent matching shared by Preprocess and Payloads.

use alloy::primitives::{Address, I256, U256};

use crate::blockchain::params::{native_currency, OperationType};
use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::rosetta::types::Operation;

/// A native value transfer described by an operation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub operation_type: OperationType,
}

/// Parse a checksummed or lowercase `0x` address.
pub fn parse_address(raw: &str) -> ConstructionResult<Address> {
    if !raw.starts_with("0x") {
        return Err(ConstructionError::InvalidAddress(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ConstructionError::InvalidAddress(raw.to_string()))
}

/// Match exactly two operations, indices 0 and 1, as a balanced transfer.
pub fn match_transfer(operations: &[Operation]) -> ConstructionResult<TransferIntent> {
    if operations.len() != 2 {
        return Err(ConstructionError::InvalidOperationCount(operations.len()));
    }

    let find = |index: i64| {
        operations
            .iter()
            .find(|op| op.operation_identifier.index == index)
            .ok_or_else(|| {
                ConstructionError::InvalidOperations(format!("missing operation with index {}", index))
            })
    };
    let legs = [find(0)?, find(1)?];

    let mut addresses = [Address::ZERO; 2];
    for (slot, op) in addresses.iter_mut().zip(legs) {
        let account = op.account.as_ref().ok_or_else(|| {
            ConstructionError::InvalidOperations(format!(
                "operation {} has no account",
                op.operation_identifier.index
            ))
        })?;
        *slot = parse_address(&account.address)?;
    }

    let mut amounts = [I256::ZERO; 2];
    for (slot, op) in amounts.iter_mut().zip(legs) {
        let amount = op.amount.as_ref().ok_or_else(|| {
            ConstructionError::InvalidOperations(format!(
                "operation {} has no amount",
                op.operation_identifier.index
            ))
        })?;
        *slot = I256::from_dec_str(&amount.value)
            .map_err(|_| ConstructionError::InvalidAmount(amount.value.clone()))?;
    }

    let (sender, receiver) = match (amounts[0].is_negative(), amounts[1].is_negative()) {
        (true, false) => (0, 1),
        (false, true) => (1, 0),
        _ => return Err(ConstructionError::UnbalancedAmounts),
    };
    if amounts[receiver].is_zero() || amounts[0].checked_add(amounts[1]) != Some(I256::ZERO) {
        return Err(ConstructionError::UnbalancedAmounts);
    }

    let native = native_currency();
    for op in legs {
        // Presence was checked above.
        let currency = op.amount.as_ref().map(|a| &a.currency);
        if currency.map(|c| (c.symbol.as_str(), c.decimals)) != Some((native.symbol.as_str(), native.decimals)) {
            return Err(ConstructionError::CurrencyMismatch);
        }
    }

    let mut types = [OperationType::Call; 2];
    for (slot, op) in types.iter_mut().zip(legs) {
        let parsed: OperationType = op
            .operation_type
            .parse()
            .map_err(ConstructionError::UnsupportedOperationType)?;
        if !parsed.is_transfer() {
            return Err(ConstructionError::UnsupportedOperationType(op.operation_type.clone()));
        }
        *slot = parsed;
    }
    if types[0] != types[1] {
        return Err(ConstructionError::InvalidOperations(
            "operation types differ".to_string(),
        ));
    }

    Ok(TransferIntent {
        from: addresses[sender],
        to: addresses[receiver],
        value: amounts[receiver].into_raw(),
        operation_type: types[0],
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rosetta::types::{AccountIdentifier, Amount, Currency, OperationIdentifier};
    use alloy::primitives::address;

    pub(crate) fn leg(index: i64, address: &str, value: &str) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier::new(index),
            related_operations: None,
            operation_type: "CALL".to_string(),
            status: None,
            account: Some(AccountIdentifier::new(address)),
            amount: Some(Amount {
                value: value.to_string(),
                currency: native_currency(),
                metadata: None,
            }),
            metadata: None,
        }
    }

    const SENDER: &str = "0xe3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309";
    const RECEIVER: &str = "0x57B414a0332B5CaB885a451c2a28a07d1e9b8a8d";

    fn transfer() -> Vec<Operation> {
        vec![
            leg(0, SENDER, "-42894881044106498"),
            leg(1, RECEIVER, "42894881044106498"),
        ]
    }

    #[test]
    fn test_matches_transfer() {
        let intent = match_transfer(&transfer()).unwrap();
        assert_eq!(intent.from, address!("e3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309"));
        assert_eq!(intent.to, address!("57B414a0332B5CaB885a451c2a28a07d1e9b8a8d"));
        assert_eq!(intent.value, U256::from(42_894_881_044_106_498u64));
        assert_eq!(intent.operation_type, OperationType::Call);
    }

    #[test]
    fn test_order_independent() {
        let mut ops = transfer();
        ops.reverse();
        assert_eq!(match_transfer(&ops).unwrap(), match_transfer(&transfer()).unwrap());

        // The credit may carry index 0.
        let ops = vec![
            leg(0, RECEIVER, "5"),
            leg(1, SENDER, "-5"),
        ];
        let intent = match_transfer(&ops).unwrap();
        assert_eq!(intent.from.to_checksum(None), SENDER);
    }

    #[test]
    fn test_operation_count() {
        let ops = &transfer()[..1];
        assert!(matches!(
            match_transfer(ops),
            Err(ConstructionError::InvalidOperationCount(1))
        ));
        let mut ops = transfer();
        ops.push(leg(2, RECEIVER, "0"));
        assert!(matches!(
            match_transfer(&ops),
            Err(ConstructionError::InvalidOperationCount(3))
        ));
    }

    #[test]
    fn test_indices() {
        let mut ops = transfer();
        ops[1].operation_identifier.index = 2;
        assert!(matches!(
            match_transfer(&ops),
            Err(ConstructionError::InvalidOperations(_))
        ));
    }

    #[test]
    fn test_unbalanced() {
        let ops = vec![leg(0, SENDER, "-10"), leg(1, RECEIVER, "9")];
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::UnbalancedAmounts)));

        let ops = vec![leg(0, SENDER, "10"), leg(1, RECEIVER, "10")];
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::UnbalancedAmounts)));

        let ops = vec![leg(0, SENDER, "0"), leg(1, RECEIVER, "0")];
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::UnbalancedAmounts)));
    }

    #[test]
    fn test_bad_amount() {
        let ops = vec![leg(0, SENDER, "-1.5"), leg(1, RECEIVER, "1.5")];
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::InvalidAmount(_))));
    }

    #[test]
    fn test_currency() {
        let mut ops = transfer();
        ops[1].amount.as_mut().unwrap().currency = Currency {
            symbol: "ETH".to_string(),
            decimals: 18,
            metadata: None,
        };
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::CurrencyMismatch)));
    }

    #[test]
    fn test_operation_type() {
        let mut ops = transfer();
        ops[0].operation_type = "FEE".to_string();
        ops[1].operation_type = "FEE".to_string();
        assert!(matches!(
            match_transfer(&ops),
            Err(ConstructionError::UnsupportedOperationType(t)) if t == "FEE"
        ));

        let mut ops = transfer();
        ops[0].operation_type = "TRANSFER".to_string();
        assert!(matches!(
            match_transfer(&ops),
            Err(ConstructionError::UnsupportedOperationType(t)) if t == "TRANSFER"
        ));
    }

    #[test]
    fn test_address() {
        let ops = vec![leg(0, "0x1234", "-1"), leg(1, RECEIVER, "1")];
        assert!(matches!(match_transfer(&ops), Err(ConstructionError::InvalidAddress(_))));

        let mut ops = transfer();
        ops[0].account = None;
        assert!(matches!(
            match_transfer(&ops),
            Err(ConstructionError::InvalidOperations(_))
        ));

        assert!(parse_address("57B414a0332B5CaB885a451c2a28a07d1e9b8a8d").is_err());
        assert!(parse_address("0x57b414a0332b5cab885a451c2a28a07d1e9b8a8d").is_ok());
    }
}
