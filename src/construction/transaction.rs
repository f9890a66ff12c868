//! Wire codecs for the intermediate construction artifacts.
//!
//! # Data Flow
//! ```text
//! Payloads → UnsignedTransaction (JSON string) ─┐
//!                                               ├→ TxLegacy → signing hash
//! Combine  → SignedTransaction  (JSON string) ──┘            → Signed<TxLegacy> → tx hash
//! ```
//!
//! Integers are minimal lowercase `0x` hex. The unsigned form carries
//! checksummed addresses; the signed form mirrors the node's own JSON
//! encoding of a legacy transaction, where `to` is lowercase.

use alloy::consensus::{SignableTransaction, Signed, TxLegacy};
use alloy::primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use serde::{Deserialize, Serialize};

use crate::construction::error::{ConstructionError, ConstructionResult};

/// Hex quantity encoding shared by options, metadata and transactions.
pub mod quantity {
    use alloy::primitives::U256;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub trait Quantity: Sized {
        fn to_hex(&self) -> String;
        fn from_hex_digits(digits: &str) -> Result<Self, String>;
    }

    impl Quantity for u64 {
        fn to_hex(&self) -> String {
            format!("{:#x}", self)
        }

        fn from_hex_digits(digits: &str) -> Result<Self, String> {
            u64::from_str_radix(digits, 16).map_err(|e| e.to_string())
        }
    }

    impl Quantity for U256 {
        fn to_hex(&self) -> String {
            format!("0x{:x}", self)
        }

        fn from_hex_digits(digits: &str) -> Result<Self, String> {
            U256::from_str_radix(digits, 16).map_err(|e| e.to_string())
        }
    }

    /// Parse `0x`-prefixed hex; digits may be any case.
    pub fn parse<T: Quantity>(s: &str) -> Result<T, String> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| format!("{} is missing the 0x prefix", s))?;
        if digits.is_empty() {
            return Err(format!("{} has no digits", s));
        }
        T::from_hex_digits(digits).map_err(|e| format!("{}: {}", s, e))
    }

    pub fn format<T: Quantity>(value: &T) -> String {
        value.to_hex()
    }

    pub fn serialize<T: Quantity, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_hex())
    }

    pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(D::Error::custom)
    }

    /// `null`-preserving variant.
    pub mod option {
        use super::Quantity;
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

        pub fn serialize<T: Quantity, S: Serializer>(
            value: &Option<T>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.to_hex()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, T: Quantity, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<T>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::parse(&s).map(Some).map_err(D::Error::custom),
                None => Ok(None),
            }
        }
    }
}

/// EIP-55 checksummed address encoding.
pub mod checksum_address {
    use alloy::primitives::Address;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address.to_checksum(None))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Lowercase address encoding, as the node emits it.
pub mod lowercase_address {
    use alloy::primitives::{hex, Address};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_prefixed(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Transfer awaiting a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    #[serde(with = "checksum_address")]
    pub from: Address,
    #[serde(with = "checksum_address")]
    pub to: Address,
    #[serde(with = "quantity")]
    pub value: U256,
    pub data: Bytes,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(with = "quantity")]
    pub gas_price: U256,
    #[serde(with = "quantity")]
    pub gas: u64,
    #[serde(with = "quantity")]
    pub chain_id: u64,
}

impl UnsignedTransaction {
    pub fn decode(raw: &str) -> ConstructionResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ConstructionError::MalformedTransaction(format!("unsigned transaction: {}", e)))
    }

    pub fn encode(&self) -> ConstructionResult<String> {
        serde_json::to_string(self).map_err(|e| ConstructionError::MalformedTransaction(e.to_string()))
    }

    /// EIP-155 protected legacy transaction.
    pub fn to_tx_legacy(&self) -> ConstructionResult<TxLegacy> {
        let gas_price = u128::try_from(self.gas_price).map_err(|_| {
            ConstructionError::MalformedTransaction(format!("gas price {} overflows", self.gas_price))
        })?;
        Ok(TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price,
            gas_limit: self.gas,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.data.clone(),
        })
    }

    /// keccak256 of `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self) -> ConstructionResult<B256> {
        Ok(self.to_tx_legacy()?.signature_hash())
    }
}

/// Signed legacy transaction in the node's JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    #[serde(rename = "type", with = "quantity")]
    pub tx_type: u64,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(with = "quantity")]
    pub gas_price: U256,
    #[serde(default, with = "quantity::option")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, with = "quantity::option")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(with = "quantity")]
    pub gas: u64,
    #[serde(with = "quantity")]
    pub value: U256,
    pub input: Bytes,
    #[serde(with = "quantity")]
    pub v: U256,
    #[serde(with = "quantity")]
    pub r: U256,
    #[serde(with = "quantity")]
    pub s: U256,
    #[serde(with = "lowercase_address")]
    pub to: Address,
    /// Informational only; readers recompute it.
    #[serde(default)]
    pub hash: B256,
}

const LEGACY_TX_TYPE: u64 = 0;

impl SignedTransaction {
    pub fn decode(raw: &str) -> ConstructionResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ConstructionError::MalformedTransaction(format!("signed transaction: {}", e)))
    }

    pub fn encode(&self) -> ConstructionResult<String> {
        serde_json::to_string(self).map_err(|e| ConstructionError::MalformedTransaction(e.to_string()))
    }

    /// Build the wire form from a signed legacy transaction.
    pub fn from_signed(signed: &Signed<TxLegacy>) -> ConstructionResult<Self> {
        let tx = signed.tx();
        let to = match tx.to {
            TxKind::Call(to) => to,
            TxKind::Create => {
                return Err(ConstructionError::MalformedTransaction(
                    "contract creation is not a transfer".to_string(),
                ))
            }
        };
        let signature = signed.signature();
        Ok(Self {
            tx_type: LEGACY_TX_TYPE,
            nonce: tx.nonce,
            gas_price: U256::from(tx.gas_price),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas: tx.gas_limit,
            value: tx.value,
            input: tx.input.clone(),
            v: encode_v(signature.v(), tx.chain_id),
            r: signature.r(),
            s: signature.s(),
            to,
            hash: *signed.hash(),
        })
    }

    /// Rebuild the signed legacy transaction. The embedded `hash` is ignored.
    pub fn to_signed(&self) -> ConstructionResult<Signed<TxLegacy>> {
        if self.tx_type != LEGACY_TX_TYPE {
            return Err(ConstructionError::MalformedTransaction(format!(
                "unsupported transaction type {:#x}",
                self.tx_type
            )));
        }
        let (y_parity, chain_id) = decode_v(self.v)?;
        let gas_price = u128::try_from(self.gas_price).map_err(|_| {
            ConstructionError::MalformedTransaction(format!("gas price {} overflows", self.gas_price))
        })?;
        let tx = TxLegacy {
            chain_id,
            nonce: self.nonce,
            gas_price,
            gas_limit: self.gas,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.input.clone(),
        };
        let signature = Signature::new(self.r, self.s, y_parity);
        Ok(tx.into_signed(signature))
    }
}

/// `v = chain_id * 2 + 35 + parity` when protected, else `27 + parity`.
pub fn encode_v(y_parity: bool, chain_id: Option<u64>) -> U256 {
    let parity = U256::from(y_parity as u8);
    match chain_id {
        Some(id) => U256::from(id) * U256::from(2) + U256::from(35) + parity,
        None => U256::from(27) + parity,
    }
}

/// Inverse of [`encode_v`]: `(parity, chain id)`.
pub fn decode_v(v: U256) -> ConstructionResult<(bool, Option<u64>)> {
    let v = u64::try_from(v)
        .map_err(|_| ConstructionError::MalformedTransaction(format!("v {} out of range", v)))?;
    match v {
        27 | 28 => Ok((v == 28, None)),
        v if v >= 35 => Ok(((v - 35) % 2 == 1, Some((v - 35) / 2))),
        v => Err(ConstructionError::MalformedTransaction(format!(
            "invalid v {:#x}",
            v
        ))),
    }
}
