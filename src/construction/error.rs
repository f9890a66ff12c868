//! Construction errors and the Rosetta error catalogue.

use serde_json::json;
use thiserror::Error;

use crate::blockchain::types::ClientError;
use crate::rosetta::types::{Error as RosettaError, Object};

/// Rosetta error categories published in `/network/options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unimplemented,
    UnavailableOffline,
    Findora,
    UnableToDecompressPubkey,
    UnableToParseIntent,
    UnableToParseIntermediateResult,
    SignatureInvalid,
    BroadcastFailed,
    InvalidAddress,
    InvalidInput,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::Unimplemented,
        ErrorKind::UnavailableOffline,
        ErrorKind::Findora,
        ErrorKind::UnableToDecompressPubkey,
        ErrorKind::UnableToParseIntent,
        ErrorKind::UnableToParseIntermediateResult,
        ErrorKind::SignatureInvalid,
        ErrorKind::BroadcastFailed,
        ErrorKind::InvalidAddress,
        ErrorKind::InvalidInput,
    ];

    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::Unimplemented => 0,
            ErrorKind::UnavailableOffline => 1,
            ErrorKind::Findora => 2,
            ErrorKind::UnableToDecompressPubkey => 3,
            ErrorKind::UnableToParseIntent => 4,
            ErrorKind::UnableToParseIntermediateResult => 5,
            ErrorKind::SignatureInvalid => 6,
            ErrorKind::BroadcastFailed => 7,
            ErrorKind::InvalidAddress => 12,
            ErrorKind::InvalidInput => 14,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Unimplemented => "Endpoint not implemented",
            ErrorKind::UnavailableOffline => "Endpoint unavailable offline",
            ErrorKind::Findora => "Findora error",
            ErrorKind::UnableToDecompressPubkey => "Unable to decompress public key",
            ErrorKind::UnableToParseIntent => "Unable to parse intent",
            ErrorKind::UnableToParseIntermediateResult => "Unable to parse intermediate result",
            ErrorKind::SignatureInvalid => "Signature invalid",
            ErrorKind::BroadcastFailed => "Unable to broadcast transaction",
            ErrorKind::InvalidAddress => "Invalid address",
            ErrorKind::InvalidInput => "Unable to process input",
        }
    }

    /// Only node communication failures are worth retrying.
    pub fn retriable(&self) -> bool {
        matches!(self, ErrorKind::Findora)
    }

    /// Catalogue entry without request-specific details.
    pub fn to_rosetta(&self) -> RosettaError {
        RosettaError {
            code: self.code(),
            message: self.message().to_string(),
            description: None,
            retriable: self.retriable(),
            details: None,
        }
    }
}

/// Every error a construction stage or read service can return.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("network identifier does not match the configured network")]
    NetworkMismatch,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("expected 2 operations, got {0}")]
    InvalidOperationCount(usize),

    #[error("operation amounts must be non-zero, opposite and sum to zero")]
    UnbalancedAmounts,

    #[error("operations must use the native currency")]
    CurrencyMismatch,

    #[error("unsupported operation type {0}")]
    UnsupportedOperationType(String),

    #[error("invalid operations: {0}")]
    InvalidOperations(String),

    #[error("{0} is not a valid address")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("unsupported curve type")]
    UnsupportedCurveType,

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("expected 1 signature, got {0}")]
    InvalidSignatureCount(usize),

    #[error("unsupported signature type")]
    UnsupportedSignatureType,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing payload does not match the unsigned transaction")]
    SignaturePayloadMismatch,

    #[error("chain id mismatch: expected {expected}, got {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("unable to recover signer: {0}")]
    SignatureRecovery(String),

    #[error("endpoint unavailable offline")]
    OfflineModeUnavailable,

    #[error("node communication failed: {0}")]
    ClientCommunication(#[source] ClientError),

    #[error("unable to submit transaction: {0}")]
    Submission(#[source] ClientError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("endpoint not implemented")]
    Unimplemented,
}

impl ConstructionError {
    pub fn kind(&self) -> ErrorKind {
        use ConstructionError::*;
        match self {
            Unimplemented => ErrorKind::Unimplemented,
            OfflineModeUnavailable => ErrorKind::UnavailableOffline,
            ClientCommunication(_) | Cancelled | DeadlineExceeded => ErrorKind::Findora,
            InvalidPublicKey(_) | UnsupportedCurveType => ErrorKind::UnableToDecompressPubkey,
            InvalidOperationCount(_)
            | UnbalancedAmounts
            | CurrencyMismatch
            | UnsupportedOperationType(_)
            | InvalidOperations(_)
            | InvalidAmount(_) => ErrorKind::UnableToParseIntent,
            InvalidOptions(_)
            | InvalidMetadata(_)
            | MalformedTransaction(_)
            | ChainIdMismatch { .. } => ErrorKind::UnableToParseIntermediateResult,
            InvalidSignatureCount(_)
            | UnsupportedSignatureType
            | InvalidSignature(_)
            | SignaturePayloadMismatch
            | SignatureRecovery(_) => ErrorKind::SignatureInvalid,
            Submission(_) => ErrorKind::BroadcastFailed,
            InvalidAddress(_) => ErrorKind::InvalidAddress,
            NetworkMismatch | InvalidRequest(_) => ErrorKind::InvalidInput,
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    pub fn retriable(&self) -> bool {
        self.kind().retriable()
    }

    /// Rosetta error body; the cause goes into `details.context`.
    pub fn to_rosetta(&self) -> RosettaError {
        let mut details = Object::new();
        details.insert("context".to_string(), json!(self.to_string()));
        RosettaError {
            details: Some(details),
            ..self.kind().to_rosetta()
        }
    }
}

/// The full catalogue, in code order.
pub fn all_errors() -> Vec<RosettaError> {
    ErrorKind::ALL.iter().map(ErrorKind::to_rosetta).collect()
}

pub type ConstructionResult<T> = Result<T, ConstructionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ConstructionError::Unimplemented.code(), 0);
        assert_eq!(ConstructionError::OfflineModeUnavailable.code(), 1);
        assert_eq!(ConstructionError::Cancelled.code(), 2);
        assert_eq!(ConstructionError::UnsupportedCurveType.code(), 3);
        assert_eq!(ConstructionError::UnbalancedAmounts.code(), 4);
        assert_eq!(
            ConstructionError::ChainIdMismatch { expected: 3, actual: 2152 }.code(),
            5
        );
        assert_eq!(ConstructionError::SignaturePayloadMismatch.code(), 6);
        assert_eq!(
            ConstructionError::Submission(ClientError::Rejected("nonce too low".into())).code(),
            7
        );
        assert_eq!(ConstructionError::InvalidAddress("0x12".into()).code(), 12);
        assert_eq!(ConstructionError::NetworkMismatch.code(), 14);
    }

    #[test]
    fn test_only_node_failures_retriable() {
        assert!(ConstructionError::ClientCommunication(ClientError::Timeout(5)).retriable());
        assert!(ConstructionError::DeadlineExceeded.retriable());
        assert!(!ConstructionError::Submission(ClientError::Rpc("down".into())).retriable());
        assert!(!ConstructionError::InvalidSignatureCount(2).retriable());
    }

    #[test]
    fn test_rosetta_body_carries_context() {
        let err = ConstructionError::ClientCommunication(ClientError::Rpc("connection refused".into()));
        let body = err.to_rosetta();
        assert_eq!(body.code, 2);
        assert_eq!(body.message, "Findora error");
        assert!(body.retriable);
        let context = body.details.unwrap()["context"].as_str().unwrap().to_string();
        assert!(context.contains("connection refused"));
    }

    #[test]
    fn test_catalogue() {
        let errors = all_errors();
        assert_eq!(errors.len(), ErrorKind::ALL.len());
        let codes: Vec<i32> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, 6, 7, 12, 14]);
        assert!(errors.iter().all(|e| e.details.is_none()));
    }
}
