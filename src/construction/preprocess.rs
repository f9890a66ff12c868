//! `/construction/preprocess`: operations to metadata options.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::construction::error::{ConstructionError, ConstructionResult};
use crate::construction::intent::match_transfer;
use crate::construction::transaction::checksum_address;
use crate::construction::{check_network, ConstructionService};
use crate::rosetta::types::{
    to_object, ConstructionPreprocessRequest, ConstructionPreprocessResponse,
};

/// Carried from Preprocess to Metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(with = "checksum_address")]
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fee_multiplier: Option<f64>,
}

/// A multiplier must be a finite, positive number.
pub fn check_multiplier(multiplier: Option<f64>) -> ConstructionResult<()> {
    match multiplier {
        Some(m) if !m.is_finite() || m <= 0.0 => Err(ConstructionError::InvalidOptions(format!(
            "suggested fee multiplier {} must be positive",
            m
        ))),
        _ => Ok(()),
    }
}

impl ConstructionService {
    pub fn preprocess(
        &self,
        request: &ConstructionPreprocessRequest,
    ) -> ConstructionResult<ConstructionPreprocessResponse> {
        check_network(self.config(), &request.network_identifier)?;
        let intent = match_transfer(&request.operations)?;
        check_multiplier(request.suggested_fee_multiplier)?;

        let options = Options {
            from: intent.from,
            suggested_fee_multiplier: request.suggested_fee_multiplier,
        };
        let options = to_object(&options).map_err(|e| ConstructionError::InvalidOptions(e.to_string()))?;
        Ok(ConstructionPreprocessResponse {
            options: Some(options),
            required_public_keys: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::intent::tests::leg;
    use crate::construction::test_support::*;

    fn request(multiplier: Option<f64>) -> ConstructionPreprocessRequest {
        ConstructionPreprocessRequest {
            network_identifier: network(),
            operations: vec![
                leg(0, SENDER, "-42894881044106498"),
                leg(1, RECEIVER, "42894881044106498"),
            ],
            metadata: None,
            max_fee: None,
            suggested_fee_multiplier: multiplier,
        }
    }

    #[test]
    fn test_preprocess_options() {
        let response = offline().preprocess(&request(None)).unwrap();
        let options = serde_json::to_string(&response.options.unwrap()).unwrap();
        assert_eq!(options, r#"{"from":"0xe3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309"}"#);
        assert!(response.required_public_keys.is_none());
    }

    #[test]
    fn test_preprocess_carries_multiplier() {
        let response = offline().preprocess(&request(Some(1.5))).unwrap();
        let options = response.options.unwrap();
        assert_eq!(options["suggested_fee_multiplier"], serde_json::json!(1.5));
    }

    #[test]
    fn test_preprocess_rejects_bad_multiplier() {
        for m in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                offline().preprocess(&request(Some(m))),
                Err(ConstructionError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn test_preprocess_validates_intent() {
        let mut req = request(None);
        req.operations.pop();
        assert!(matches!(
            offline().preprocess(&req),
            Err(ConstructionError::InvalidOperationCount(1))
        ));
    }
}
