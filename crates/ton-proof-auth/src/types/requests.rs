/*
[INPUT]:  Untrusted checkProof request bodies
[OUTPUT]: Typed proof submissions or collected field errors
[POS]:    Data layer - schema validation before any core logic runs
[UPDATE]: When the checkProof wire format changes
*/

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::enums::Network;
use crate::error::ValidationErrors;
use crate::ton::StateInit;

/// Wire form of `POST /checkProof`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckProofRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default)]
    pub proof: Option<ProofRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofRequest {
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub domain: Option<DomainRequest>,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_init: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRequest {
    #[serde(rename = "lengthBytes", default)]
    pub length_bytes: Option<u32>,
    #[serde(default)]
    pub value: String,
}

/// Validated proof submission
#[derive(Debug, Clone, PartialEq)]
pub struct ProofSubmission {
    /// Address as submitted; parsed by the verifier
    pub address: String,
    pub network: Network,
    /// Advisory key claimed by the client
    pub public_key: Option<[u8; 32]>,
    pub proof: TonProof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TonProof {
    pub timestamp: u64,
    pub domain: Domain,
    /// Challenge token string exactly as issued
    pub payload: String,
    pub signature: [u8; 64],
    pub state_init: Option<StateInit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub length_bytes: u32,
    pub value: String,
}

impl Domain {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            length_bytes: value.len() as u32,
            value,
        }
    }
}

impl CheckProofRequest {
    /// Check shape and encodings, collecting every violation
    pub fn validate(self) -> Result<ProofSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let address = self.address.trim().to_string();
        if address.is_empty() {
            errors.push("address", "is required");
        }

        let network = match self.network.parse::<Network>() {
            Ok(network) => Some(network),
            Err(message) => {
                errors.push("network", message);
                None
            }
        };

        let public_key = match self.public_key.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => match decode_hex_array::<32>(encoded) {
                Some(key) => Some(key),
                None => {
                    errors.push("public_key", "must be 32 hex-encoded bytes");
                    None
                }
            },
        };

        let proof = match self.proof {
            Some(proof) => validate_proof(proof, &mut errors),
            None => {
                errors.push("proof", "is required");
                None
            }
        };

        match (network, proof) {
            (Some(network), Some(proof)) if errors.is_empty() => Ok(ProofSubmission {
                address,
                network,
                public_key,
                proof,
            }),
            _ => Err(errors),
        }
    }
}

fn validate_proof(proof: ProofRequest, errors: &mut ValidationErrors) -> Option<TonProof> {
    let timestamp = proof.timestamp;
    if timestamp.is_none() {
        errors.push("proof.timestamp", "is required");
    }

    let domain = match proof.domain {
        Some(DomainRequest {
            length_bytes: Some(length_bytes),
            value,
        }) if !value.is_empty() => Some(Domain {
            length_bytes,
            value,
        }),
        Some(_) => {
            errors.push("proof.domain", "lengthBytes and value are required");
            None
        }
        None => {
            errors.push("proof.domain", "is required");
            None
        }
    };

    if proof.payload.is_empty() {
        errors.push("proof.payload", "is required");
    }

    let signature = STANDARD
        .decode(proof.signature.trim())
        .ok()
        .and_then(|bytes| <[u8; 64]>::try_from(bytes).ok());
    if signature.is_none() {
        errors.push("proof.signature", "must be 64 base64-encoded bytes");
    }

    let state_init = match proof.state_init.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(encoded) => match StateInit::from_boc_base64(encoded) {
            Ok(state_init) => Some(state_init),
            Err(e) => {
                errors.push("proof.state_init", e.to_string());
                None
            }
        },
    };

    Some(TonProof {
        timestamp: timestamp?,
        domain: domain?,
        payload: proof.payload,
        signature: signature?,
        state_init,
    })
}

fn decode_hex_array<const N: usize>(encoded: &str) -> Option<[u8; N]> {
    let encoded = encoded.strip_prefix("0x").unwrap_or(encoded);
    let mut out = [0u8; N];
    hex::decode_to_slice(encoded, &mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> serde_json::Value {
        serde_json::json!({
            "address": "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8",
            "network": "-239",
            "public_key": "aa".repeat(32),
            "proof": {
                "timestamp": 1_700_000_000u64,
                "domain": { "lengthBytes": 21, "value": "ton-connect.github.io" },
                "payload": "challenge-token",
                "signature": STANDARD.encode([1u8; 64]),
            }
        })
    }

    #[test]
    fn test_valid_request() {
        let request: CheckProofRequest = serde_json::from_value(valid_json()).unwrap();
        let submission = request.validate().unwrap();

        assert_eq!(submission.network, Network::Mainnet);
        assert_eq!(submission.public_key, Some([0xaa; 32]));
        assert_eq!(submission.proof.domain.length_bytes, 21);
        assert_eq!(submission.proof.signature, [1u8; 64]);
        assert!(submission.proof.state_init.is_none());
    }

    #[test]
    fn test_empty_body_reports_every_missing_field() {
        let request: CheckProofRequest = serde_json::from_str("{}").unwrap();
        let errors = request.validate().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();

        assert_eq!(fields, vec!["address", "network", "proof"]);
    }

    #[test]
    fn test_bad_encodings_are_field_errors() {
        let mut body = valid_json();
        body["network"] = serde_json::json!("42");
        body["public_key"] = serde_json::json!("xyz");
        body["proof"]["signature"] = serde_json::json!("c2hvcnQ=");
        body["proof"]["state_init"] = serde_json::json!("not-a-boc");

        let request: CheckProofRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();

        assert_eq!(
            fields,
            vec![
                "network",
                "public_key",
                "proof.signature",
                "proof.state_init"
            ]
        );
    }

    #[test]
    fn test_overdeep_state_init_is_field_error() {
        // StateInit root `0 0 1 0 0`: code ref only, heading a long chain
        let boc = crate::ton::cell::chain_boc(&[0x24], 1, 50_000);
        let mut body = valid_json();
        body["proof"]["state_init"] = serde_json::json!(STANDARD.encode(boc));

        let request: CheckProofRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["proof.state_init"]);
    }

    #[test]
    fn test_shallow_state_init_chain_is_accepted() {
        let boc = crate::ton::cell::chain_boc(&[0x24], 1, 8);
        let mut body = valid_json();
        body["proof"]["state_init"] = serde_json::json!(STANDARD.encode(boc));

        let request: CheckProofRequest = serde_json::from_value(body).unwrap();
        let submission = request.validate().unwrap();
        let state_init = submission.proof.state_init.unwrap();
        assert_eq!(state_init.code.unwrap().depth(), 7);
        assert!(state_init.data.is_none());
    }

    #[test]
    fn test_missing_domain_length() {
        let mut body = valid_json();
        body["proof"]["domain"] = serde_json::json!({ "value": "example.com" });

        let request: CheckProofRequest = serde_json::from_value(body).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["proof.domain"]);
    }

    #[test]
    fn test_domain_new_counts_bytes() {
        let domain = Domain::new("bücher.example");
        assert_eq!(domain.length_bytes, 15);
    }
}
