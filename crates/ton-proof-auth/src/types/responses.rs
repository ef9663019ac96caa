/*
[INPUT]:  Orchestrator outcomes
[OUTPUT]: JSON response bodies for the HTTP boundary
[POS]:    Data layer - response shapes shared by server and clients
[UPDATE]: When response formats change
*/

use serde::{Deserialize, Serialize};

use super::enums::Network;

/// Body of `POST /generatePayload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratePayloadResponse {
    #[serde(rename = "tonProof")]
    pub ton_proof: String,
}

/// Successful `POST /checkProof`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckProofResponse {
    pub token: String,
}

/// Uniform failure body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub ok: bool,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ok: false,
        }
    }
}

/// Claims of a valid bearer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    pub address: String,
    pub network: Network,
    #[serde(rename = "expiresAt")]
    pub expires_at: u64,
}
