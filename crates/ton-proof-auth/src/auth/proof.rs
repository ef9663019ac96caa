/*
[INPUT]:  Validated proof submission, allowed domains, clock, key resolver
[OUTPUT]: Pass/fail verdict with the first failing check
[POS]:    Auth layer - TON Connect ton_proof verification
[UPDATE]: When the ton_proof message layout or check order changes
*/

use std::sync::Arc;

use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::chain::PublicKeyResolver;
use crate::clock::Clock;
use crate::error::ProofError;
use crate::ton::WalletAddress;
use crate::types::ProofSubmission;

pub const TON_PROOF_PREFIX: &[u8] = b"ton-proof-item-v2/";
pub const TON_CONNECT_PREFIX: &[u8] = b"ton-connect";
const SIGN_DATA_MAGIC: [u8; 2] = [0xff, 0xff];

/// Hash a wallet signs for a ton_proof item.
///
/// ```text
/// message = "ton-proof-item-v2/" ++ wc:i32be ++ hash:32 ++ len:u32le ++ domain ++ ts:u64le ++ payload
/// signed  = sha256(0xffff ++ "ton-connect" ++ sha256(message))
/// ```
pub fn proof_signing_hash(
    address: &WalletAddress,
    domain: &str,
    timestamp: u64,
    payload: &[u8],
) -> [u8; 32] {
    let mut message =
        Vec::with_capacity(TON_PROOF_PREFIX.len() + 4 + 32 + 4 + domain.len() + 8 + payload.len());
    message.extend_from_slice(TON_PROOF_PREFIX);
    message.extend_from_slice(&address.workchain.to_be_bytes());
    message.extend_from_slice(&address.hash);
    message.extend_from_slice(&(domain.len() as u32).to_le_bytes());
    message.extend_from_slice(domain.as_bytes());
    message.extend_from_slice(&timestamp.to_le_bytes());
    message.extend_from_slice(payload);
    let message_hash = Sha256::digest(&message);

    let mut hasher = Sha256::new();
    hasher.update(SIGN_DATA_MAGIC);
    hasher.update(TON_CONNECT_PREFIX);
    hasher.update(message_hash);
    hasher.finalize().into()
}

/// Checks ton_proof submissions against server policy
pub struct ProofVerifier {
    allowed_domains: Vec<String>,
    max_age_secs: u64,
    clock: Arc<dyn Clock>,
}

impl ProofVerifier {
    pub fn new(allowed_domains: Vec<String>, max_age_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            allowed_domains,
            max_age_secs,
            clock,
        }
    }

    /// Boolean gate; every failure reads as `false`
    pub async fn verify(
        &self,
        submission: &ProofSubmission,
        resolver: &dyn PublicKeyResolver,
    ) -> bool {
        self.check(submission, resolver).await.is_ok()
    }

    /// Run all checks in order, stopping at the first failure
    pub async fn check(
        &self,
        submission: &ProofSubmission,
        resolver: &dyn PublicKeyResolver,
    ) -> Result<WalletAddress, ProofError> {
        let proof = &submission.proof;

        let now = self.clock.now_secs();
        if now.abs_diff(proof.timestamp) > self.max_age_secs {
            return Err(ProofError::Stale {
                timestamp: proof.timestamp,
            });
        }

        if !self
            .allowed_domains
            .iter()
            .any(|domain| *domain == proof.domain.value)
        {
            return Err(ProofError::DomainNotAllowed(proof.domain.value.clone()));
        }
        if proof.domain.length_bytes as usize != proof.domain.value.len() {
            return Err(ProofError::DomainLengthMismatch {
                declared: proof.domain.length_bytes,
                actual: proof.domain.value.len(),
            });
        }

        let address = WalletAddress::parse_for_network(&submission.address, submission.network)?;

        let public_key = resolver
            .resolve_public_key(&address, submission.network, proof.state_init.as_ref())
            .await?;
        if let Some(claimed) = &submission.public_key {
            if !bool::from(claimed[..].ct_eq(&public_key[..])) {
                return Err(ProofError::PublicKeyMismatch);
            }
        }

        let signing_hash = proof_signing_hash(
            &address,
            &proof.domain.value,
            proof.timestamp,
            proof.payload.as_bytes(),
        );
        let verifying_key =
            VerifyingKey::from_bytes(&public_key).map_err(|_| ProofError::BadSignature)?;
        let signature = Signature::from_bytes(&proof.signature);
        verifying_key
            .verify_strict(&signing_hash, &signature)
            .map_err(|_| ProofError::BadSignature)?;

        debug!(address = %address, network = %submission.network, "ton_proof verified");
        Ok(address)
    }
}
