/*
[INPUT]:  Wallet secret key bytes and ton_proof fields
[OUTPUT]: Ed25519 ton_proof signatures and hex/base64 encodings
[POS]:    Auth layer - wallet-side signing, for clients and test harnesses
[UPDATE]: When the signed message layout changes
*/

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use super::proof::proof_signing_hash;
use crate::ton::WalletAddress;

/// Ed25519 key that signs ton_proof items the way TON wallets do
#[derive(Debug)]
pub struct ProofSigner {
    signing_key: SigningKey,
}

impl ProofSigner {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32 bytes)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key as hex, the `public_key` wire encoding
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Sign a ton_proof item
    pub fn sign_proof(
        &self,
        address: &WalletAddress,
        domain: &str,
        timestamp: u64,
        payload: &[u8],
    ) -> [u8; 64] {
        let hash = proof_signing_hash(address, domain, timestamp, payload);
        self.signing_key.sign(&hash).to_bytes()
    }

    /// Sign a ton_proof item and base64-encode it, the `signature` wire encoding
    pub fn sign_proof_base64(
        &self,
        address: &WalletAddress,
        domain: &str,
        timestamp: u64,
        payload: &[u8],
    ) -> String {
        BASE64.encode(self.sign_proof(address, domain, timestamp, payload))
    }
}
