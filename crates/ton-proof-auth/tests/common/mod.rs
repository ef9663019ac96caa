/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, wallets, and proof builders
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for ton-proof-auth tests

#![allow(dead_code)]

use std::sync::Arc;

use ton_proof_auth::ton::{Cell, CellBuilder, StateInit};
use ton_proof_auth::{
    AuthConfig, CheckProofRequest, DomainRequest, Network, ProofRequest, ProofSigner,
    WalletAddress,
};
use wiremock::MockServer;

pub const SECRET: &str = "test-secret-0123456789abcdef-0123456789";
pub const DOMAIN: &str = "ton-connect.github.io";
pub const NOW: u64 = 1_700_000_000;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(SECRET, vec![DOMAIN.to_string()])
}

/// Wallet with a deterministic key and a v4-shaped state-init
pub struct TestWallet {
    pub signer: ProofSigner,
    pub state_init: StateInit,
    pub address: WalletAddress,
}

impl TestWallet {
    pub fn new(seed: u8) -> Self {
        let signer = ProofSigner::from_secret_key(&[seed; 32]);
        let state_init = wallet_state_init(signer.public_key_bytes());
        let address = state_init.address(0);
        Self {
            signer,
            state_init,
            address,
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signer.public_key_bytes()
    }

    /// Wire-form checkProof body signing `challenge` at `timestamp`
    pub fn proof_request(
        &self,
        network: Network,
        challenge: &str,
        timestamp: u64,
        with_state_init: bool,
    ) -> CheckProofRequest {
        let signature =
            self.signer
                .sign_proof_base64(&self.address, DOMAIN, timestamp, challenge.as_bytes());
        let state_init = with_state_init.then(|| {
            self.state_init
                .to_boc_base64()
                .expect("state-init serializes")
        });

        CheckProofRequest {
            address: self.address.to_raw_string(),
            network: network.to_string(),
            public_key: Some(self.signer.public_key_hex()),
            proof: Some(ProofRequest {
                timestamp: Some(timestamp),
                domain: Some(DomainRequest {
                    length_bytes: Some(DOMAIN.len() as u32),
                    value: DOMAIN.to_string(),
                }),
                payload: challenge.to_string(),
                signature,
                state_init,
            }),
        }
    }
}

/// Code cell stand-in plus wallet v4 data (seqno, subwallet, key, empty plugins)
pub fn wallet_state_init(public_key: [u8; 32]) -> StateInit {
    let mut code = CellBuilder::new();
    code.store_uint(0xff00_f4a4, 32).expect("code bits");
    let mut data = CellBuilder::new();
    data.store_uint(0, 32).expect("seqno");
    data.store_uint(698_983_191, 32).expect("subwallet");
    data.store_bytes(&public_key).expect("key");
    data.store_bit(false).expect("plugins");

    let code: Arc<Cell> = Arc::new(code.build().expect("code cell"));
    let data: Arc<Cell> = Arc::new(data.build().expect("data cell"));
    StateInit::new(code, data).expect("state-init")
}
