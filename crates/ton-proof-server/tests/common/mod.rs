/*
[INPUT]:  Auth configuration and a key resolver (in-memory or indexer-backed)
[OUTPUT]: A router bound to an ephemeral port plus signing helpers
[POS]:    Test infrastructure - shared across server test modules
[UPDATE]: When routes or fixtures change
*/

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use ton_proof_auth::{
    AuthConfig, AuthOrchestrator, FixedClock, MockKeyResolver, ProofSigner, PublicKeyResolver,
    WalletAddress,
};
use ton_proof_server::{AppState, router};

pub const SECRET: &str = "server-secret-0123456789abcdef-0123456789";
pub const DOMAIN: &str = "app.example";
pub const NOW: u64 = 1_700_000_000;

pub struct TestServer {
    pub base_url: String,
    pub clock: Arc<FixedClock>,
    pub signer: ProofSigner,
    pub address: WalletAddress,
}

pub fn test_signer() -> ProofSigner {
    ProofSigner::from_secret_key(&[7u8; 32])
}

pub fn test_address() -> WalletAddress {
    WalletAddress::new(0, [0x33; 32])
}

/// Serve the router on 127.0.0.1:0 with one known deployed wallet
pub async fn spawn_server(resolver: MockKeyResolver) -> TestServer {
    let resolver = resolver.with_key(test_address(), test_signer().public_key_bytes());
    spawn_server_with(Arc::new(resolver)).await
}

/// Serve the router over an arbitrary key resolver
pub async fn spawn_server_with(resolver: Arc<dyn PublicKeyResolver>) -> TestServer {
    let signer = test_signer();
    let address = test_address();

    let clock = Arc::new(FixedClock::new(NOW));
    let auth = AuthOrchestrator::with_clock(
        &AuthConfig::new(SECRET, vec![DOMAIN.to_string()]),
        resolver,
        clock.clone(),
    )
    .expect("orchestrator");

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(AppState::new(auth)))
            .await
            .expect("serve");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        clock,
        signer,
        address,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// checkProof body for `challenge`, signed at the current test time
    pub fn proof_body(&self, challenge: &str) -> serde_json::Value {
        let timestamp = NOW;
        let signature =
            self.signer
                .sign_proof_base64(&self.address, DOMAIN, timestamp, challenge.as_bytes());
        serde_json::json!({
            "address": self.address.to_raw_string(),
            "network": "-239",
            "public_key": self.signer.public_key_hex(),
            "proof": {
                "timestamp": timestamp,
                "domain": { "lengthBytes": DOMAIN.len(), "value": DOMAIN },
                "payload": challenge,
                "signature": signature,
            }
        })
    }
}
