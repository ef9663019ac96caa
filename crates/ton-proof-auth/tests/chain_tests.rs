/*
[INPUT]:  Mock tonapi responses
[OUTPUT]: Test results for chain-backed key resolution
[POS]:    Integration tests - chain layer
[UPDATE]: When indexer endpoints or resolution policy change
*/

mod common;

use std::sync::Arc;

use common::{NOW, TestWallet, auth_config, setup_mock_server};
use tokio_test::assert_ok;
use ton_proof_auth::{
    AuthOrchestrator, AuthOutcome, ChainConfig, ChainError, ChainKeyResolver, FixedClock,
    Network, PublicKeyResolver, Rejection, ResolveError, TonApiClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> TonApiClient {
    assert_ok!(TonApiClient::with_config(&ChainConfig {
        mainnet_url: server.uri(),
        testnet_url: server.uri(),
        api_key: None,
        timeout_secs: 2,
        connect_timeout_secs: 1,
    }))
}

fn key_path(wallet: &TestWallet) -> String {
    format!("/v2/wallet/{}/public_key", wallet.address.to_raw_string())
}

#[test]
fn test_client_creation() {
    let _client = assert_ok!(TonApiClient::new());
}

#[test]
fn test_client_rejects_bad_url() {
    let config = ChainConfig {
        mainnet_url: "not a url".to_string(),
        ..ChainConfig::default()
    };
    assert!(matches!(
        TonApiClient::with_config(&config),
        Err(ChainError::UrlParse(_))
    ));
}

#[tokio::test]
async fn test_deployed_key_comes_from_chain() {
    let server = setup_mock_server().await;
    let wallet = TestWallet::new(21);
    Mock::given(method("GET"))
        .and(path(key_path(&wallet)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "public_key": hex::encode([0xabu8; 32]),
        })))
        .mount(&server)
        .await;

    let resolver = ChainKeyResolver::new(client(&server));
    let key = assert_ok!(
        resolver
            .resolve_public_key(&wallet.address, Network::Mainnet, Some(&wallet.state_init))
            .await
    );
    // Rotated on-chain key wins over the state-init's original key.
    assert_eq!(key, [0xab; 32]);
}

#[tokio::test]
async fn test_undeployed_falls_back_to_state_init() {
    let server = setup_mock_server().await;
    let wallet = TestWallet::new(22);
    Mock::given(method("GET"))
        .and(path(key_path(&wallet)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver = ChainKeyResolver::new(client(&server));
    let key = assert_ok!(
        resolver
            .resolve_public_key(&wallet.address, Network::Testnet, Some(&wallet.state_init))
            .await
    );
    assert_eq!(key, wallet.public_key());

    let missing = resolver
        .resolve_public_key(&wallet.address, Network::Testnet, None)
        .await;
    assert!(matches!(missing, Err(ResolveError::NotFound)));
}

#[tokio::test]
async fn test_full_flow_against_indexer() {
    let server = setup_mock_server().await;
    let wallet = TestWallet::new(23);
    Mock::given(method("GET"))
        .and(path(key_path(&wallet)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "public_key": wallet.signer.public_key_hex(),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(FixedClock::new(NOW));
    let auth = assert_ok!(AuthOrchestrator::with_clock(
        &auth_config(),
        Arc::new(ChainKeyResolver::new(client(&server))),
        clock.clone(),
    ));

    let challenge = assert_ok!(auth.issue_challenge());
    let request = wallet.proof_request(Network::Mainnet, &challenge.token, NOW, false);
    assert!(auth.check_proof_request(request).await.is_accepted());
}

#[tokio::test]
async fn test_indexer_outage_is_network_error() {
    let server = setup_mock_server().await;
    let wallet = TestWallet::new(24);
    Mock::given(method("GET"))
        .and(path(key_path(&wallet)))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let clock = Arc::new(FixedClock::new(NOW));
    let auth = assert_ok!(AuthOrchestrator::with_clock(
        &auth_config(),
        Arc::new(ChainKeyResolver::new(client(&server))),
        clock.clone(),
    ));

    let challenge = assert_ok!(auth.issue_challenge());
    let request = wallet.proof_request(Network::Mainnet, &challenge.token, NOW, true);
    assert_eq!(
        auth.check_proof_request(request).await,
        AuthOutcome::Rejected(Rejection::NetworkError)
    );
}

#[tokio::test]
async fn test_indexer_client_error_is_not_retryable() {
    let server = setup_mock_server().await;
    let wallet = TestWallet::new(25);
    Mock::given(method("GET"))
        .and(path(key_path(&wallet)))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad address"))
        .mount(&server)
        .await;

    let clock = Arc::new(FixedClock::new(NOW));
    let auth = assert_ok!(AuthOrchestrator::with_clock(
        &auth_config(),
        Arc::new(ChainKeyResolver::new(client(&server))),
        clock.clone(),
    ));

    let challenge = assert_ok!(auth.issue_challenge());
    let request = wallet.proof_request(Network::Mainnet, &challenge.token, NOW, false);
    assert_eq!(
        auth.check_proof_request(request).await,
        AuthOutcome::Rejected(Rejection::KeyResolutionFailed)
    );
}
