/*
[INPUT]:  Indexer configuration (base URLs per network, timeouts, API key)
[OUTPUT]: Current on-chain wallet public keys, or "not deployed"
[POS]:    Chain layer - tonapi.io HTTP client implementing the chain-query contract
[UPDATE]: When switching indexers or adding account queries
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::ton::WalletAddress;
use crate::types::Network;

/// Chain-state queries used by key resolution
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Key reported by the wallet's `get_public_key` method; `None` when the
    /// account is not deployed or exposes no key
    async fn get_account_public_key(
        &self,
        address: &WalletAddress,
        network: Network,
    ) -> Result<Option<[u8; 32]>, ChainError>;
}

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    public_key: String,
}

/// tonapi.io client
#[derive(Debug, Clone)]
pub struct TonApiClient {
    http_client: Client,
    mainnet_url: Url,
    testnet_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl TonApiClient {
    /// Create a new client with default endpoints
    pub fn new() -> Result<Self, ChainError> {
        Self::with_config(&ChainConfig::default())
    }

    pub fn with_config(config: &ChainConfig) -> Result<Self, ChainError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http_client,
            mainnet_url: Url::parse(&config.mainnet_url)?,
            testnet_url: Url::parse(&config.testnet_url)?,
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            timeout: config.timeout(),
        })
    }

    fn base_url(&self, network: Network) -> &Url {
        match network {
            Network::Mainnet => &self.mainnet_url,
            Network::Testnet => &self.testnet_url,
        }
    }

    fn request(
        &self,
        method: Method,
        network: Network,
        endpoint: &str,
    ) -> Result<RequestBuilder, ChainError> {
        let url = self.base_url(network).join(endpoint)?;
        let builder = self.http_client.request(method, url);
        Ok(match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ChainError> {
        match tokio::time::timeout(self.timeout, builder.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) if e.is_timeout() => Err(ChainError::Timeout {
                duration: self.timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(ChainError::Http(e)),
            Err(_) => Err(ChainError::Timeout {
                duration: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ChainClient for TonApiClient {
    /// GET /v2/wallet/{account_id}/public_key
    async fn get_account_public_key(
        &self,
        address: &WalletAddress,
        network: Network,
    ) -> Result<Option<[u8; 32]>, ChainError> {
        let endpoint = format!("/v2/wallet/{}/public_key", address.to_raw_string());
        let builder = self.request(Method::GET, network, &endpoint)?;
        let response = self.send(builder).await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(address = %address, network = %network, "wallet public key not found on chain");
                Ok(None)
            }
            status if status.is_success() => {
                let body: PublicKeyResponse = response.json().await?;
                let mut key = [0u8; 32];
                hex::decode_to_slice(body.public_key.trim(), &mut key).map_err(|e| {
                    ChainError::InvalidResponse(format!("public_key is not 32 hex bytes: {e}"))
                })?;
                Ok(Some(key))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(ChainError::Api {
                    code: status.as_u16(),
                    message,
                })
            }
        }
    }
}
