/*
[INPUT]:  Wallet address, network, optional client-supplied state-init
[OUTPUT]: The wallet's current public key, or a classified failure
[POS]:    Chain layer - public key resolution for proof verification
[UPDATE]: When key sources or the deployed/undeployed policy change
*/

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::client::ChainClient;
use crate::error::{ChainError, ResolveError};
use crate::ton::{StateInit, WalletAddress};
use crate::types::Network;

/// Capability the proof verifier uses to obtain a wallet key
#[async_trait]
pub trait PublicKeyResolver: Send + Sync {
    async fn resolve_public_key(
        &self,
        address: &WalletAddress,
        network: Network,
        state_init: Option<&StateInit>,
    ) -> Result<[u8; 32], ResolveError>;
}

/// Key from a not-yet-deployed wallet's state-init, which must hash to `address`
pub fn key_from_state_init(
    address: &WalletAddress,
    state_init: Option<&StateInit>,
) -> Result<[u8; 32], ResolveError> {
    let state_init = state_init.ok_or(ResolveError::NotFound)?;
    if !state_init.matches_address(address) {
        return Err(ResolveError::StateInitMismatch);
    }
    state_init
        .wallet_public_key()
        .map_err(|e| ResolveError::UnsupportedStateInit(e.to_string()))
}

/// Resolves keys from chain state, falling back to state-init for undeployed wallets
#[derive(Debug, Clone)]
pub struct ChainKeyResolver<C> {
    client: C,
}

impl<C: ChainClient> ChainKeyResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: ChainClient> PublicKeyResolver for ChainKeyResolver<C> {
    async fn resolve_public_key(
        &self,
        address: &WalletAddress,
        network: Network,
        state_init: Option<&StateInit>,
    ) -> Result<[u8; 32], ResolveError> {
        match self.client.get_account_public_key(address, network).await {
            Ok(Some(key)) => {
                debug!(address = %address, network = %network, "resolved key from chain state");
                Ok(key)
            }
            Ok(None) => {
                debug!(
                    address = %address,
                    network = %network,
                    has_state_init = state_init.is_some(),
                    "account not deployed, using state-init"
                );
                key_from_state_init(address, state_init)
            }
            Err(e) => {
                warn!(address = %address, network = %network, error = %e, "chain key query failed");
                Err(ResolveError::Network(e))
            }
        }
    }
}

/// In-memory resolver for tests and local development
#[derive(Debug, Clone, Default)]
pub struct MockKeyResolver {
    keys: HashMap<WalletAddress, [u8; 32]>,
    unreachable: bool,
}

impl MockKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `address` as deployed with `key`
    pub fn with_key(mut self, address: WalletAddress, key: [u8; 32]) -> Self {
        self.keys.insert(address, key);
        self
    }

    /// Fail every lookup with a timeout
    pub fn unreachable() -> Self {
        Self {
            keys: HashMap::new(),
            unreachable: true,
        }
    }
}

#[async_trait]
impl PublicKeyResolver for MockKeyResolver {
    async fn resolve_public_key(
        &self,
        address: &WalletAddress,
        _network: Network,
        state_init: Option<&StateInit>,
    ) -> Result<[u8; 32], ResolveError> {
        if self.unreachable {
            return Err(ResolveError::Network(ChainError::Timeout { duration: 0 }));
        }
        match self.keys.get(address) {
            Some(key) => Ok(*key),
            None => key_from_state_init(address, state_init),
        }
    }
}
