/*
[INPUT]:  Deserialized configuration values (file and environment)
[OUTPUT]: Validated auth and chain settings
[POS]:    Configuration layer - immutable settings injected at construction
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{AuthError, Result};

pub const MIN_SECRET_BYTES: usize = 32;

/// Token and proof settings
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for challenge and session tokens
    pub secret: SecretString,
    /// Domains a proof may be bound to
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Tolerated distance between proof timestamp and server time
    #[serde(default = "default_proof_max_age_secs")]
    pub proof_max_age_secs: u64,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, allowed_domains: Vec<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            allowed_domains,
            challenge_ttl_secs: default_challenge_ttl_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            proof_max_age_secs: default_proof_max_age_secs(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret.expose_secret().len() < MIN_SECRET_BYTES {
            return Err(AuthError::Config(format!(
                "auth.secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        if self.allowed_domains.iter().all(|domain| domain.trim().is_empty()) {
            return Err(AuthError::Config(
                "auth.allowed_domains must list at least one domain".to_string(),
            ));
        }
        if self.challenge_ttl_secs == 0 || self.session_ttl_secs == 0 {
            return Err(AuthError::Config("token TTLs must be positive".to_string()));
        }
        if self.session_ttl_secs < self.challenge_ttl_secs {
            return Err(AuthError::Config(
                "auth.session_ttl_secs must not be shorter than auth.challenge_ttl_secs"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Chain indexer endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_mainnet_url")]
    pub mainnet_url: String,
    #[serde(default = "default_testnet_url")]
    pub testnet_url: String,
    /// Optional bearer token for the indexer
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ChainConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            mainnet_url: default_mainnet_url(),
            testnet_url: default_testnet_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_challenge_ttl_secs() -> u64 {
    15 * 60
}

fn default_session_ttl_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_proof_max_age_secs() -> u64 {
    15 * 60
}

fn default_mainnet_url() -> String {
    "https://tonapi.io".to_string()
}

fn default_testnet_url() -> String {
    "https://testnet.tonapi.io".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: AuthConfig = serde_json::from_value(serde_json::json!({
            "secret": SECRET,
            "allowed_domains": ["example.com"],
        }))
        .unwrap();

        assert_eq!(config.challenge_ttl_secs, 900);
        assert_eq!(config.session_ttl_secs, 31_536_000);
        assert_eq!(config.proof_max_age_secs, 900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = AuthConfig::new("short", vec!["example.com".to_string()]);
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_missing_domains_rejected() {
        let config = AuthConfig::new(SECRET, vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig::new(SECRET, vec!["example.com".to_string()]);
        assert!(!format!("{config:?}").contains(SECRET));
    }

    #[test]
    fn test_chain_defaults() {
        let config = ChainConfig::default();
        assert_eq!(config.mainnet_url, "https://tonapi.io");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }
}
