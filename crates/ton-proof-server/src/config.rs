/*
[INPUT]:  Optional YAML configuration file and TON_PROOF__* environment variables
[OUTPUT]: Parsed server configuration
[POS]:    Configuration layer - server setup
[UPDATE]: When adding new configuration options
*/

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use ton_proof_auth::{AuthConfig, ChainConfig};

pub const ENV_PREFIX: &str = "TON_PROOF";

/// Top-level configuration for the auth server
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:3000"
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Token and proof settings
    pub auth: AuthConfig,
    /// Chain indexer settings
    #[serde(default)]
    pub chain: ChainConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl ServerConfig {
    /// Load from an optional YAML file, overridden by process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, environment())
    }

    /// Load with an explicit environment source
    pub fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            builder = builder.add_source(File::new(path_str, FileFormat::Yaml).required(true));
        }

        let config: Self = builder
            .add_source(env)
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        self.auth.validate().context("invalid auth configuration")?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid listen_addr {:?}", self.listen_addr))
    }
}

/// `TON_PROOF__AUTH__SECRET`, `TON_PROOF__AUTH__ALLOWED_DOMAINS=a.com,b.com`, ...
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("auth.allowed_domains")
}
