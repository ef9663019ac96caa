/*
[INPUT]:  Wire identifiers (network global ids, token kinds)
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When new networks or token kinds are added
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// TON network, serialized as its global id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "-239")]
    Mainnet,
    #[serde(rename = "-3")]
    Testnet,
}

impl Network {
    pub fn global_id(self) -> i32 {
        match self {
            Network::Mainnet => -239,
            Network::Testnet => -3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "-239",
            Network::Testnet => "-3",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-239" => Ok(Network::Mainnet),
            "-3" => Ok(Network::Testnet),
            other => Err(format!("unknown network {other:?}")),
        }
    }
}

/// Purpose a signed token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Challenge,
    Session,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_serde_uses_global_id() {
        assert_eq!(serde_json::to_string(&Network::Mainnet).unwrap(), "\"-239\"");
        let testnet: Network = serde_json::from_str("\"-3\"").unwrap();
        assert_eq!(testnet, Network::Testnet);
        assert_eq!(testnet.global_id(), -3);
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("-239".parse::<Network>(), Ok(Network::Mainnet));
        assert!("mainnet".parse::<Network>().is_err());
    }
}
