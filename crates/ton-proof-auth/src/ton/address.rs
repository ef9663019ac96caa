/*
[INPUT]:  Address strings in raw (wc:hex) or user-friendly (base64) form
[OUTPUT]: Typed (workchain, account hash) pairs and their encodings
[POS]:    TON layer - account address parsing
[UPDATE]: When address flags or encodings change
*/

use std::fmt;
use std::str::FromStr;

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE},
};

use crate::error::AddressError;
use crate::types::Network;

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET_ONLY: u8 = 0x80;

/// Account address: workchain id plus 256-bit account hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    pub workchain: i32,
    pub hash: [u8; 32],
}

/// How an address string was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressForm {
    Raw,
    Friendly { bounceable: bool, testnet_only: bool },
}

impl WalletAddress {
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either address form
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        Self::parse_with_form(input).map(|(address, _)| address)
    }

    /// Parse and reject friendly addresses flagged for a different network
    pub fn parse_for_network(input: &str, network: Network) -> Result<Self, AddressError> {
        let (address, form) = Self::parse_with_form(input)?;
        if let AddressForm::Friendly {
            testnet_only: true, ..
        } = form
        {
            if network == Network::Mainnet {
                return Err(AddressError::TestnetOnly);
            }
        }
        Ok(address)
    }

    pub fn parse_with_form(input: &str) -> Result<(Self, AddressForm), AddressError> {
        let input = input.trim();
        if input.contains(':') {
            Self::parse_raw(input).map(|address| (address, AddressForm::Raw))
        } else {
            Self::parse_friendly(input)
        }
    }

    fn parse_raw(input: &str) -> Result<Self, AddressError> {
        let (workchain, hash_hex) = input
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidRaw(input.to_string()))?;
        let workchain: i32 = workchain
            .parse()
            .map_err(|_| AddressError::InvalidRaw(format!("bad workchain {workchain:?}")))?;
        if hash_hex.len() != 64 {
            return Err(AddressError::InvalidRaw(format!(
                "hash must be 64 hex chars, got {}",
                hash_hex.len()
            )));
        }
        let mut hash = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash)
            .map_err(|e| AddressError::InvalidRaw(e.to_string()))?;
        Ok(Self { workchain, hash })
    }

    fn parse_friendly(input: &str) -> Result<(Self, AddressForm), AddressError> {
        if input.len() != 48 {
            return Err(AddressError::InvalidFriendly(format!(
                "expected 48 chars, got {}",
                input.len()
            )));
        }
        let engine = if input.contains('+') || input.contains('/') {
            &STANDARD
        } else {
            &URL_SAFE
        };
        let bytes = engine
            .decode(input)
            .map_err(|e| AddressError::InvalidFriendly(e.to_string()))?;
        if bytes.len() != 36 {
            return Err(AddressError::InvalidFriendly(format!(
                "expected 36 bytes, got {}",
                bytes.len()
            )));
        }

        let checksum = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16(&bytes[..34]) != checksum {
            return Err(AddressError::Checksum);
        }

        let mut tag = bytes[0];
        let testnet_only = tag & FLAG_TESTNET_ONLY != 0;
        if testnet_only {
            tag ^= FLAG_TESTNET_ONLY;
        }
        let bounceable = match tag {
            FLAG_BOUNCEABLE => true,
            FLAG_NON_BOUNCEABLE => false,
            other => {
                return Err(AddressError::InvalidFriendly(format!(
                    "unknown tag {other:#04x}"
                )));
            }
        };

        let workchain = i32::from(bytes[1] as i8);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok((
            Self { workchain, hash },
            AddressForm::Friendly {
                bounceable,
                testnet_only,
            },
        ))
    }

    /// `wc:hex` form, used for indexer queries and session claims
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// URL-safe user-friendly form; `None` when the workchain does not fit a byte
    pub fn to_friendly(&self, bounceable: bool, testnet_only: bool) -> Option<String> {
        let workchain = i8::try_from(self.workchain).ok()?;
        let mut tag = if bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if testnet_only {
            tag |= FLAG_TESTNET_ONLY;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.push(workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let checksum = crc16(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());
        Some(URL_SAFE.encode(bytes))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw_string())
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// CRC-16/XMODEM
fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in bytes {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
