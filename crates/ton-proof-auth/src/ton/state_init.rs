/*
[INPUT]:  StateInit cells (code + data) supplied for not-yet-deployed wallets
[OUTPUT]: Derived contract address and embedded wallet public key
[POS]:    TON layer - binds an undeployed address to its initial key
[UPDATE]: When supporting new wallet contract versions
*/

use std::sync::Arc;

use crate::error::CellError;
use crate::ton::address::WalletAddress;
use crate::ton::cell::{Cell, CellBuilder};

/// Persistent-data layout of a standard wallet contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletLayout {
    /// v1, v2: seqno:uint32 public_key:bits256
    Simple,
    /// v3: seqno:uint32 subwallet:uint32 public_key:bits256
    Subwallet,
    /// v4: v3 layout followed by plugins:(HashmapE 256 ...)
    SubwalletPlugins,
    /// v5: is_signature_allowed:bool seqno:uint32 wallet_id:uint32 public_key:bits256 extensions:(HashmapE ...)
    V5,
}

// (code hash hex, layout)
const KNOWN_WALLET_CODES: &[(&str, WalletLayout)] = &[
    (
        "b61041a58a7980b946e8fb9e198e3c904d24799ffa36574ea4251c41a566f581",
        WalletLayout::Subwallet,
    ),
    (
        "84dafa449f98a6987789ba232358072bc0f76dc4524002a5d0918b9a75d2d599",
        WalletLayout::Subwallet,
    ),
    (
        "64dd54805522c5be8a9db59cea0105ccf0d08786ca79beb8cb79e880a8d7322d",
        WalletLayout::SubwalletPlugins,
    ),
    (
        "feb5ff6820e2ff0d9483e7e0d62c817d846789fb4ae580c878866d959dabd5c0",
        WalletLayout::SubwalletPlugins,
    ),
    (
        "20834b7b72b112147e1b2fb457b84e74d1a30f04f737d4f62a668e9552d2b72f",
        WalletLayout::V5,
    ),
];

impl WalletLayout {
    /// Recognize a standard wallet by the hash of its code cell
    pub fn from_code_hash(hash: &[u8; 32]) -> Option<Self> {
        let hash_hex = hex::encode(hash);
        KNOWN_WALLET_CODES
            .iter()
            .find(|(known, _)| *known == hash_hex)
            .map(|(_, layout)| *layout)
    }

    /// Infer the layout from the data cell's bit length
    pub fn from_data_bits(bits: usize) -> Option<Self> {
        match bits {
            288 => Some(WalletLayout::Simple),
            320 => Some(WalletLayout::Subwallet),
            321 => Some(WalletLayout::SubwalletPlugins),
            322 => Some(WalletLayout::V5),
            _ => None,
        }
    }

    fn read_public_key(self, data: &Cell) -> Result<[u8; 32], CellError> {
        let mut slice = data.parse();
        match self {
            WalletLayout::Simple => {
                slice.load_uint(32)?;
            }
            WalletLayout::Subwallet | WalletLayout::SubwalletPlugins => {
                slice.load_uint(32)?;
                slice.load_uint(32)?;
            }
            WalletLayout::V5 => {
                slice.load_bit()?;
                slice.load_uint(32)?;
                slice.load_uint(32)?;
            }
        }
        slice.load_bytes::<32>()
    }
}

/// Parsed `StateInit` (split_depth, special, code, data, library)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub split_depth: Option<u8>,
    pub special: Option<(bool, bool)>,
    pub code: Option<Arc<Cell>>,
    pub data: Option<Arc<Cell>>,
    pub library: Option<Arc<Cell>>,
    hash: [u8; 32],
}

impl StateInit {
    /// Assemble a plain code + data state-init
    pub fn new(code: Arc<Cell>, data: Arc<Cell>) -> Result<Self, CellError> {
        let mut builder = CellBuilder::new();
        builder.store_bit(false)?;
        builder.store_bit(false)?;
        builder.store_maybe_ref(Some(code.clone()))?;
        builder.store_maybe_ref(Some(data.clone()))?;
        builder.store_bit(false)?;
        let cell = builder.build()?;
        Ok(Self {
            split_depth: None,
            special: None,
            code: Some(code),
            data: Some(data),
            library: None,
            hash: cell.hash(),
        })
    }

    pub fn from_boc_base64(encoded: &str) -> Result<Self, CellError> {
        let cell = Cell::from_boc_base64(encoded)?;
        Self::from_cell(&cell)
    }

    pub fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut slice = cell.parse();

        let split_depth = if slice.load_bit()? {
            Some(slice.load_uint(5)? as u8)
        } else {
            None
        };
        let special = if slice.load_bit()? {
            Some((slice.load_bit()?, slice.load_bit()?))
        } else {
            None
        };
        let code = slice.load_maybe_ref()?.cloned();
        let data = slice.load_maybe_ref()?.cloned();
        let library = slice.load_maybe_ref()?.cloned();

        if slice.remaining_bits() != 0 || slice.remaining_refs() != 0 {
            return Err(CellError::InvalidBoc(
                "trailing data after StateInit".to_string(),
            ));
        }

        Ok(Self {
            split_depth,
            special,
            code,
            data,
            library,
            hash: cell.hash(),
        })
    }

    /// Rebuild the state-init cell
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut builder = CellBuilder::new();
        match self.split_depth {
            Some(depth) => {
                builder.store_bit(true)?;
                builder.store_uint(u64::from(depth), 5)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        match self.special {
            Some((tick, tock)) => {
                builder.store_bit(true)?;
                builder.store_bit(tick)?;
                builder.store_bit(tock)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        builder.store_maybe_ref(self.code.clone())?;
        builder.store_maybe_ref(self.data.clone())?;
        builder.store_maybe_ref(self.library.clone())?;
        builder.build()
    }

    pub fn to_boc_base64(&self) -> Result<String, CellError> {
        Ok(self.to_cell()?.to_boc_base64())
    }

    /// Contract address this state-init deploys to
    pub fn address(&self, workchain: i32) -> WalletAddress {
        WalletAddress::new(workchain, self.hash)
    }

    pub fn matches_address(&self, address: &WalletAddress) -> bool {
        self.address(address.workchain) == *address
    }

    pub fn wallet_layout(&self) -> Option<WalletLayout> {
        if let Some(layout) = self
            .code
            .as_ref()
            .and_then(|code| WalletLayout::from_code_hash(&code.hash()))
        {
            return Some(layout);
        }
        self.data
            .as_ref()
            .and_then(|data| WalletLayout::from_data_bits(data.bit_len()))
    }

    /// Public key stored in the wallet's initial data
    pub fn wallet_public_key(&self) -> Result<[u8; 32], CellError> {
        let data = self
            .data
            .as_ref()
            .ok_or(CellError::Unsupported("state-init has no data cell"))?;
        let layout = self
            .wallet_layout()
            .ok_or(CellError::Unsupported("unrecognized wallet data layout"))?;
        layout.read_public_key(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_cell(tag: u64) -> Arc<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_uint(tag, 32).unwrap();
        Arc::new(builder.build().unwrap())
    }

    fn v4_data(public_key: [u8; 32]) -> Arc<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_uint(0, 32).unwrap();
        builder.store_uint(698_983_191, 32).unwrap();
        builder.store_bytes(&public_key).unwrap();
        builder.store_bit(false).unwrap();
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_from_cell_matches_constructed_hash() {
        let state_init = StateInit::new(code_cell(1), v4_data([5u8; 32])).unwrap();
        let cell = state_init.to_cell().unwrap();
        let parsed = StateInit::from_cell(&cell).unwrap();

        assert_eq!(parsed, state_init);
        assert_eq!(parsed.address(0).hash, cell.hash());
    }

    #[test]
    fn test_boc_base64_roundtrip() {
        let state_init = StateInit::new(code_cell(2), v4_data([6u8; 32])).unwrap();
        let encoded = state_init.to_boc_base64().unwrap();
        let parsed = StateInit::from_boc_base64(&encoded).unwrap();
        assert!(parsed.matches_address(&state_init.address(-1)));
    }

    #[test]
    fn test_extracts_v4_key_by_layout() {
        let key = [7u8; 32];
        let state_init = StateInit::new(code_cell(3), v4_data(key)).unwrap();
        assert_eq!(state_init.wallet_layout(), Some(WalletLayout::SubwalletPlugins));
        assert_eq!(state_init.wallet_public_key().unwrap(), key);
    }

    #[test]
    fn test_extracts_v5_key() {
        let key = [8u8; 32];
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_uint(0, 32).unwrap();
        builder.store_uint(2_147_483_409, 32).unwrap();
        builder.store_bytes(&key).unwrap();
        builder.store_bit(false).unwrap();
        let data = Arc::new(builder.build().unwrap());

        let state_init = StateInit::new(code_cell(4), data).unwrap();
        assert_eq!(state_init.wallet_layout(), Some(WalletLayout::V5));
        assert_eq!(state_init.wallet_public_key().unwrap(), key);
    }

    #[test]
    fn test_unrecognized_layout_is_unsupported() {
        let mut builder = CellBuilder::new();
        builder.store_uint(1, 16).unwrap();
        let data = Arc::new(builder.build().unwrap());

        let state_init = StateInit::new(code_cell(5), data).unwrap();
        assert!(state_init.wallet_public_key().is_err());
    }

    #[test]
    fn test_different_data_changes_address() {
        let first = StateInit::new(code_cell(6), v4_data([1u8; 32])).unwrap();
        let second = StateInit::new(code_cell(6), v4_data([2u8; 32])).unwrap();
        assert!(!second.matches_address(&first.address(0)));
    }

    #[test]
    fn test_rejects_trailing_bits() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0, 5).unwrap();
        builder.store_bit(true).unwrap();
        let cell = builder.build().unwrap();
        assert!(StateInit::from_cell(&cell).is_err());
    }
}
