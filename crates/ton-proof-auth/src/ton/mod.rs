/*
[INPUT]:  Raw TON encodings (addresses, bags of cells, state-init)
[OUTPUT]: Typed addresses, cells, and wallet state-init views
[POS]:    TON layer - chain primitives needed by proof verification
[UPDATE]: When new TON encodings are needed by the verifier
*/

pub mod address;
pub mod cell;
pub mod state_init;

pub use address::{AddressForm, WalletAddress};
pub use cell::{Cell, CellBuilder, CellSlice};
pub use state_init::{StateInit, WalletLayout};
