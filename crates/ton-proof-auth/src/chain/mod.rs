/*
[INPUT]:  Indexer endpoints and wallet addresses
[OUTPUT]: Wallet public keys for proof verification
[POS]:    Chain layer - on-chain state access
[UPDATE]: When adding chain data sources
*/

pub mod client;
pub mod resolver;

pub use client::{ChainClient, TonApiClient};
pub use resolver::{ChainKeyResolver, MockKeyResolver, PublicKeyResolver, key_from_state_init};
