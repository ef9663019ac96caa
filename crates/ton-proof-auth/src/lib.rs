/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public TON Proof auth crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod ton;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthOrchestrator,
    AuthOutcome,
    IssuedChallenge,
    ProofSigner,
    ProofVerifier,
    SessionClaims,
    SessionToken,
    TokenCodec,
};

// Re-export commonly used types from chain
pub use chain::{ChainClient, ChainKeyResolver, MockKeyResolver, PublicKeyResolver, TonApiClient};

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, ChainConfig};
pub use error::{AuthError, ChainError, InvalidToken, ProofError, Rejection, ResolveError, Result};

// Re-export all types
pub use ton::{StateInit, WalletAddress};
pub use types::*;
