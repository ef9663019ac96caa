/*
[INPUT]:  Auth configuration, wallet proofs, bearer tokens
[OUTPUT]: Challenge tokens, proof verdicts, session tokens
[POS]:    Auth layer - TON Proof challenge-response authentication
[UPDATE]: When auth flow or token handling changes
*/

pub mod orchestrator;
pub mod proof;
pub mod signer;
pub mod token;

pub use orchestrator::{AuthOrchestrator, AuthOutcome, IssuedChallenge, SessionToken};
pub use proof::{ProofVerifier, proof_signing_hash};
pub use signer::ProofSigner;
pub use token::{ChallengeClaims, IssuedToken, SessionClaims, TokenClaims, TokenCodec};
