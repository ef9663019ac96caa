/*
[INPUT]:  Auth configuration, key resolver, clock
[OUTPUT]: Challenge tokens, session tokens, classified rejections
[POS]:    Auth layer - orchestrates challenge -> proof -> session flow
[UPDATE]: When protocol steps or rejection mapping change
*/

use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, info, warn};

use super::proof::ProofVerifier;
use super::token::{ChallengeClaims, SessionClaims, TokenClaims, TokenCodec};
use crate::chain::PublicKeyResolver;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{InvalidToken, Rejection, Result};
use crate::types::{CheckProofRequest, Network, ProofSubmission, TokenKind};

const PAYLOAD_BYTES: usize = 32;

/// Challenge handed to a wallet before it signs a proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    /// Signed challenge token, the value the wallet signs as `payload`
    pub token: String,
    pub payload: String,
    pub expires_at: u64,
}

/// Session granted after a successful proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    /// Raw-form address
    pub address: String,
    pub network: Network,
    pub expires_at: u64,
}

/// Result of a proof check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted(SessionToken),
    Rejected(Rejection),
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted(_))
    }
}

/// Drives the two protocol operations over shared, immutable state
pub struct AuthOrchestrator {
    codec: TokenCodec,
    verifier: ProofVerifier,
    resolver: Arc<dyn PublicKeyResolver>,
    clock: Arc<dyn Clock>,
    challenge_ttl: Duration,
    session_ttl: Duration,
}

impl AuthOrchestrator {
    /// Create an orchestrator on the system clock
    pub fn new(config: &AuthConfig, resolver: Arc<dyn PublicKeyResolver>) -> Result<Self> {
        Self::with_clock(config, resolver, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &AuthConfig,
        resolver: Arc<dyn PublicKeyResolver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let allowed_domains = config
            .allowed_domains
            .iter()
            .map(|domain| domain.trim().to_string())
            .filter(|domain| !domain.is_empty())
            .collect();

        Ok(Self {
            codec: TokenCodec::new(&config.secret),
            verifier: ProofVerifier::new(
                allowed_domains,
                config.proof_max_age_secs,
                Arc::clone(&clock),
            ),
            resolver,
            clock,
            challenge_ttl: Duration::from_secs(config.challenge_ttl_secs),
            session_ttl: Duration::from_secs(config.session_ttl_secs),
        })
    }

    /// Step 1: fresh random payload wrapped in a challenge token
    pub fn issue_challenge(&self) -> Result<IssuedChallenge> {
        let mut nonce = [0u8; PAYLOAD_BYTES];
        OsRng.fill_bytes(&mut nonce);
        let payload = hex::encode(nonce);

        let issued = self.codec.issue_at(
            TokenKind::Challenge,
            ChallengeClaims {
                payload: payload.clone(),
            },
            self.challenge_ttl,
            self.clock.now_secs(),
        )?;
        debug!(expires_at = issued.expires_at, "issued challenge");

        Ok(IssuedChallenge {
            token: issued.token,
            payload,
            expires_at: issued.expires_at,
        })
    }

    /// Step 2 from the raw wire body: schema validation, then `check_proof`
    pub async fn check_proof_request(&self, request: CheckProofRequest) -> AuthOutcome {
        match request.validate() {
            Ok(submission) => self.check_proof(&submission).await,
            Err(errors) => {
                debug!(fields = %errors, "rejected malformed checkProof request");
                AuthOutcome::Rejected(Rejection::MalformedInput(errors))
            }
        }
    }

    /// Step 2: verify the proof, then the embedded challenge, then issue a session
    pub async fn check_proof(&self, submission: &ProofSubmission) -> AuthOutcome {
        let address = match self.verifier.check(submission, self.resolver.as_ref()).await {
            Ok(address) => address,
            Err(e) => {
                warn!(
                    address = %submission.address,
                    network = %submission.network,
                    error = %e,
                    "proof rejected"
                );
                return AuthOutcome::Rejected(Rejection::from(e));
            }
        };

        let now = self.clock.now_secs();
        if let Err(e) = self.codec.validate_at::<ChallengeClaims>(
            TokenKind::Challenge,
            &submission.proof.payload,
            now,
        ) {
            warn!(address = %address, reason = %e, "challenge token rejected");
            return AuthOutcome::Rejected(Rejection::InvalidOrExpiredChallenge);
        }

        let claims = SessionClaims {
            address: address.to_raw_string(),
            network: submission.network,
        };
        match self
            .codec
            .issue_at(TokenKind::Session, claims.clone(), self.session_ttl, now)
        {
            Ok(issued) => {
                info!(address = %claims.address, network = %claims.network, "session issued");
                AuthOutcome::Accepted(SessionToken {
                    token: issued.token,
                    address: claims.address,
                    network: claims.network,
                    expires_at: issued.expires_at,
                })
            }
            Err(e) => {
                warn!(error = %e, "failed to sign session token");
                AuthOutcome::Rejected(Rejection::Internal)
            }
        }
    }

    /// Validate a bearer session token
    pub fn validate_session(
        &self,
        token: &str,
    ) -> std::result::Result<TokenClaims<SessionClaims>, InvalidToken> {
        self.codec
            .validate_at(TokenKind::Session, token, self.clock.now_secs())
    }
}

impl std::fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthOrchestrator")
            .field("challenge_ttl", &self.challenge_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}
