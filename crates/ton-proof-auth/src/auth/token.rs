/*
[INPUT]:  Claims, token kind, TTL and the process-wide HMAC secret
[OUTPUT]: Compact HS256 tokens and validated claims
[POS]:    Auth layer - challenge and session token lifecycle
[UPDATE]: When changing token algorithm, claim layout, or expiry rules
*/

use std::fmt;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{InvalidToken, Result};
use crate::types::{Network, TokenKind};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Registered claims plus the kind-specific body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims<T> {
    pub kind: TokenKind,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
    #[serde(flatten)]
    pub data: T,
}

/// Body of a challenge token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeClaims {
    /// Hex-encoded random nonce
    pub payload: String,
}

/// Body of a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Raw-form wallet address
    pub address: String,
    pub network: Network,
}

/// Freshly signed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Signs and validates HS256 tokens with an injected secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the injected clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `data` as a `kind` token valid for `ttl` from the wall clock
    pub fn issue<T: Serialize>(
        &self,
        kind: TokenKind,
        data: T,
        ttl: Duration,
    ) -> Result<IssuedToken> {
        self.issue_at(kind, data, ttl, SystemClock.now_secs())
    }

    /// Sign `data` as a `kind` token valid for `ttl` from `now`
    pub fn issue_at<T: Serialize>(
        &self,
        kind: TokenKind,
        data: T,
        ttl: Duration,
        now: u64,
    ) -> Result<IssuedToken> {
        let claims = TokenClaims {
            kind,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
            jti: Uuid::new_v4().to_string(),
            data,
        };
        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn validate<T: DeserializeOwned>(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> std::result::Result<TokenClaims<T>, InvalidToken> {
        self.validate_at(kind, token, SystemClock.now_secs())
    }

    /// Verify signature, then kind, then `now <= exp`
    pub fn validate_at<T: DeserializeOwned>(
        &self,
        kind: TokenKind,
        token: &str,
        now: u64,
    ) -> std::result::Result<TokenClaims<T>, InvalidToken> {
        let decoded =
            jsonwebtoken::decode::<TokenClaims<T>>(token.trim(), &self.decoding_key, &self.validation)
                .map_err(|e| classify(e.kind()))?;
        let claims = decoded.claims;

        if claims.kind != kind {
            return Err(InvalidToken::WrongKind);
        }
        if now > claims.exp {
            return Err(InvalidToken::Expired);
        }
        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

fn classify(kind: &ErrorKind) -> InvalidToken {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => InvalidToken::BadSignature,
        ErrorKind::ExpiredSignature => InvalidToken::Expired,
        _ => InvalidToken::Malformed,
    }
}
