/*
[INPUT]:  Failure sources (token codec, chain queries, TON parsing, proof checks)
[OUTPUT]: Structured error types with retry hints and client-safe messages
[POS]:    Error handling layer - unified error types for the whole crate
[UPDATE]: When adding new error sources or rejection reasons
*/

use std::fmt;

use thiserror::Error;

/// Internal failure that is not a verdict on the client's submission
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token encoding failed
    #[error("Token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Why a token failed validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidToken {
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token kind does not match")]
    WrongKind,
}

/// Chain query failure
#[derive(Error, Debug)]
pub enum ChainError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Indexer returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// Query did not finish in time
    #[error("Chain query timeout after {duration}s")]
    Timeout { duration: u64 },

    /// Indexer response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// URL building failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl ChainError {
    /// Check if the error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainError::Http(_) | ChainError::Timeout { .. } => true,
            ChainError::Api { code, .. } => *code == 429 || *code >= 500,
            ChainError::InvalidResponse(_) | ChainError::UrlParse(_) => false,
        }
    }
}

/// Public key resolution failure
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Account is not deployed and no state-init was supplied
    #[error("public key not found")]
    NotFound,

    /// State-init does not hash to the claimed address
    #[error("state-init does not match address")]
    StateInitMismatch,

    /// State-init data does not carry a recognizable wallet key
    #[error("unsupported state-init: {0}")]
    UnsupportedStateInit(String),

    /// Chain state was unreachable
    #[error("chain query failed: {0}")]
    Network(#[from] ChainError),
}

/// Cell and BoC decoding failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("unknown BoC magic {0:#010x}")]
    BadMagic(u32),
    #[error("unexpected end of BoC data")]
    Truncated,
    #[error("BoC checksum mismatch")]
    ChecksumMismatch,
    #[error("invalid BoC: {0}")]
    InvalidBoc(String),
    #[error("unsupported cell: {0}")]
    Unsupported(&'static str),
    #[error("cell overflow: {0}")]
    Overflow(&'static str),
    #[error("cell underflow: {0}")]
    Underflow(&'static str),
}

/// Address parsing failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid raw address: {0}")]
    InvalidRaw(String),
    #[error("invalid user-friendly address: {0}")]
    InvalidFriendly(String),
    #[error("address checksum mismatch")]
    Checksum,
    #[error("testnet-only address used on mainnet")]
    TestnetOnly,
}

/// Proof verification failure, first failing step wins
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("proof timestamp {timestamp} outside freshness window")]
    Stale { timestamp: u64 },
    #[error("domain {0:?} is not allowed")]
    DomainNotAllowed(String),
    #[error("domain length {declared} does not match actual {actual}")]
    DomainLengthMismatch { declared: u32, actual: usize },
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("key resolution failed: {0}")]
    KeyResolution(#[from] ResolveError),
    #[error("supplied public key does not match resolved key")]
    PublicKeyMismatch,
    #[error("signature verification failed")]
    BadSignature,
}

/// Single schema violation in a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Collected schema violations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|error| error.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Terminal reason a proof check was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("malformed input: {0}")]
    MalformedInput(ValidationErrors),
    #[error("invalid proof")]
    InvalidProof,
    #[error("invalid or expired challenge")]
    InvalidOrExpiredChallenge,
    #[error("public key resolution failed")]
    KeyResolutionFailed,
    #[error("chain state unavailable")]
    NetworkError,
    #[error("internal error")]
    Internal,
}

impl Rejection {
    /// Only transient chain failures may be retried with the same submission
    pub fn is_retryable(&self) -> bool {
        matches!(self, Rejection::NetworkError)
    }

    /// Message safe to hand to the client
    pub fn client_message(&self) -> &'static str {
        match self {
            Rejection::MalformedInput(_) => "Invalid request",
            Rejection::InvalidProof => "Invalid proof",
            Rejection::InvalidOrExpiredChallenge => "Invalid token",
            Rejection::KeyResolutionFailed => "Unable to resolve wallet public key",
            Rejection::NetworkError => "Chain state unavailable, retry later",
            Rejection::Internal => "Internal error",
        }
    }
}

impl From<ProofError> for Rejection {
    fn from(error: ProofError) -> Self {
        match error {
            ProofError::KeyResolution(ResolveError::Network(e)) if e.is_retryable() => {
                Rejection::NetworkError
            }
            ProofError::KeyResolution(_) => Rejection::KeyResolutionFailed,
            _ => Rejection::InvalidProof,
        }
    }
}
