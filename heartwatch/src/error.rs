//! Error types shared across the heartbeat pipeline.
//!
//! Library code returns these typed errors; the CLI edge wraps them in
//! `anyhow` with context.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

/// Errors surfaced to ingress callers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// A required registration or ping field is absent or empty.
    #[error("missing fields")]
    MissingFields,

    /// The session is unknown or has already been evicted.
    #[error("session not found")]
    SessionNotFound,

    /// The body is not JSON or does not have the expected shape.
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// HTTP status used when this error reaches a client.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// Errors from the in-memory session store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
}

/// Failure to decrypt a sealed webhook blob.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecryptError {
    #[error("sealed payload is not valid base64")]
    Encoding,

    #[error("sealed payload too short: {0} bytes")]
    TooShort(usize),

    /// Tag mismatch: corrupt data or the wrong key.
    #[error("authentication tag mismatch")]
    Authentication,

    #[error("decrypted payload is not valid UTF-8")]
    Utf8,
}

/// Errors from the secret store backend.
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    #[error("secret store is not configured")]
    NotConfigured,

    #[error("secret store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("secret store request failed: {0}")]
    Request(String),

    #[error("secret store response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SecretStoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Errors turning a target reference into a webhook URL.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no secret stored for vault id {0}")]
    NotFound(String),

    #[error("failed to decrypt webhook for vault id {vault_id}: {source}")]
    Decrypt {
        vault_id: String,
        #[source]
        source: DecryptError,
    },

    #[error(transparent)]
    Store(#[from] SecretStoreError),

    #[error("unrecognized target reference")]
    Unrecognized,
}

/// Errors from the outbound notification call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("notification endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification request timed out")]
    Timeout,

    #[error("notification request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Errors from a single disconnect patch attempt.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid runtime configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("heartbeat timeout must be greater than zero")]
    ZeroTimeout,

    #[error("sweep interval ({interval_ms}ms) must be shorter than the heartbeat timeout ({timeout_ms}ms)")]
    IntervalTooLong { interval_ms: u64, timeout_ms: u64 },

    #[error("sweep interval must be greater than zero")]
    ZeroInterval,

    #[error("at least one patch worker is required")]
    NoWorkers,

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("a patch proxy URL requires a proxy secret")]
    MissingProxySecret,
}
