//! Error types for the follow tracker.

use std::path::PathBuf;

use thiserror::Error;

use crate::twitter::ExternalId;

/// Errors returned by the remote followings API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credential used for the call is throttled.
    #[error("Rate limited (reset at {reset_at:?})")]
    RateLimited {
        /// Unix timestamp at which the window resets, when the API reports it.
        reset_at: Option<i64>,
    },

    /// Connectivity problem: connect failure, timeout, dropped body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// OAuth signature could not be produced.
    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl ApiError {
    /// The remote asked us to slow down.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Worth retrying with the same request after a pause.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors surfaced by the paginated fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Retries for a single page were exhausted.
    #[error("Fetching followings of {username} failed after {attempts} attempts: {last}")]
    FetchFailed {
        username: String,
        attempts: u32,
        #[source]
        last: ApiError,
    },

    /// A non-retryable API error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from the account store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account already registered: {0}")]
    Duplicate(String),
}

/// Errors raised while loading startup configuration. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No credentials configured")]
    NoCredentials,

    #[error("Credential set {index} is incomplete: {field} is empty")]
    IncompleteCredentials { index: usize, field: &'static str },
}

/// Errors from turning a discovered follow into a message.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Could not resolve user {user_id}: {source}")]
    ResolutionFailed {
        user_id: ExternalId,
        #[source]
        source: ApiError,
    },
}

/// Errors from processing one account in a poll cycle.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
