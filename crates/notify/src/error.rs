//! Error types for the notification system.

use thiserror::Error;

/// Errors that can occur when delivering notifications.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is missing required settings
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The service rejected the message
    #[error("API error {code}: {description}")]
    Api { code: u16, description: String },
}

impl ChannelError {
    /// Whether sending the same message again later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { code, .. } => *code >= 500,
            Self::NotConfigured(_) => false,
        }
    }
}
