//! Twitter app credentials and the sessions built from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ConfigError};

use super::oauth;

/// One set of Twitter app credentials (OAuth 1.0a user context).
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Consumer API key.
    #[serde(rename = "APP_API_KEY")]
    pub api_key: String,
    /// Consumer API secret.
    #[serde(rename = "APP_API_KEY_SECRET")]
    pub api_secret: String,
    /// User access token.
    #[serde(rename = "APP_ACCESS_TOKEN")]
    pub access_token: String,
    /// User access token secret.
    #[serde(rename = "APP_ACCESS_TOKEN_SECRET")]
    pub access_token_secret: String,
}

impl Credentials {
    /// Create a credential set.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Reject sets with an empty field. `index` is only used in the error.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let fields = [
            ("APP_API_KEY", &self.api_key),
            ("APP_API_KEY_SECRET", &self.api_secret),
            ("APP_ACCESS_TOKEN", &self.access_token),
            ("APP_ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::IncompleteCredentials { index, field });
            }
        }
        Ok(())
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// An authenticated handle to one Twitter app identity.
#[derive(Debug, Clone)]
pub struct CredentialSession {
    index: usize,
    credentials: Credentials,
}

impl CredentialSession {
    /// Wrap credentials as the `index`-th session of a pool.
    #[must_use]
    pub fn new(index: usize, credentials: Credentials) -> Self {
        Self { index, credentials }
    }

    /// Position of this session within its pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Short label for log fields.
    #[must_use]
    pub fn label(&self) -> String {
        format!("app-{}", self.index)
    }

    /// Build the `Authorization` header value for a request.
    ///
    /// `url` must not carry a query string; pass query parameters in `params`.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, ApiError> {
        oauth::authorization_header(&self.credentials, method, url, params)
    }
}
