//! Twitter v1.1 REST client.
//!
//! API Documentation: <https://developer.twitter.com/en/docs/twitter-api/v1>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::auth::CredentialSession;
use crate::error::ApiError;

use super::api::FollowingsApi;
use super::types::{ErrorEnvelope, ExternalId, FollowingPage, FriendsListResponse, UserObject};

/// Public API host.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// v1.1 error code for "Rate limit exceeded".
const RATE_LIMIT_ERROR_CODE: i64 = 88;

/// Header carrying the epoch second at which the rate-limit window resets.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Twitter REST client. Stateless with respect to credentials.
#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    base_url: String,
}

impl TwitterClient {
    /// Create a client for the public API.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Create a client against another host (used for tests and proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Make a signed GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        session: &CredentialSession,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, session = %session.label(), "GET request");

        let authorization = session.authorization("GET", &url, params)?;

        let response = self
            .client
            .get(&url)
            .query(params)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Map a response to a value or an [`ApiError`].
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let reset_at = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ApiError::Decode(e)
            });
        }

        let envelope: ErrorEnvelope = serde_json::from_str(&text).unwrap_or_default();
        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || envelope
                .errors
                .iter()
                .any(|e| e.code == RATE_LIMIT_ERROR_CODE);

        if rate_limited {
            return Err(ApiError::RateLimited { reset_at });
        }

        let message = envelope
            .errors
            .first()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .unwrap_or(text);

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl FollowingsApi for TwitterClient {
    async fn list_followings(
        &self,
        session: &CredentialSession,
        username: &str,
        cursor: i64,
        count: u32,
    ) -> Result<FollowingPage, ApiError> {
        let params = [
            ("screen_name", username.to_string()),
            ("cursor", cursor.to_string()),
            ("count", count.to_string()),
            ("skip_status", "true".to_string()),
            ("include_user_entities", "false".to_string()),
        ];

        let resp: FriendsListResponse = self.get(session, "/1.1/friends/list.json", &params).await?;
        Ok(resp.into())
    }

    async fn lookup_user(
        &self,
        session: &CredentialSession,
        user_id: ExternalId,
    ) -> Result<String, ApiError> {
        let params = [("user_id", user_id.to_string())];

        let user: UserObject = self.get(session, "/1.1/users/show.json", &params).await?;
        Ok(user.screen_name)
    }
}
