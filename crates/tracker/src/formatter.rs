//! Turns a discovered follow into a notification message.

use std::sync::Arc;

use notify::NotificationMessage;
use tracing::debug;

use crate::auth::CredentialPool;
use crate::error::FormatError;
use crate::twitter::{ExternalId, FollowingsApi};

/// Base URL for profile links.
pub const PROFILE_BASE_URL: &str = "https://twitter.com";

/// Resolves followed IDs to screen names and renders the message text.
pub struct NotificationFormatter {
    api: Arc<dyn FollowingsApi>,
    pool: Arc<CredentialPool>,
}

impl NotificationFormatter {
    /// Create a formatter.
    #[must_use]
    pub fn new(api: Arc<dyn FollowingsApi>, pool: Arc<CredentialPool>) -> Self {
        Self { api, pool }
    }

    /// Build the message announcing that `follower_username` followed `followed_id`.
    ///
    /// Makes exactly one lookup call; a failed lookup is not retried.
    pub async fn format(
        &self,
        followed_id: ExternalId,
        follower_username: &str,
    ) -> Result<NotificationMessage, FormatError> {
        let session = self.pool.select();
        let followed = self
            .api
            .lookup_user(session, followed_id)
            .await
            .map_err(|source| FormatError::ResolutionFailed {
                user_id: followed_id,
                source,
            })?;

        let message = NotificationMessage::new(render(follower_username, &followed));
        debug!(text = %message.text, "Prepared notification");
        Ok(message)
    }
}

/// Profile link for a screen name.
#[must_use]
pub fn profile_url(username: &str) -> String {
    format!("{PROFILE_BASE_URL}/{username}")
}

/// Render the notification text.
#[must_use]
pub fn render(follower: &str, followed: &str) -> String {
    format!(
        "[{follower}]({}) just started to follow [{followed}]({}).",
        profile_url(follower),
        profile_url(followed)
    )
}
