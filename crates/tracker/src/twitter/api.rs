//! The remote capability the tracker depends on.

use async_trait::async_trait;

use crate::auth::CredentialSession;
use crate::error::ApiError;

use super::types::{ExternalId, FollowingPage};

/// Read access to followings listings and user profiles.
///
/// Every call names the credential it runs under; implementations must not
/// hold on to a session between calls.
#[async_trait]
pub trait FollowingsApi: Send + Sync {
    /// Fetch one page of the accounts `username` follows, starting at `cursor`.
    async fn list_followings(
        &self,
        session: &CredentialSession,
        username: &str,
        cursor: i64,
        count: u32,
    ) -> Result<FollowingPage, ApiError>;

    /// Resolve a user ID to its current screen name.
    async fn lookup_user(
        &self,
        session: &CredentialSession,
        user_id: ExternalId,
    ) -> Result<String, ApiError>;
}
