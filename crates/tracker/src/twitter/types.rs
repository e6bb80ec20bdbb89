//! Twitter data types.

use serde::Deserialize;

/// Numeric Twitter user ID.
pub type ExternalId = u64;

/// Cursor value that requests the first page of a listing.
pub const START_CURSOR: i64 = -1;

/// Cursor value that marks the end of a listing (no further page).
pub const END_CURSOR: i64 = 0;

/// One page of a "who does this account follow" listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowingPage {
    /// Followed user IDs, in the order the API returned them.
    pub items: Vec<ExternalId>,
    /// Cursor for the next (older) page, `0` when this is the last one.
    pub next_cursor: i64,
    /// Cursor for the previous (newer) page, `0` when this is the first one.
    pub prev_cursor: i64,
}

impl FollowingPage {
    /// Build a page from its items and cursors.
    #[must_use]
    pub fn new(items: Vec<ExternalId>, next_cursor: i64, prev_cursor: i64) -> Self {
        Self {
            items,
            next_cursor,
            prev_cursor,
        }
    }

    /// Whether the listing ends with this page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_cursor == END_CURSOR
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// Subset of a v1.1 user object.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserObject {
    pub id: ExternalId,
    pub screen_name: String,
}

/// Response of `GET friends/list`.
#[derive(Debug, Deserialize)]
pub(crate) struct FriendsListResponse {
    #[serde(default)]
    pub users: Vec<UserObject>,
    pub next_cursor: i64,
    pub previous_cursor: i64,
}

impl From<FriendsListResponse> for FollowingPage {
    fn from(resp: FriendsListResponse) -> Self {
        Self {
            items: resp.users.into_iter().map(|u| u.id).collect(),
            next_cursor: resp.next_cursor,
            prev_cursor: resp.previous_cursor,
        }
    }
}

/// Error envelope returned by v1.1 endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}
