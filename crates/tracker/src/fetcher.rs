//! Paginated followings fetcher with credential rotation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::CredentialPool;
use crate::config::RetryPolicy;
use crate::error::FetchError;
use crate::twitter::{ExternalId, FollowingPage, FollowingsApi, START_CURSOR};

/// Result of walking a listing from the start to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowingsSnapshot {
    /// Every followed ID, deduplicated, in first-seen order.
    pub ids: Vec<ExternalId>,
    /// Cursor that was used to request the final page.
    pub terminal_cursor: i64,
    /// Number of pages fetched.
    pub pages: usize,
}

/// Fetches followings pages, retrying through rate limits and network trouble.
pub struct FollowingsFetcher {
    api: Arc<dyn FollowingsApi>,
    pool: Arc<CredentialPool>,
    page_size: u32,
    retry: RetryPolicy,
}

impl FollowingsFetcher {
    /// Create a fetcher.
    #[must_use]
    pub fn new(
        api: Arc<dyn FollowingsApi>,
        pool: Arc<CredentialPool>,
        page_size: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            pool,
            page_size,
            retry,
        }
    }

    /// Fetch one page at `cursor`.
    ///
    /// A rate-limited attempt sleeps for the configured backoff and retries the
    /// same cursor with a freshly selected credential. Transient failures sleep
    /// and retry. Either kind gives up with [`FetchError::FetchFailed`] once its
    /// budget is spent; any other API error is returned immediately.
    pub async fn fetch_page(
        &self,
        username: &str,
        cursor: i64,
    ) -> Result<FollowingPage, FetchError> {
        let mut attempts: u32 = 0;
        let mut rate_limited: u32 = 0;
        let mut transient: u32 = 0;

        loop {
            let session = self.pool.select();
            attempts += 1;

            let err = match self
                .api
                .list_followings(session, username, cursor, self.page_size)
                .await
            {
                Ok(page) => {
                    debug!(
                        username,
                        cursor,
                        items = page.items.len(),
                        next_cursor = page.next_cursor,
                        prev_cursor = page.prev_cursor,
                        "Fetched followings page"
                    );
                    return Ok(page);
                }
                Err(e) => e,
            };

            let (delay, exhausted) = if err.is_rate_limited() {
                rate_limited += 1;
                warn!(
                    username,
                    cursor,
                    session = %session.label(),
                    rate_limited,
                    "Hit rate limit, switching credentials"
                );
                (
                    self.retry.rate_limit_backoff,
                    rate_limited > self.retry.max_rate_limit_retries,
                )
            } else if err.is_transient() {
                transient += 1;
                warn!(
                    username,
                    cursor,
                    error = %err,
                    transient,
                    "Transient failure fetching followings"
                );
                (
                    self.retry.transient_backoff,
                    transient > self.retry.max_transient_retries,
                )
            } else {
                return Err(FetchError::Api(err));
            };

            if exhausted {
                return Err(FetchError::FetchFailed {
                    username: username.to_string(),
                    attempts,
                    last: err,
                });
            }

            tokio::time::sleep(delay).await;
        }
    }

    /// Walk the whole listing from the first page until `next_cursor == 0`.
    pub async fn fetch_all(&self, username: &str) -> Result<FollowingsSnapshot, FetchError> {
        let mut cursor = START_CURSOR;
        let mut seen = HashSet::new();
        let mut snapshot = FollowingsSnapshot::default();

        loop {
            let page = self.fetch_page(username, cursor).await?;
            snapshot.pages += 1;

            for id in page.items.iter().copied() {
                if seen.insert(id) {
                    snapshot.ids.push(id);
                }
            }

            if page.is_last() {
                break;
            }
            cursor = page.next_cursor;
        }

        snapshot.terminal_cursor = cursor;

        info!(
            username,
            total = snapshot.ids.len(),
            pages = snapshot.pages,
            "Enumerated followings"
        );

        Ok(snapshot)
    }
}
