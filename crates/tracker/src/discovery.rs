//! Per-account discovery: initial enumeration and incremental diffing.
//!
//! An untracked account is enumerated in full once; nothing is reported for
//! it. A tracked account is polled one page at a time starting from its stored
//! cursor, and whatever on that page is not yet in its followings list is
//! reported as new.
//!
//! The cursor follows `prev_cursor`, i.e. toward newer content, and pages that
//! have been passed are never revisited.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DiscoveryError;
use crate::fetcher::FollowingsFetcher;
use crate::storage::{AccountPhase, AccountStore, TrackedAccount};
use crate::twitter::{ExternalId, END_CURSOR};

/// What processing one account produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// The account was enumerated and is now tracked.
    Enumerated { total: usize },
    /// The account was polled; `new` lists followings not seen before.
    Checked { new: Vec<ExternalId> },
}

impl DiscoveryOutcome {
    /// Newly discovered followings (empty after an enumeration).
    #[must_use]
    pub fn new_followings(&self) -> &[ExternalId] {
        match self {
            Self::Enumerated { .. } => &[],
            Self::Checked { new } => new,
        }
    }
}

/// Drives the per-account state machine.
pub struct DiscoveryEngine {
    fetcher: FollowingsFetcher,
    store: Arc<dyn AccountStore>,
}

impl DiscoveryEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(fetcher: FollowingsFetcher, store: Arc<dyn AccountStore>) -> Self {
        Self { fetcher, store }
    }

    /// Enumerate or poll `account` depending on its phase.
    pub async fn process(
        &self,
        account: &TrackedAccount,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        match account.phase() {
            AccountPhase::Untracked => {
                info!(username = %account.username, "Account is not tracked yet");
                let total = self.track_user(account).await?;
                Ok(DiscoveryOutcome::Enumerated { total })
            }
            AccountPhase::Tracked => {
                debug!(username = %account.username, "Account is already tracked");
                let new = self.check_for_new_followings(account).await?;
                Ok(DiscoveryOutcome::Checked { new })
            }
        }
    }

    /// Take the initial snapshot of an account's followings.
    ///
    /// Nothing is written unless every page was fetched.
    pub async fn track_user(&self, account: &TrackedAccount) -> Result<usize, DiscoveryError> {
        info!(
            username = %account.username,
            "Starting full enumeration"
        );

        let snapshot = self.fetcher.fetch_all(&account.username).await?;

        self.store
            .complete_enumeration(&account.user_id, &snapshot.ids, snapshot.terminal_cursor)
            .await?;

        info!(
            username = %account.username,
            total = snapshot.ids.len(),
            cursor = snapshot.terminal_cursor,
            "Account is now tracked"
        );

        Ok(snapshot.ids.len())
    }

    /// Poll one page at the stored cursor and report followings not seen before.
    pub async fn check_for_new_followings(
        &self,
        account: &TrackedAccount,
    ) -> Result<Vec<ExternalId>, DiscoveryError> {
        debug!(
            username = %account.username,
            cursor = account.cursor,
            "Checking for new followings"
        );

        let page = self
            .fetcher
            .fetch_page(&account.username, account.cursor)
            .await?;

        let new = new_followings(&page.items, account);
        let cursor = (page.prev_cursor != END_CURSOR).then_some(page.prev_cursor);

        if !new.is_empty() || cursor.is_some_and(|c| c != account.cursor) {
            self.store
                .record_poll(&account.user_id, &new, cursor)
                .await?;
        }

        info!(
            username = %account.username,
            count = new.len(),
            cursor = cursor.unwrap_or(account.cursor),
            "Checked followings"
        );

        Ok(new)
    }
}

/// Items of `page` that `account` does not follow yet, in page order, each once.
#[must_use]
pub fn new_followings(page: &[ExternalId], account: &TrackedAccount) -> Vec<ExternalId> {
    let mut seen = HashSet::new();
    page.iter()
        .copied()
        .filter(|id| !account.follows(*id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, FetchError};
    use crate::fetcher::tests::{fast_retry, pool, ScriptedApi};
    use crate::storage::MemoryAccountStore;
    use crate::twitter::FollowingPage;
    use std::collections::BTreeSet;

    fn engine(api: ScriptedApi, store: Arc<MemoryAccountStore>) -> DiscoveryEngine {
        let fetcher = FollowingsFetcher::new(Arc::new(api), pool(2), 200, fast_retry());
        DiscoveryEngine::new(fetcher, store)
    }

    fn tracked(user_id: &str, username: &str, known: &[ExternalId], cursor: i64) -> TrackedAccount {
        TrackedAccount {
            tracked: true,
            cursor,
            followings_list: known.iter().copied().collect(),
            ..TrackedAccount::new(user_id, username)
        }
    }

    #[tokio::test]
    async fn test_enumeration_of_untracked_account() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![TrackedAccount::new(
            "a", "alice",
        )]));
        let api = ScriptedApi::default()
            .page(-1, FollowingPage::new(vec![1, 2], 5, 0))
            .page(5, FollowingPage::new(vec![3], 0, -5));
        let engine = engine(api, store.clone());

        let account = store.get_account("a").await.unwrap().unwrap();
        let outcome = engine.process(&account).await.unwrap();

        assert_eq!(outcome, DiscoveryOutcome::Enumerated { total: 3 });
        assert!(outcome.new_followings().is_empty());

        let account = store.get_account("a").await.unwrap().unwrap();
        assert_eq!(account.phase(), AccountPhase::Tracked);
        assert_eq!(account.followings_list, BTreeSet::from([1, 2, 3]));
        assert_eq!(account.cursor, 5);
    }

    #[tokio::test]
    async fn test_enumeration_deduplicates_across_pages() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![TrackedAccount::new(
            "a", "alice",
        )]));
        let api = ScriptedApi::default()
            .page(-1, FollowingPage::new(vec![1, 2, 2], 5, 0))
            .page(5, FollowingPage::new(vec![2, 3, 1], 0, -5));
        let engine = engine(api, store.clone());

        let account = store.get_account("a").await.unwrap().unwrap();
        let total = engine.track_user(&account).await.unwrap();

        assert_eq!(total, 3);
        let account = store.get_account("a").await.unwrap().unwrap();
        assert_eq!(account.followings_list.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_enumeration_persists_nothing() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![TrackedAccount::new(
            "a", "alice",
        )]));
        let api = ScriptedApi::default()
            .page(-1, FollowingPage::new(vec![1, 2], 5, 0))
            .once(
                5,
                Err(ApiError::Api {
                    status: 401,
                    message: "Not authorized.".to_string(),
                }),
            );
        let engine = engine(api, store.clone());

        let account = store.get_account("a").await.unwrap().unwrap();
        let err = engine.process(&account).await.unwrap_err();

        assert!(matches!(err, DiscoveryError::Fetch(FetchError::Api(_))));
        let account = store.get_account("a").await.unwrap().unwrap();
        assert_eq!(account.phase(), AccountPhase::Untracked);
        assert_eq!(account, TrackedAccount::new("a", "alice"));
    }

    #[tokio::test]
    async fn test_tracked_account_reports_difference() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "b",
            "bob",
            &[1, 2],
            5,
        )]));
        let api = ScriptedApi::default().page(5, FollowingPage::new(vec![2, 3, 4], 0, 7));
        let engine = engine(api, store.clone());

        let account = store.get_account("b").await.unwrap().unwrap();
        let outcome = engine.process(&account).await.unwrap();

        assert_eq!(outcome.new_followings(), &[3, 4]);
        let account = store.get_account("b").await.unwrap().unwrap();
        assert_eq!(account.followings_list, BTreeSet::from([1, 2, 3, 4]));
        assert_eq!(account.cursor, 7);
    }

    #[tokio::test]
    async fn test_second_check_with_unchanged_remote_is_empty() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "b",
            "bob",
            &[1, 2],
            5,
        )]));
        let page = FollowingPage::new(vec![2, 3, 4], 0, 7);
        let api = ScriptedApi::default().page(5, page.clone()).page(7, page);
        let engine = engine(api, store.clone());

        let first = store.get_account("b").await.unwrap().unwrap();
        assert_eq!(engine.check_for_new_followings(&first).await.unwrap(), vec![3, 4]);

        let second = store.get_account("b").await.unwrap().unwrap();
        assert!(engine
            .check_for_new_followings(&second)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_zero_prev_cursor_keeps_cursor_and_reports_all() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "c", "carol", &[], -1,
        )]));
        let api = ScriptedApi::default().page(-1, FollowingPage::new(vec![8, 9], 0, 0));
        let engine = engine(api, store.clone());

        let account = store.get_account("c").await.unwrap().unwrap();
        let new = engine.check_for_new_followings(&account).await.unwrap();

        assert_eq!(new, vec![8, 9]);
        let account = store.get_account("c").await.unwrap().unwrap();
        assert_eq!(account.cursor, -1);
        assert_eq!(account.followings_list, BTreeSet::from([8, 9]));
    }

    #[test]
    fn test_new_followings_collapses_duplicates_in_page() {
        let account = tracked("d", "dave", &[1], -1);
        assert_eq!(new_followings(&[1, 2, 2, 3, 2], &account), vec![2, 3]);
    }
}
