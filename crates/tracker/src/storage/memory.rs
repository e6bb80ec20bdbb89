//! In-process account store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::twitter::ExternalId;

use super::{AccountStore, Roster, TrackedAccount};

/// Volatile store; state is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    roster: Mutex<Roster>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `accounts`.
    #[must_use]
    pub fn with_accounts(accounts: Vec<TrackedAccount>) -> Self {
        Self {
            roster: Mutex::new(Roster { accounts }),
        }
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>, StoreError> {
        Ok(self.roster.lock().await.accounts.clone())
    }

    async fn get_account(&self, user_id: &str) -> Result<Option<TrackedAccount>, StoreError> {
        Ok(self.roster.lock().await.get(user_id).cloned())
    }

    async fn add_account(&self, account: TrackedAccount) -> Result<(), StoreError> {
        self.roster.lock().await.add(account)
    }

    async fn remove_account(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.roster.lock().await.remove(username))
    }

    async fn update_cursor(&self, user_id: &str, cursor: i64) -> Result<(), StoreError> {
        self.roster.lock().await.update_cursor(user_id, cursor)
    }

    async fn append_followings(
        &self,
        user_id: &str,
        ids: &[ExternalId],
    ) -> Result<(), StoreError> {
        self.roster.lock().await.append_followings(user_id, ids)
    }

    async fn mark_tracked(&self, user_id: &str) -> Result<(), StoreError> {
        self.roster.lock().await.mark_tracked(user_id)
    }

    async fn record_poll(
        &self,
        user_id: &str,
        new_ids: &[ExternalId],
        cursor: Option<i64>,
    ) -> Result<(), StoreError> {
        self.roster.lock().await.record_poll(user_id, new_ids, cursor)
    }

    async fn complete_enumeration(
        &self,
        user_id: &str,
        ids: &[ExternalId],
        cursor: i64,
    ) -> Result<(), StoreError> {
        self.roster
            .lock()
            .await
            .complete_enumeration(user_id, ids, cursor)
    }
}
