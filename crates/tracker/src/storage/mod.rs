//! Account storage.
//!
//! The engine only needs a handful of record operations. Every call is
//! expected to be durable and individually atomic; the combined
//! [`AccountStore::record_poll`] and [`AccountStore::complete_enumeration`]
//! updates exist so a crash can never leave a cursor ahead of the followings
//! it covers.

mod account;
mod json;
mod memory;

pub use account::{AccountPhase, Roster, TrackedAccount};
pub use json::JsonAccountStore;
pub use memory::MemoryAccountStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::twitter::ExternalId;

/// Persistent roster of tracked accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Every registered account, in registration order.
    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>, StoreError>;

    /// Look up one account by user ID.
    async fn get_account(&self, user_id: &str) -> Result<Option<TrackedAccount>, StoreError>;

    /// Register a new account.
    async fn add_account(&self, account: TrackedAccount) -> Result<(), StoreError>;

    /// Remove an account by username. Returns whether one was removed.
    async fn remove_account(&self, username: &str) -> Result<bool, StoreError>;

    async fn update_cursor(&self, user_id: &str, cursor: i64) -> Result<(), StoreError>;

    async fn append_followings(&self, user_id: &str, ids: &[ExternalId])
        -> Result<(), StoreError>;

    async fn mark_tracked(&self, user_id: &str) -> Result<(), StoreError>;

    /// Persist a steady-state poll: new followings, then the advanced cursor.
    async fn record_poll(
        &self,
        user_id: &str,
        new_ids: &[ExternalId],
        cursor: Option<i64>,
    ) -> Result<(), StoreError> {
        if !new_ids.is_empty() {
            self.append_followings(user_id, new_ids).await?;
        }
        if let Some(cursor) = cursor {
            self.update_cursor(user_id, cursor).await?;
        }
        Ok(())
    }

    /// Persist a finished enumeration: snapshot, cursor, then the tracked flag.
    async fn complete_enumeration(
        &self,
        user_id: &str,
        ids: &[ExternalId],
        cursor: i64,
    ) -> Result<(), StoreError> {
        self.append_followings(user_id, ids).await?;
        self.update_cursor(user_id, cursor).await?;
        self.mark_tracked(user_id).await
    }
}
