//! Account store backed by a single JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::twitter::ExternalId;

use super::{AccountStore, Roster, TrackedAccount};

/// Roster persisted as one JSON document.
///
/// The file is the only copy of the roster: reads load it fresh and every
/// mutation is a read-modify-write under the store's lock, so accounts added
/// or removed by another process are picked up and never overwritten. Writes
/// go through a temporary sibling and a rename, so a crash leaves either the
/// old or the new roster on disk.
#[derive(Debug)]
pub struct JsonAccountStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonAccountStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let roster = Self::load(&path)?;

        debug!(
            path = %path.display(),
            accounts = roster.accounts.len(),
            "Opened account store"
        );

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Roster, StoreError> {
        if !path.exists() {
            return Ok(Roster::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn read(&self) -> Result<Roster, StoreError> {
        let _guard = self.lock.lock().await;
        Self::load(&self.path)
    }

    /// Apply `change` to the on-disk roster; the file is untouched if `change` fails.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Roster) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut roster = Self::load(&self.path)?;
        let out = change(&mut roster)?;
        self.save(&roster)?;
        Ok(out)
    }

    fn save(&self, roster: &Roster) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(roster)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn all_accounts(&self) -> Result<Vec<TrackedAccount>, StoreError> {
        Ok(self.read().await?.accounts)
    }

    async fn get_account(&self, user_id: &str) -> Result<Option<TrackedAccount>, StoreError> {
        Ok(self.read().await?.get(user_id).cloned())
    }

    async fn add_account(&self, account: TrackedAccount) -> Result<(), StoreError> {
        self.mutate(|r| r.add(account)).await
    }

    async fn remove_account(&self, username: &str) -> Result<bool, StoreError> {
        self.mutate(|r| Ok(r.remove(username))).await
    }

    async fn update_cursor(&self, user_id: &str, cursor: i64) -> Result<(), StoreError> {
        self.mutate(|r| r.update_cursor(user_id, cursor)).await
    }

    async fn append_followings(
        &self,
        user_id: &str,
        ids: &[ExternalId],
    ) -> Result<(), StoreError> {
        self.mutate(|r| r.append_followings(user_id, ids)).await
    }

    async fn mark_tracked(&self, user_id: &str) -> Result<(), StoreError> {
        self.mutate(|r| r.mark_tracked(user_id)).await
    }

    async fn record_poll(
        &self,
        user_id: &str,
        new_ids: &[ExternalId],
        cursor: Option<i64>,
    ) -> Result<(), StoreError> {
        self.mutate(|r| r.record_poll(user_id, new_ids, cursor))
            .await
    }

    async fn complete_enumeration(
        &self,
        user_id: &str,
        ids: &[ExternalId],
        cursor: i64,
    ) -> Result<(), StoreError> {
        self.mutate(|r| r.complete_enumeration(user_id, ids, cursor))
            .await
    }
}
