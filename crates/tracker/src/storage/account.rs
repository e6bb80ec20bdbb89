//! Tracked account records and the roster that holds them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::twitter::{ExternalId, START_CURSOR};

/// Persisted lifecycle phase of an account.
///
/// The full enumeration between the two is never stored: it runs inside
/// [`crate::discovery::DiscoveryEngine::track_user`] and either completes,
/// flipping the account to `Tracked`, or leaves it `Untracked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountPhase {
    /// Registered, followings never enumerated.
    Untracked,
    /// Snapshot taken; polled incrementally.
    Tracked,
}

/// A monitored account and its persisted discovery state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    /// Opaque external identifier.
    pub user_id: String,
    /// Screen name used for listing calls and messages.
    pub username: String,
    /// Set once the initial snapshot has been stored.
    #[serde(default)]
    pub tracked: bool,
    /// Last consumed page boundary.
    #[serde(default = "start_cursor")]
    pub cursor: i64,
    /// Every followed ID known so far.
    #[serde(default)]
    pub followings_list: BTreeSet<ExternalId>,
}

fn start_cursor() -> i64 {
    START_CURSOR
}

impl TrackedAccount {
    /// A freshly registered, untracked account.
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            tracked: false,
            cursor: START_CURSOR,
            followings_list: BTreeSet::new(),
        }
    }

    /// Current lifecycle phase as seen from storage.
    #[must_use]
    pub fn phase(&self) -> AccountPhase {
        if self.tracked {
            AccountPhase::Tracked
        } else {
            AccountPhase::Untracked
        }
    }

    /// Whether `id` is already a known following.
    #[must_use]
    pub fn follows(&self, id: ExternalId) -> bool {
        self.followings_list.contains(&id)
    }
}

/// The full set of accounts, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub accounts: Vec<TrackedAccount>,
}

impl Roster {
    pub(crate) fn get(&self, user_id: &str) -> Option<&TrackedAccount> {
        self.accounts.iter().find(|a| a.user_id == user_id)
    }

    fn get_mut(&mut self, user_id: &str) -> Result<&mut TrackedAccount, StoreError> {
        self.accounts
            .iter_mut()
            .find(|a| a.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    pub(crate) fn add(&mut self, account: TrackedAccount) -> Result<(), StoreError> {
        let clash = self.accounts.iter().any(|a| {
            a.user_id == account.user_id || a.username.eq_ignore_ascii_case(&account.username)
        });
        if clash {
            return Err(StoreError::Duplicate(account.username));
        }
        self.accounts.push(account);
        Ok(())
    }

    pub(crate) fn remove(&mut self, username: &str) -> bool {
        let before = self.accounts.len();
        self.accounts
            .retain(|a| !a.username.eq_ignore_ascii_case(username));
        self.accounts.len() != before
    }

    pub(crate) fn update_cursor(&mut self, user_id: &str, cursor: i64) -> Result<(), StoreError> {
        self.get_mut(user_id)?.cursor = cursor;
        Ok(())
    }

    pub(crate) fn append_followings(
        &mut self,
        user_id: &str,
        ids: &[ExternalId],
    ) -> Result<(), StoreError> {
        self.get_mut(user_id)?
            .followings_list
            .extend(ids.iter().copied());
        Ok(())
    }

    pub(crate) fn mark_tracked(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.get_mut(user_id)?.tracked = true;
        Ok(())
    }

    /// Apply a steady-state poll result: new items first, then the cursor.
    pub(crate) fn record_poll(
        &mut self,
        user_id: &str,
        new_ids: &[ExternalId],
        cursor: Option<i64>,
    ) -> Result<(), StoreError> {
        let account = self.get_mut(user_id)?;
        account.followings_list.extend(new_ids.iter().copied());
        if let Some(cursor) = cursor {
            account.cursor = cursor;
        }
        Ok(())
    }

    /// Apply a finished enumeration: snapshot, cursor, then the tracked flag.
    pub(crate) fn complete_enumeration(
        &mut self,
        user_id: &str,
        ids: &[ExternalId],
        cursor: i64,
    ) -> Result<(), StoreError> {
        let account = self.get_mut(user_id)?;
        account.followings_list.extend(ids.iter().copied());
        account.cursor = cursor;
        account.tracked = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults() {
        let account = TrackedAccount::new("42", "jack");
        assert!(!account.tracked);
        assert_eq!(account.cursor, START_CURSOR);
        assert!(account.followings_list.is_empty());
        assert_eq!(account.phase(), AccountPhase::Untracked);
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let account: TrackedAccount =
            serde_json::from_str(r#"{"user_id": "42", "username": "jack"}"#).unwrap();
        assert_eq!(account, TrackedAccount::new("42", "jack"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let mut roster = Roster::default();
        roster.add(TrackedAccount::new("1", "Jack")).unwrap();
        assert!(matches!(
            roster.add(TrackedAccount::new("2", "jack")),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn test_record_poll_keeps_cursor_when_none() {
        let mut roster = Roster::default();
        roster.add(TrackedAccount::new("1", "jack")).unwrap();
        roster.update_cursor("1", 9).unwrap();

        roster.record_poll("1", &[3, 4], None).unwrap();

        let account = roster.get("1").unwrap();
        assert_eq!(account.cursor, 9);
        assert!(account.follows(3) && account.follows(4));
    }

    #[test]
    fn test_complete_enumeration_marks_tracked() {
        let mut roster = Roster::default();
        roster.add(TrackedAccount::new("1", "jack")).unwrap();

        roster.complete_enumeration("1", &[1, 2, 2, 3], 5).unwrap();

        let account = roster.get("1").unwrap();
        assert_eq!(account.phase(), AccountPhase::Tracked);
        assert_eq!(account.cursor, 5);
        assert_eq!(account.followings_list, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_unknown_account_is_not_found() {
        let mut roster = Roster::default();
        assert!(matches!(
            roster.mark_tracked("missing"),
            Err(StoreError::NotFound(_))
        ));
        assert!(!roster.remove("missing"));
    }
}
