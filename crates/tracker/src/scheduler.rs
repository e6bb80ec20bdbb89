//! The outer polling loop.

use std::sync::Arc;
use std::time::Duration;

use notify::MessageSink;
use tracing::{error, info, warn};

use crate::discovery::{DiscoveryEngine, DiscoveryOutcome};
use crate::formatter::NotificationFormatter;
use crate::storage::AccountStore;

/// Pause between cycles for a roster of `account_count` accounts.
///
/// Larger rosters get a shorter pause so each account is revisited sooner.
#[must_use]
pub fn wait_time(account_count: usize) -> Duration {
    let secs = match account_count {
        0..=5 => 240,
        6..=10 => 180,
        _ => 120,
    };
    Duration::from_secs(secs)
}

/// Counters for one completed cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Accounts on the roster.
    pub accounts: usize,
    /// Accounts that finished their initial enumeration.
    pub enumerated: usize,
    /// Tracked accounts polled successfully.
    pub checked: usize,
    /// New followings discovered.
    pub new_followings: usize,
    /// Messages handed to the delivery queue.
    pub notified: usize,
    /// Followings whose notification was skipped.
    pub resolution_failures: usize,
    /// Usernames skipped this cycle because discovery failed.
    pub failed_accounts: Vec<String>,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to poll.
    EmptyRoster,
    /// The roster could not be loaded.
    RosterUnavailable,
    /// Every account was visited.
    Completed(CycleReport),
}

/// Visits every account once per cycle, forever.
pub struct PollScheduler {
    store: Arc<dyn AccountStore>,
    engine: DiscoveryEngine,
    formatter: NotificationFormatter,
    sink: Arc<dyn MessageSink>,
    idle_backoff: Duration,
}

impl PollScheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        engine: DiscoveryEngine,
        formatter: NotificationFormatter,
        sink: Arc<dyn MessageSink>,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            formatter,
            sink,
            idle_backoff,
        }
    }

    /// Run cycles until the process ends.
    pub async fn run_forever(&self) {
        info!("Followings tracker is ready");

        loop {
            let outcome = self.run_cycle().await;
            let delay = self.next_delay(&outcome);
            info!(sleep_secs = delay.as_secs(), "Sleeping until next cycle");
            tokio::time::sleep(delay).await;
        }
    }

    /// Sleep to apply after `outcome`.
    #[must_use]
    pub fn next_delay(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::EmptyRoster | CycleOutcome::RosterUnavailable => self.idle_backoff,
            CycleOutcome::Completed(report) => wait_time(report.accounts),
        }
    }

    /// Visit every account once, sequentially, in roster order.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let accounts = match self.store.all_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!(error = %e, "Failed to load accounts");
                return CycleOutcome::RosterUnavailable;
            }
        };

        if accounts.is_empty() {
            info!("No accounts in the store");
            return CycleOutcome::EmptyRoster;
        }

        info!(count = accounts.len(), "Got accounts from store");

        let mut report = CycleReport {
            accounts: accounts.len(),
            ..CycleReport::default()
        };

        for account in &accounts {
            info!(username = %account.username, "Target account");

            let outcome = match self.engine.process(account).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        username = %account.username,
                        error = %e,
                        "Skipping account for this cycle"
                    );
                    report.failed_accounts.push(account.username.clone());
                    continue;
                }
            };

            match &outcome {
                DiscoveryOutcome::Enumerated { .. } => report.enumerated += 1,
                DiscoveryOutcome::Checked { new } => {
                    report.checked += 1;
                    report.new_followings += new.len();
                }
            }

            for &followed_id in outcome.new_followings() {
                match self.formatter.format(followed_id, &account.username).await {
                    Ok(message) => {
                        self.sink.push(message);
                        report.notified += 1;
                    }
                    Err(e) => {
                        warn!(
                            username = %account.username,
                            error = %e,
                            "Skipping notification"
                        );
                        report.resolution_failures += 1;
                    }
                }
            }
        }

        info!(
            accounts = report.accounts,
            enumerated = report.enumerated,
            checked = report.checked,
            new_followings = report.new_followings,
            notified = report.notified,
            failed = report.failed_accounts.len(),
            "Cycle complete"
        );

        CycleOutcome::Completed(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::fetcher::tests::{fast_retry, pool, ScriptedApi};
    use crate::fetcher::FollowingsFetcher;
    use crate::formatter::render;
    use crate::storage::{MemoryAccountStore, TrackedAccount};
    use crate::twitter::{ExternalId, FollowingPage};
    use notify::NotificationMessage;
    use tokio::sync::mpsc;

    fn tracked(user_id: &str, username: &str, known: &[ExternalId], cursor: i64) -> TrackedAccount {
        TrackedAccount {
            tracked: true,
            cursor,
            followings_list: known.iter().copied().collect(),
            ..TrackedAccount::new(user_id, username)
        }
    }

    fn scheduler(
        api: ScriptedApi,
        store: Arc<MemoryAccountStore>,
    ) -> (PollScheduler, mpsc::UnboundedReceiver<NotificationMessage>) {
        let api = Arc::new(api);
        let pool = pool(2);
        let fetcher = FollowingsFetcher::new(api.clone(), pool.clone(), 200, fast_retry());
        let engine = DiscoveryEngine::new(fetcher, store.clone());
        let formatter = NotificationFormatter::new(api, pool);
        let (tx, rx) = notify::queue();
        let scheduler = PollScheduler::new(
            store,
            engine,
            formatter,
            Arc::new(tx),
            Duration::from_secs(10),
        );
        (scheduler, rx)
    }

    #[test]
    fn test_wait_time_tiers() {
        assert_eq!(wait_time(1), Duration::from_secs(240));
        assert_eq!(wait_time(5), Duration::from_secs(240));
        assert_eq!(wait_time(6), Duration::from_secs(180));
        assert_eq!(wait_time(10), Duration::from_secs(180));
        assert_eq!(wait_time(11), Duration::from_secs(120));
        assert_eq!(wait_time(1000), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_empty_roster_idles() {
        let (scheduler, _rx) = scheduler(ScriptedApi::default(), Arc::new(MemoryAccountStore::new()));

        let outcome = scheduler.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::EmptyRoster);
        assert_eq!(scheduler.next_delay(&outcome), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cycle_enqueues_one_message_per_new_following() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "b",
            "bob",
            &[1, 2],
            5,
        )]));
        let api = ScriptedApi::default()
            .page(5, FollowingPage::new(vec![2, 3, 4], 0, 7))
            .name(3, "carol")
            .name(4, "dan");
        let (scheduler, mut rx) = scheduler(api, store);

        let outcome = scheduler.run_cycle().await;

        let CycleOutcome::Completed(report) = outcome else {
            panic!("expected a completed cycle");
        };
        assert_eq!(report.new_followings, 2);
        assert_eq!(report.notified, 2);
        assert_eq!(scheduler.next_delay(&CycleOutcome::Completed(report)), wait_time(1));

        assert_eq!(rx.recv().await.unwrap().text, render("bob", "carol"));
        assert_eq!(rx.recv().await.unwrap().text, render("bob", "dan"));
    }

    #[tokio::test]
    async fn test_resolution_failure_skips_only_that_notification() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "b",
            "bob",
            &[],
            5,
        )]));
        let api = ScriptedApi::default()
            .page(5, FollowingPage::new(vec![3, 4], 0, 0))
            .name(4, "dan");
        let (scheduler, mut rx) = scheduler(api, store.clone());

        let CycleOutcome::Completed(report) = scheduler.run_cycle().await else {
            panic!("expected a completed cycle");
        };

        assert_eq!(report.resolution_failures, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(rx.recv().await.unwrap().text, render("bob", "dan"));

        // Both followings are recorded even though one message was skipped.
        let account = store.get_account("b").await.unwrap().unwrap();
        assert!(account.follows(3) && account.follows(4));
    }

    #[tokio::test]
    async fn test_failing_account_does_not_stop_cycle() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![
            tracked("x", "broken", &[], 11),
            TrackedAccount::new("a", "alice"),
        ]));
        let api = ScriptedApi::default()
            .once(
                11,
                Err(ApiError::Api {
                    status: 404,
                    message: "Sorry, that page does not exist.".to_string(),
                }),
            )
            .page(-1, FollowingPage::new(vec![1], 0, 0));
        let (scheduler, _rx) = scheduler(api, store.clone());

        let CycleOutcome::Completed(report) = scheduler.run_cycle().await else {
            panic!("expected a completed cycle");
        };

        assert_eq!(report.failed_accounts, vec!["broken".to_string()]);
        assert_eq!(report.enumerated, 1);
        assert!(store.get_account("a").await.unwrap().unwrap().tracked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roster_emptied_mid_run_keeps_polling() {
        let store = Arc::new(MemoryAccountStore::with_accounts(vec![tracked(
            "b",
            "bob",
            &[1, 2],
            5,
        )]));
        let api = ScriptedApi::default()
            .page(5, FollowingPage::new(vec![2, 3], 0, 0))
            .page(-1, FollowingPage::new(vec![4], 0, 0))
            .name(3, "carol")
            .name(4, "dan");
        let (scheduler, mut rx) = scheduler(api, store.clone());
        let scheduler = Arc::new(scheduler);

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run_forever().await }
        });

        let first = tokio::time::timeout(Duration::from_secs(300), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.text, render("bob", "carol"));

        assert!(store.remove_account("bob").await.unwrap());
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(!handle.is_finished());

        store
            .add_account(tracked("d", "dora", &[], -1))
            .await
            .unwrap();

        let second = tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.text, render("dora", "dan"));

        handle.abort();
    }
}
