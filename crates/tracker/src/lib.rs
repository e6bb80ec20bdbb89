//! Follow tracker: watches the followings of registered Twitter accounts.
//!
//! This crate provides:
//! - A rotating pool of Twitter app credentials with OAuth 1.0a signing
//! - Cursor-paginated followings fetching with rate-limit backoff
//! - Per-account discovery (initial enumeration, then incremental diffing)
//! - A polling scheduler that queues one notification per new follow
//! - JSON-file and in-memory account stores

pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod scheduler;
pub mod storage;
pub mod twitter;

// Re-export main types
pub use auth::{CredentialPool, CredentialSession, Credentials};
pub use config::{PollConfig, RetryPolicy, TrackerConfig};
pub use discovery::{DiscoveryEngine, DiscoveryOutcome};
pub use error::{ApiError, ConfigError, DiscoveryError, FetchError, FormatError, StoreError};
pub use fetcher::{FollowingsFetcher, FollowingsSnapshot};
pub use formatter::NotificationFormatter;
pub use scheduler::{wait_time, CycleOutcome, CycleReport, PollScheduler};
pub use storage::{AccountStore, JsonAccountStore, MemoryAccountStore, TrackedAccount};
pub use twitter::{ExternalId, FollowingPage, FollowingsApi, TwitterClient};
