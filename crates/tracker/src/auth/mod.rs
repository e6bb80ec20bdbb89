//! Authentication module for Twitter API access.
//!
//! Provides credential sets, OAuth 1.0a signing and the rotating session pool.

mod credentials;
mod oauth;
mod pool;

pub use credentials::{CredentialSession, Credentials};
pub use pool::CredentialPool;
