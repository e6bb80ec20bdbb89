//! Credential pool with randomized selection.

use rand::Rng;

use crate::error::ConfigError;

use super::{CredentialSession, Credentials};

/// Fixed set of sessions shared by every API call.
///
/// Selection is uniform over the whole pool and stateless; a caller that hit a
/// rate limit simply selects again. There is no cool-down tracking, so the
/// throttled session can come back.
#[derive(Debug)]
pub struct CredentialPool {
    sessions: Vec<CredentialSession>,
}

impl CredentialPool {
    /// Build a pool from credential sets. At least one set is required.
    pub fn new(credentials: Vec<Credentials>) -> Result<Self, ConfigError> {
        if credentials.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        for (index, creds) in credentials.iter().enumerate() {
            creds.validate(index)?;
        }

        let sessions = credentials
            .into_iter()
            .enumerate()
            .map(|(index, creds)| CredentialSession::new(index, creds))
            .collect();

        Ok(Self { sessions })
    }

    /// Pick a session for the next call.
    pub fn select(&self) -> &CredentialSession {
        if self.sessions.len() == 1 {
            return &self.sessions[0];
        }
        let index = rand::rng().random_range(0..self.sessions.len());
        &self.sessions[index]
    }

    /// Number of sessions in the pool.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false; construction rejects empty pools.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
