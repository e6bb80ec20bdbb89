//! Startup configuration: credentials file and polling knobs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::ConfigError;

/// Contents of the credentials file.
///
/// ```json
/// {"TWITTER_APPS_CREDS": [{"APP_API_KEY": "...", "APP_API_KEY_SECRET": "...",
///   "APP_ACCESS_TOKEN": "...", "APP_ACCESS_TOKEN_SECRET": "..."}]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// One entry per Twitter app.
    #[serde(rename = "TWITTER_APPS_CREDS", default)]
    pub apps: Vec<Credentials>,
}

impl TrackerConfig {
    /// Load and validate the credentials file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.apps.is_empty() {
            return Err(ConfigError::NoCredentials);
        }
        for (index, creds) in config.apps.iter().enumerate() {
            creds.validate(index)?;
        }

        Ok(config)
    }
}

/// Retry limits for a single page request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause after a rate-limit response before switching credentials.
    pub rate_limit_backoff: Duration,
    /// Rate-limit responses tolerated for one page before giving up.
    pub max_rate_limit_retries: u32,
    /// Pause after a network or 5xx failure.
    pub transient_backoff: Duration,
    /// Transient failures tolerated for one page before giving up.
    pub max_transient_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_backoff: Duration::from_secs(3),
            max_rate_limit_retries: 10,
            transient_backoff: Duration::from_secs(5),
            max_transient_retries: 5,
        }
    }
}

/// Configuration for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Accounts requested per followings page (API maximum is 200).
    pub page_size: u32,
    /// Retry limits for page fetches.
    pub retry: RetryPolicy,
    /// Sleep when the roster is empty.
    pub idle_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            retry: RetryPolicy::default(),
            idle_backoff: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.page_size, 200);
        assert_eq!(config.idle_backoff, Duration::from_secs(10));
        assert_eq!(config.retry.rate_limit_backoff, Duration::from_secs(3));
        assert_eq!(config.retry.max_rate_limit_retries, 10);
    }

    #[test]
    fn test_load_credentials_file() {
        let file = write_config(
            r#"{"TWITTER_APPS_CREDS": [
                {"APP_API_KEY": "k1", "APP_API_KEY_SECRET": "s1",
                 "APP_ACCESS_TOKEN": "t1", "APP_ACCESS_TOKEN_SECRET": "ts1"},
                {"APP_API_KEY": "k2", "APP_API_KEY_SECRET": "s2",
                 "APP_ACCESS_TOKEN": "t2", "APP_ACCESS_TOKEN_SECRET": "ts2"}
            ]}"#,
        );

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.apps.len(), 2);
        assert_eq!(config.apps[1].api_key, "k2");
    }

    #[test]
    fn test_load_rejects_empty_credentials() {
        let file = write_config(r#"{"TWITTER_APPS_CREDS": []}"#);
        assert!(matches!(
            TrackerConfig::load(file.path()),
            Err(ConfigError::NoCredentials)
        ));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let file = write_config("{not json");
        assert!(matches!(
            TrackerConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TrackerConfig::load(Path::new("/nonexistent/twitter_config.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
