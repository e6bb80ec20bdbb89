//! Delivery of follow notifications.
//!
//! The tracker produces [`NotificationMessage`]s onto an unbounded queue and
//! never waits for delivery. A single [`Notifier`] drains that queue and hands
//! each message to every enabled channel, in queue order.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{queue, MessageSink, NotificationMessage, Notifier};
//!
//! # async fn example() {
//! let (tx, rx) = queue();
//! let notifier = Notifier::from_env();
//! tokio::spawn(notifier.run(rx));
//!
//! tx.push(NotificationMessage::new("hello"));
//! # }
//! ```
//!
//! # Configuration
//!
//! - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`: enable the Telegram channel
//! - `NOTIFY_DISABLED`: set to "true" to drop all notifications
//!
//! With nothing configured the notifier falls back to [`LogChannel`].

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod message;

pub use channels::log::LogChannel;
pub use channels::telegram::TelegramChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use message::{queue, MessageSink, NotificationMessage};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Longest rate-limit pause honoured before giving up on a message.
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Pause before resending after a retryable transport or server failure.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fans each queued message out to the configured channels.
///
/// An empty channel list means delivery is off.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
}

impl Notifier {
    /// Build the channel list from environment variables.
    ///
    /// Telegram is used when configured; otherwise messages go to the log.
    #[must_use]
    pub fn from_env() -> Self {
        if env_flag(ENV_NOTIFY_DISABLED) {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let telegram = TelegramChannel::from_env();
        let channel: Arc<dyn NotifyChannel> = if telegram.enabled() {
            info!("Delivering notifications to Telegram");
            Arc::new(telegram)
        } else {
            warn!("Telegram is not configured, logging notifications instead");
            Arc::new(LogChannel)
        };

        Self::with_channels(vec![channel])
    }

    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    /// A notifier that drops every message.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { channels: vec![] }
    }

    /// Deliver one message to every enabled channel and collect the outcomes.
    ///
    /// A send that fails with a retryable error is attempted once more after a
    /// pause: the channel's `retry_after` for rate limits, a short fixed delay
    /// otherwise. Rate limits longer than a minute are not waited out.
    pub async fn deliver(
        &self,
        message: &NotificationMessage,
    ) -> Vec<(&'static str, Result<(), ChannelError>)> {
        let mut results = vec![];

        for channel in self.channels.iter().filter(|c| c.enabled()) {
            let mut result = channel.send(message).await;
            if let Some(delay) = result.as_ref().err().and_then(retry_delay) {
                debug!(
                    channel = channel.name(),
                    delay_secs = delay.as_secs(),
                    "Retrying notification"
                );
                tokio::time::sleep(delay).await;
                result = channel.send(message).await;
            }

            match &result {
                Ok(()) => debug!(channel = channel.name(), "Notification sent"),
                Err(e) => error!(
                    channel = channel.name(),
                    error = %e,
                    "Failed to send notification"
                ),
            }

            results.push((channel.name(), result));
        }

        results
    }

    /// Drain the delivery queue until every producer has been dropped.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<NotificationMessage>) {
        info!(channels = self.channels.len(), "Delivery worker started");

        while let Some(message) = rx.recv().await {
            self.deliver(&message).await;
        }

        info!("Delivery queue closed, worker exiting");
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// How long to wait before resending after `err`, if at all.
fn retry_delay(err: &ChannelError) -> Option<Duration> {
    if !err.is_retryable() {
        return None;
    }
    match *err {
        ChannelError::RateLimited { retry_after_secs } => (retry_after_secs
            <= MAX_RETRY_AFTER_SECS)
            .then_some(Duration::from_secs(retry_after_secs)),
        _ => Some(RETRY_DELAY),
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_env()
    }
}
