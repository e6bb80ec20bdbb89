//! Notification messages and the queue they travel through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// A rendered, human-readable notification.
///
/// The text is Markdown with inline links, which is what Telegram's
/// legacy `Markdown` parse mode expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message body.
    pub text: String,
    /// When the message was produced.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl NotificationMessage {
    /// Create a message stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Producer side of the delivery queue.
///
/// `push` never waits on the consumer.
pub trait MessageSink: Send + Sync {
    /// Enqueue a message for delivery.
    fn push(&self, message: NotificationMessage);
}

impl MessageSink for mpsc::UnboundedSender<NotificationMessage> {
    fn push(&self, message: NotificationMessage) {
        if let Err(e) = self.send(message) {
            warn!(text = %e.0.text, "Delivery queue closed, dropping notification");
        }
    }
}

/// Create the single-consumer delivery queue.
#[must_use]
pub fn queue() -> (
    mpsc::UnboundedSender<NotificationMessage>,
    mpsc::UnboundedReceiver<NotificationMessage>,
) {
    mpsc::unbounded_channel()
}
