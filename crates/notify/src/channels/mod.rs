//! Notification channel implementations.

pub mod log;
pub mod telegram;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::message::NotificationMessage;

/// Trait for notification channels (Telegram, log output, etc.).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver a message through this channel.
    async fn send(&self, message: &NotificationMessage) -> Result<(), ChannelError>;
}
