//! Channel that writes notifications to the tracing log.

use async_trait::async_trait;
use tracing::info;

use crate::error::ChannelError;
use crate::message::NotificationMessage;
use crate::NotifyChannel;

/// Logs every message at info level. Used when no remote channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl NotifyChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), ChannelError> {
        info!(channel = "log", text = %message.text, "Notification");
        Ok(())
    }
}
