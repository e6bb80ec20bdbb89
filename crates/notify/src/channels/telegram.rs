//! Telegram Bot API notification channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::message::NotificationMessage;
use crate::NotifyChannel;

/// Environment variable for the bot token.
const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the destination chat.
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Public Bot API endpoint.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Fallback when a 429 response carries no `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Telegram channel posting to a single chat via `sendMessage`.
pub struct TelegramChannel {
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a Telegram channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let bot_token = std::env::var(ENV_TELEGRAM_BOT_TOKEN).ok();
        let chat_id = std::env::var(ENV_TELEGRAM_CHAT_ID).ok();

        if bot_token.is_some() && chat_id.is_some() {
            debug!("Telegram notifications enabled");
        } else {
            debug!("Telegram notifications disabled (TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set)");
        }

        Self {
            bot_token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a Telegram channel with explicit credentials.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: Some(bot_token.into()),
            chat_id: Some(chat_id.into()),
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the channel at a different Bot API host.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{token}/sendMessage", self.api_base)
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn enabled(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    async fn send(&self, message: &NotificationMessage) -> Result<(), ChannelError> {
        let token = self
            .bot_token
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_BOT_TOKEN.to_string()))?;
        let chat_id = self
            .chat_id
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_CHAT_ID.to_string()))?;

        let payload = SendMessage {
            chat_id,
            text: &message.text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        debug!(channel = "telegram", "Sending notification");

        let response = self
            .client
            .post(self.endpoint(token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "telegram", "Notification sent successfully");
            return Ok(());
        }

        // Telegram reports failures as a JSON body; fall back to the status line.
        let body: TelegramResponse = response.json().await.unwrap_or_default();

        if status == 429 {
            let retry_after = body
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            warn!(
                channel = "telegram",
                retry_after_secs = retry_after,
                "Rate limited by Telegram"
            );

            return Err(ChannelError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = body
            .description
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        warn!(
            channel = "telegram",
            status = %status,
            description = %description,
            "Telegram sendMessage failed"
        );

        Err(ChannelError::Api {
            code: status.as_u16(),
            description,
        })
    }
}

// =============================================================================
// Telegram API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer) -> TelegramChannel {
        TelegramChannel::new("123:abc", "-1001").with_api_base(server.uri())
    }

    #[tokio::test]
    async fn test_send_posts_markdown_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": "-1001",
                "text": "[a](https://twitter.com/a) just started to follow [b](https://twitter.com/b).",
                "parse_mode": "Markdown"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let message = NotificationMessage::new(
            "[a](https://twitter.com/a) just started to follow [b](https://twitter.com/b).",
        );
        channel(&server).send(&message).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 17",
                "parameters": {"retry_after": 17}
            })))
            .mount(&server)
            .await;

        let err = channel(&server)
            .send(&NotificationMessage::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChannelError::RateLimited {
                retry_after_secs: 17
            }
        ));
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = channel(&server)
            .send(&NotificationMessage::new("hello"))
            .await
            .unwrap_err();
        match err {
            ChannelError::Api { code, description } => {
                assert_eq!(code, 400);
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_enabled_requires_token_and_chat() {
        let channel = TelegramChannel {
            bot_token: Some("t".to_string()),
            chat_id: None,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        };
        assert!(!channel.enabled());
        assert!(TelegramChannel::new("t", "c").enabled());
    }
}
