use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::{Credentials, TelegramConfig};
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Posts reports through the Bot API `sendMessage` method with HTML formatting
/// and link previews disabled.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    credentials: Credentials,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(TelegramNotifier {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    // Embeds the bot token: never log this.
    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.credentials.bot_token)
    }

    fn create_payload(&self, text: &str) -> serde_json::Value {
        json!({
            "chat_id": self.credentials.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        })
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, text: &str) -> Result<NotificationResult> {
        let payload = self.create_payload(text);

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notify(e.without_url().to_string()))?;

        let status = response.status();
        let body: TelegramResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(NotificationResult::rejected(format!(
                    "Malformed response (status {}): {}",
                    status.as_u16(),
                    e.without_url()
                )));
            }
        };

        if status.is_success() && body.ok {
            Ok(NotificationResult::delivered(
                body.result.map(|message| message.message_id.to_string()),
            ))
        } else {
            Ok(NotificationResult::rejected(format!(
                "Status {}: {}",
                status.as_u16(),
                body.description.unwrap_or_else(|| "no description".to_string())
            )))
        }
    }
}
