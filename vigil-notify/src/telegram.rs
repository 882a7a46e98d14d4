//! Telegram Bot API messenger

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use vigil_core::SubscriberId;

use crate::{Messenger, SendError};

/// Default Bot API host
const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram transport configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// API host, overridable for self-hosted bot API servers
    pub api_base: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot_token: bot_token.to_string(),
            api_base: TELEGRAM_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// `Messenger` backed by the Telegram Bot API
pub struct TelegramMessenger {
    client: Client,
    config: TelegramConfig,
}

impl TelegramMessenger {
    pub fn new(config: TelegramConfig) -> Result<Self, SendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        )
    }

    async fn check(&self, response: reqwest::Response) -> Result<(), SendError> {
        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if body.ok {
            Ok(())
        } else {
            Err(SendError::Rejected(
                body.description
                    .unwrap_or_else(|| format!("status {}", status)),
            ))
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, recipient: SubscriberId, text: &str) -> Result<(), SendError> {
        debug!("Sending text to {}", recipient);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id: recipient.as_i64(),
                text,
            })
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        self.check(response).await
    }

    async fn send_photo(&self, recipient: SubscriberId, photo: &Path) -> Result<(), SendError> {
        debug!("Sending photo {} to {}", photo.display(), recipient);

        let bytes =
            std::fs::read(photo).map_err(|e| SendError::Attachment(e.to_string()))?;
        let filename = photo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("image/jpeg")
            .map_err(|e| SendError::Attachment(e.to_string()))?;
        let form = Form::new()
            .text("chat_id", recipient.as_i64().to_string())
            .part("photo", part);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        self.check(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let messenger = TelegramMessenger::new(TelegramConfig::new("123:abc")).unwrap();
        assert_eq!(
            messenger.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_send_message_wire_format() {
        let request = SendMessageRequest {
            chat_id: 42,
            text: "Change detected!",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], 42);
        assert_eq!(json["text"], "Change detected!");
    }

    #[test]
    fn test_api_error_parsing() {
        let raw = r#"{ "ok": false, "description": "Forbidden: bot was blocked by the user" }"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert!(parsed.description.unwrap().contains("blocked"));
    }
}
