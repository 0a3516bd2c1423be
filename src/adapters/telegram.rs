use crate::core::report::truncate_chars;
use crate::domain::ports::Notifier;
use crate::utils::error::{FareError, Result};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram 單則訊息上限，以 UTF-16 code unit 計算
const MAX_MESSAGE_UNITS: usize = 4096;

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// 超過上限時截斷並補上 `…`，BMP 以外的 emoji 佔兩個 unit
fn truncate_utf16(text: &str, max_units: usize) -> String {
    if text.encode_utf16().count() <= max_units {
        return text.to_string();
    }
    let budget = max_units.saturating_sub('…'.len_utf16());
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": truncate_utf16(text, MAX_MESSAGE_UNITS),
            "disable_web_page_preview": true,
        });

        // reqwest 的錯誤訊息帶完整 URL，URL 內含 bot token
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FareError::NotificationError {
                message: format!("Telegram request failed: {}", e.without_url()),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FareError::NotificationError {
                message: format!("Telegram returned HTTP {}: {}", status.as_u16(), truncate_chars(&body, 200)),
            });
        }

        tracing::info!("📨 Report sent to Telegram chat {}", self.chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn notifier(server: &MockServer) -> TelegramNotifier {
        TelegramNotifier::new("123:abc", "-42", Duration::from_secs(5))
            .unwrap()
            .with_api_base(server.base_url())
    }

    #[tokio::test]
    async fn test_send_posts_message() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendMessage")
                .body_contains("\"chat_id\":\"-42\"")
                .body_contains("Fare report");
            then.status(200).json_body(serde_json::json!({"ok": true}));
        });

        tokio_test::assert_ok!(notifier(&server).send("✈️ Fare report").await);
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_send_failure_is_notification_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(400)
                .json_body(serde_json::json!({"ok": false, "description": "Bad Request: chat not found"}));
        });

        let err = notifier(&server).send("hello").await.unwrap_err();
        assert!(matches!(err, FareError::NotificationError { .. }));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_long_messages_are_truncated() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendMessage")
                .body_contains("…");
            then.status(200).json_body(serde_json::json!({"ok": true}));
        });

        tokio_test::assert_ok!(notifier(&server).send(&"a".repeat(5000)).await);
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_bot_token() {
        let notifier = TelegramNotifier::new("999:SECRETTOKEN", "-42", Duration::from_secs(2))
            .unwrap()
            .with_api_base("http://127.0.0.1:9");

        let err = notifier.send("hi").await.unwrap_err();
        assert!(matches!(err, FareError::NotificationError { .. }));
        assert!(!err.to_string().contains("SECRETTOKEN"));
        assert!(!format!("{:?}", err).contains("SECRETTOKEN"));
    }

    #[test]
    fn test_truncate_utf16_counts_surrogate_pairs() {
        assert_eq!(truncate_utf16("short", 10), "short");
        // 📊 佔兩個 unit
        let text = "📊".repeat(3000);
        let truncated = truncate_utf16(&text, MAX_MESSAGE_UNITS);
        assert!(truncated.ends_with('…'));
        assert!(truncated.encode_utf16().count() <= MAX_MESSAGE_UNITS);
        assert_eq!(truncated.chars().filter(|c| *c == '📊').count(), 2047);

        let exact = "a".repeat(MAX_MESSAGE_UNITS);
        assert_eq!(truncate_utf16(&exact, MAX_MESSAGE_UNITS), exact);
    }
}
