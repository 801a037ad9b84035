use crate::error::{Error, Result};
use crate::render;
use async_trait::async_trait;
use seatwatch_core::report::{ConsolidatedReport, Reporter};
use std::time::Duration;

/// Sends the rendered report through the Telegram Bot API.
pub struct TelegramReporter {
    client: reqwest::Client,
    token: String,
    chat_id: String,
    context: Option<String>,
}

impl TelegramReporter {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
            chat_id: chat_id.into(),
            context: None,
        })
    }

    /// Describe what was watched (region, centre) in the message header.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    async fn send(&self, text: &str) -> Result<()> {
        // The token is part of the URL; keep it out of every log line.
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|ok| ok.as_bool()) != Some(true) {
            return Err(Error::Api {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Reporter for TelegramReporter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn report(&self, report: &ConsolidatedReport) -> seatwatch_core::Result<()> {
        let text = render::render_message(report, self.context.as_deref());
        self.send(&text).await?;
        tracing::info!("Telegram notification sent to chat {}", self.chat_id);
        Ok(())
    }
}
