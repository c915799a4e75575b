use crate::config::Settings;
use crate::notify::Notifier;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sends alerts through the Telegram Bot API `sendMessage` method.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base_url: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let bot_token = settings.require_telegram_bot_token()?.to_string();
        Self::new(settings.telegram_api_base_url.clone(), bot_token)
    }

    pub fn new(api_base_url: String, bot_token: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build telegram http client")?;

        Ok(Self {
            http,
            api_base_url,
            bot_token,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()> {
        let req = SendMessageRequest {
            chat_id: destination,
            text,
        };

        // The token is part of the URL; keep it out of error messages.
        let res = self
            .http
            .post(self.url())
            .json(&req)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("telegram request failed: {}", e.without_url()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("failed to read telegram response")?;
        let parsed = serde_json::from_str::<SendMessageResponse>(&body)
            .with_context(|| format!("telegram response is not valid JSON (status={status})"))?;

        if !status.is_success() || !parsed.ok {
            anyhow::bail!(
                "telegram sendMessage failed: status={status} description={}",
                parsed.description.as_deref().unwrap_or("none")
            );
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
