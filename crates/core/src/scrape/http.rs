use crate::domain::item::CandidateItem;
use crate::scrape::nitter;
use crate::scrape::ContentSource;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::time::Duration;

const USER_AGENT: &str = concat!("tipster/", env!("CARGO_PKG_VERSION"));

/// Fetches the server-rendered timeline with a plain GET, for hosts without Chrome.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build timeline http client")?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ContentSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn recent_items(
        &self,
        handle: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CandidateItem>> {
        anyhow::ensure!(!handle.trim().is_empty(), "account handle must be non-empty");

        let url = nitter::listing_url(&self.base_url, handle);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("timeline request failed: {url}"))?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "timeline HTTP {status}: {url}");

        let html = res
            .text()
            .await
            .context("failed to read timeline response")?;
        nitter::parse_timeline(&html, handle, now)
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
