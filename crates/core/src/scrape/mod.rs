pub mod browser;
pub mod http;
pub mod nitter;
pub mod wait;

use crate::config::Settings;
use crate::domain::item::CandidateItem;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;

const HTTP_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// One way of turning an account handle into its recent posts.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Newest posts (at most five, newest first) posted after `now` minus the lookback window.
    async fn recent_items(
        &self,
        handle: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CandidateItem>>;

    /// Releases whatever session the source holds.
    async fn close(&self) -> anyhow::Result<()>;
}

/// Opens a fresh [`ContentSource`] for each monitoring cycle.
#[async_trait::async_trait]
pub trait SourceFactory: Send + Sync {
    async fn open(&self) -> anyhow::Result<Box<dyn ContentSource>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    #[default]
    Browser,
    Http,
}

impl FromStr for FetchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(Self::Browser),
            "http" => Ok(Self::Http),
            other => anyhow::bail!("unknown FETCH_STRATEGY {other:?} (expected browser or http)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrategySourceFactory {
    strategy: FetchStrategy,
    base_url: String,
    render_timeout: Duration,
    idle_timeout: Duration,
}

impl StrategySourceFactory {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            strategy: settings.fetch_strategy,
            base_url: settings.nitter_base_url.clone(),
            render_timeout: settings.render_timeout,
            idle_timeout: browser::idle_timeout_for(settings.cycle_interval),
        }
    }
}

#[async_trait::async_trait]
impl SourceFactory for StrategySourceFactory {
    async fn open(&self) -> anyhow::Result<Box<dyn ContentSource>> {
        match self.strategy {
            FetchStrategy::Browser => {
                let base_url = self.base_url.clone();
                let render_timeout = self.render_timeout;
                let idle_timeout = self.idle_timeout;
                let source = tokio::task::spawn_blocking(move || {
                    browser::BrowserSource::launch(&base_url, render_timeout, idle_timeout)
                })
                .await
                .context("browser launch task panicked")??;
                Ok(Box::new(source))
            }
            FetchStrategy::Http => Ok(Box::new(http::HttpSource::new(
                &self.base_url,
                HTTP_SOURCE_TIMEOUT,
            )?)),
        }
    }
}

/// Account-level isolation around a [`ContentSource`]: failures become an empty result.
pub struct Fetcher {
    source: Box<dyn ContentSource>,
}

impl Fetcher {
    pub fn new(source: Box<dyn ContentSource>) -> Self {
        Self { source }
    }

    pub async fn recent_items(&self, handle: &str) -> Vec<CandidateItem> {
        self.recent_items_at(handle, Utc::now()).await
    }

    pub async fn recent_items_at(&self, handle: &str, now: DateTime<Utc>) -> Vec<CandidateItem> {
        tracing::info!(%handle, source = self.source.name(), "scraping account");
        match self.source.recent_items(handle, now).await {
            Ok(items) => {
                tracing::info!(%handle, count = items.len(), "valid posts found");
                items
            }
            Err(err) => {
                tracing::error!(%handle, error = %format!("{err:#}"), "scraping error");
                Vec::new()
            }
        }
    }

    /// Releases the underlying session. Consumes the fetcher so it runs once.
    ///
    /// The source is dropped on the blocking pool: dropping a browser session
    /// talks to Chrome synchronously.
    pub async fn close(self) {
        let name = self.source.name();
        match self.source.close().await {
            Ok(()) => tracing::debug!(source = name, "content source closed"),
            Err(err) => tracing::error!(error = %format!("{err:#}"), "close error"),
        }

        let source = self.source;
        if let Err(err) = tokio::task::spawn_blocking(move || drop(source)).await {
            tracing::error!(source = name, error = %err, "content source teardown panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FailingSource {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ContentSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn recent_items(
            &self,
            _handle: &str,
            _now: DateTime<Utc>,
        ) -> anyhow::Result<Vec<CandidateItem>> {
            anyhow::bail!("page load failed")
        }

        async fn close(&self) -> anyhow::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("already gone")
        }
    }

    #[tokio::test]
    async fn account_failure_yields_empty_and_close_errors_are_swallowed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let fetcher = Fetcher::new(Box::new(FailingSource {
            closes: closes.clone(),
        }));
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 16, 0, 0).unwrap();

        assert!(fetcher.recent_items_at("alice", now).await.is_empty());
        fetcher.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    struct DropTracking {
        dropped_on: Arc<std::sync::Mutex<Option<std::thread::ThreadId>>>,
    }

    impl Drop for DropTracking {
        fn drop(&mut self) {
            *self.dropped_on.lock().unwrap() = Some(std::thread::current().id());
        }
    }

    #[async_trait::async_trait]
    impl ContentSource for DropTracking {
        fn name(&self) -> &'static str {
            "drop-tracking"
        }

        async fn recent_items(
            &self,
            _handle: &str,
            _now: DateTime<Utc>,
        ) -> anyhow::Result<Vec<CandidateItem>> {
            Ok(Vec::new())
        }

        async fn close(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn close_drops_source_off_the_async_thread() {
        let dropped_on = Arc::new(std::sync::Mutex::new(None));
        let fetcher = Fetcher::new(Box::new(DropTracking {
            dropped_on: dropped_on.clone(),
        }));

        fetcher.close().await;
        let thread = dropped_on.lock().unwrap().expect("source dropped");
        assert_ne!(thread, std::thread::current().id());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("browser".parse::<FetchStrategy>().unwrap(), FetchStrategy::Browser);
        assert_eq!(" HTTP ".parse::<FetchStrategy>().unwrap(), FetchStrategy::Http);
        assert!("selenium".parse::<FetchStrategy>().is_err());
    }
}
