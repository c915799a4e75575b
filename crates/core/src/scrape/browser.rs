use crate::domain::item::CandidateItem;
use crate::scrape::nitter;
use crate::scrape::wait::poll_until;
use crate::scrape::ContentSource;
use anyhow::Context;
use chrono::{DateTime, Utc};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

const WINDOW_SIZE: (u32, u32) = (1920, 1080);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shortest allowed gap between driver calls before Chrome's transport shuts down.
///
/// Classifying one account's posts between two navigations can take minutes,
/// so the session must survive long idle stretches within a cycle.
pub const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Headless Chrome session reused for every account in a cycle.
///
/// Driver calls block, so they run on tokio's blocking pool. The caller awaits
/// each one before issuing the next; the tab is never driven concurrently.
pub struct BrowserSource {
    // Dropping the browser terminates the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
    base_url: String,
    render_timeout: Duration,
}

impl BrowserSource {
    pub fn launch(
        base_url: &str,
        render_timeout: Duration,
        idle_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let options = launch_options(idle_timeout)?;
        let browser = Browser::new(options).context("failed to launch headless browser")?;
        let tab = browser.new_tab().context("failed to open browser tab")?;
        tracing::info!(%base_url, ?idle_timeout, "browser session initialized");

        Ok(Self {
            _browser: browser,
            tab,
            base_url: base_url.to_string(),
            render_timeout,
        })
    }

    fn render(tab: &Tab, url: &str, render_timeout: Duration) -> anyhow::Result<String> {
        tab.navigate_to(url)
            .with_context(|| format!("failed to navigate to {url}"))?;
        tab.wait_until_navigated()
            .with_context(|| format!("navigation to {url} did not complete"))?;

        let ready = poll_until(render_timeout, POLL_INTERVAL, || {
            tab.find_element(nitter::READY_SELECTOR).is_ok()
        });
        if !ready {
            tracing::debug!(%url, ?render_timeout, "timeline not ready before timeout; reading page as-is");
        }

        tab.get_content().context("failed to read rendered page")
    }
}

/// Idle timeout for a session used by cycles `cycle_interval` apart.
pub fn idle_timeout_for(cycle_interval: Duration) -> Duration {
    cycle_interval.max(MIN_IDLE_TIMEOUT)
}

fn launch_options(idle_timeout: Duration) -> anyhow::Result<LaunchOptions<'static>> {
    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some(WINDOW_SIZE))
        .idle_browser_timeout(idle_timeout)
        .args(vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
        ])
        .build()
        .map_err(|e| anyhow::anyhow!("invalid browser launch options: {e}"))
}

#[async_trait::async_trait]
impl ContentSource for BrowserSource {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn recent_items(
        &self,
        handle: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<CandidateItem>> {
        anyhow::ensure!(!handle.trim().is_empty(), "account handle must be non-empty");

        let url = nitter::listing_url(&self.base_url, handle);
        let tab = self.tab.clone();
        let render_timeout = self.render_timeout;
        let html = tokio::task::spawn_blocking(move || Self::render(&tab, &url, render_timeout))
            .await
            .context("browser task panicked")??;

        nitter::parse_timeline(&html, handle, now)
    }

    async fn close(&self) -> anyhow::Result<()> {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || tab.close(false))
            .await
            .context("browser task panicked")?
            .context("failed to close browser tab")?;
        Ok(())
    }
}
