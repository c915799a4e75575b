//! Markup knowledge for the Nitter timeline page.
//!
//! The mirror's HTML is not a versioned contract. Everything that depends on
//! its class names lives here so a layout change touches one file.

use crate::domain::item::CandidateItem;
use crate::time::window::{is_recent, parse_post_timestamp};
use anyhow::Context;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

/// Newest entries considered per account, before the time window is applied.
pub const MAX_ITEMS_PER_ACCOUNT: usize = 5;

/// Present once the timeline has rendered: posts, an empty-timeline notice, or an error.
pub const READY_SELECTOR: &str = ".timeline-item, .timeline-none, .error-panel";

const ITEM_SELECTOR: &str = ".timeline-item";
const CONTENT_SELECTOR: &str = ".tweet-content";
const LINK_SELECTOR: &str = "a.tweet-link";
const DATE_SELECTOR: &str = ".tweet-date a";
const STATUS_MARKER: &str = "/status/";

pub fn listing_url(base_url: &str, handle: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), handle)
}

struct Selectors {
    item: Selector,
    content: Selector,
    link: Selector,
    date: Selector,
}

impl Selectors {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            item: selector(ITEM_SELECTOR)?,
            content: selector(CONTENT_SELECTOR)?,
            link: selector(LINK_SELECTOR)?,
            date: selector(DATE_SELECTOR)?,
        })
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css:?}: {e:?}"))
}

/// Extracts the newest posts from a rendered timeline, keeping those inside the lookback window.
///
/// Entries missing an expected element or carrying an unparseable timestamp
/// are skipped; the rest of the page is still returned.
pub fn parse_timeline(
    html: &str,
    handle: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<CandidateItem>> {
    let selectors = Selectors::new()?;
    let doc = Html::parse_document(html);

    let entries: Vec<ElementRef<'_>> = doc
        .select(&selectors.item)
        .take(MAX_ITEMS_PER_ACCOUNT)
        .collect();
    tracing::debug!(%handle, found = entries.len(), "timeline entries found");

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let item = match extract_entry(&selectors, entry, handle) {
            Ok(item) => item,
            Err(err) => {
                tracing::debug!(%handle, error = %err, "skipping timeline entry");
                continue;
            }
        };

        if !is_recent(item.posted_at, now) {
            tracing::debug!(%handle, id = %item.external_id, posted_at = %item.posted_at, "post older than lookback window");
            continue;
        }

        tracing::info!(%handle, id = %item.external_id, posted_at = %item.posted_at.to_rfc3339(), "new post");
        out.push(item);
    }

    Ok(out)
}

fn extract_entry(
    selectors: &Selectors,
    entry: ElementRef<'_>,
    handle: &str,
) -> anyhow::Result<CandidateItem> {
    let content = entry
        .select(&selectors.content)
        .next()
        .context("missing post content")?;
    let text = element_text(content);

    let href = entry
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .context("missing post permalink")?;
    let external_id =
        status_id(href).with_context(|| format!("permalink has no status id: {href}"))?;

    let title = entry
        .select(&selectors.date)
        .next()
        .and_then(|a| a.value().attr("title"))
        .context("missing post date")?;
    let posted_at = parse_post_timestamp(title)?;

    Ok(CandidateItem::new(&text, external_id, handle, posted_at))
}

/// The path segment after `/status/`, without fragment or query.
pub fn status_id(href: &str) -> Option<&str> {
    let (_, rest) = href.split_once(STATUS_MARKER)?;
    let id = rest.split(['#', '?', '/']).next()?;
    (!id.is_empty()).then_some(id)
}

fn element_text(el: ElementRef<'_>) -> String {
    let joined: String = el.text().collect();
    joined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::MAX_TEXT_CHARS;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 16, 0, 0).unwrap()
    }

    fn title(at: DateTime<Utc>) -> String {
        at.format("%b %-d, %Y · %-I:%M %p UTC").to_string()
    }

    fn entry(id: &str, text: &str, at: DateTime<Utc>) -> String {
        format!(
            r##"<div class="timeline-item" data-username="alice">
  <a class="tweet-link" href="/alice/status/{id}#m"></a>
  <div class="tweet-body">
    <div class="tweet-header">
      <span class="tweet-date"><a href="/alice/status/{id}#m" title="{title}">5m</a></span>
    </div>
    <div class="tweet-content media-body" dir="auto">{text}</div>
  </div>
</div>"##,
            title = title(at)
        )
    }

    fn page(entries: &[String]) -> String {
        format!(
            r#"<html><body><div class="timeline">{}</div></body></html>"#,
            entries.join("\n")
        )
    }

    #[test]
    fn extracts_recent_posts_in_page_order() {
        let html = page(&[
            entry("111", "Buy $XYZ now!!", now() - Duration::minutes(5)),
            entry("110", "gm <a href=\"/search\">#btc</a>", now() - Duration::minutes(30)),
        ]);
        let items = parse_timeline(&html, "alice", now()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].external_id, "111");
        assert_eq!(items[0].text, "Buy $XYZ now!!");
        assert_eq!(items[0].source_handle, "alice");
        assert_eq!(items[0].posted_at, now() - Duration::minutes(5));
        assert_eq!(items[1].text, "gm #btc");
    }

    #[test]
    fn drops_posts_outside_lookback_window() {
        let html = page(&[
            entry("3", "fresh", now() - Duration::minutes(59)),
            entry("2", "exactly an hour", now() - Duration::minutes(60)),
            entry("1", "stale", now() - Duration::hours(5)),
        ]);
        let items = parse_timeline(&html, "alice", now()).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.external_id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn malformed_entries_do_not_affect_siblings() {
        let recent = now() - Duration::minutes(1);
        let missing_content = r#"<div class="timeline-item">
  <a class="tweet-link" href="/alice/status/9#m"></a>
  <span class="tweet-date"><a title="Jan 5, 2026 · 3:59 PM UTC">1m</a></span>
</div>"#
            .to_string();
        let missing_link = r#"<div class="timeline-item">
  <span class="tweet-date"><a title="Jan 5, 2026 · 3:59 PM UTC">1m</a></span>
  <div class="tweet-content">no link</div>
</div>"#
            .to_string();
        let bad_date = r#"<div class="timeline-item">
  <a class="tweet-link" href="/alice/status/8#m"></a>
  <span class="tweet-date"><a title="yesterday">1d</a></span>
  <div class="tweet-content">bad date</div>
</div>"#
            .to_string();

        let html = page(&[
            missing_content,
            entry("7", "first good", recent),
            missing_link,
            bad_date,
            entry("6", "second good", recent),
        ]);
        let items = parse_timeline(&html, "alice", now()).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.external_id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6"]);
    }

    #[test]
    fn considers_only_first_five_entries() {
        let entries: Vec<_> = (0..8)
            .map(|i| entry(&format!("{}", 100 - i), "post", now() - Duration::minutes(i)))
            .collect();
        let items = parse_timeline(&page(&entries), "alice", now()).unwrap();
        assert_eq!(items.len(), MAX_ITEMS_PER_ACCOUNT);
        assert_eq!(items[4].external_id, "96");
    }

    #[test]
    fn caps_text_length() {
        let long = "a".repeat(MAX_TEXT_CHARS * 2);
        let html = page(&[entry("5", &long, now() - Duration::minutes(2))]);
        let items = parse_timeline(&html, "alice", now()).unwrap();
        assert_eq!(items[0].text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn empty_timeline_yields_nothing() {
        let html = r#"<html><body><div class="timeline"><div class="timeline-none">No items found</div></div></body></html>"#;
        assert!(parse_timeline(html, "alice", now()).unwrap().is_empty());
    }

    #[test]
    fn status_id_strips_fragment_and_query() {
        assert_eq!(status_id("/alice/status/123#m"), Some("123"));
        assert_eq!(status_id("https://nitter.net/alice/status/456?s=20"), Some("456"));
        assert_eq!(status_id("/alice/status/789/photo/1"), Some("789"));
        assert_eq!(status_id("/alice/status/"), None);
        assert_eq!(status_id("/alice"), None);
    }

    #[test]
    fn listing_url_joins_base_and_handle() {
        assert_eq!(listing_url("https://nitter.net/", "alice"), "https://nitter.net/alice");
        assert_eq!(listing_url("http://127.0.0.1:8080", "bob"), "http://127.0.0.1:8080/bob");
    }
}
