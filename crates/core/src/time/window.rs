use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// How far back a post may be and still count as recent.
pub const LOOKBACK_MINUTES: i64 = 60;

// Title attribute on the mirror's date link, e.g. "Jan 5, 2026 · 3:04 PM UTC".
const POST_TIMESTAMP_FORMAT: &str = "%b %d, %Y · %I:%M %p";

pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(LOOKBACK_MINUTES)
}

/// True when `posted_at` is strictly after the lookback cutoff.
pub fn is_recent(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    posted_at > cutoff(now)
}

pub fn parse_post_timestamp(title: &str) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = title.trim();
    let naive_part = trimmed.strip_suffix("UTC").unwrap_or(trimmed).trim_end();
    let naive = NaiveDateTime::parse_from_str(naive_part, POST_TIMESTAMP_FORMAT)
        .with_context(|| format!("unrecognised post timestamp: {title:?}"))?;
    Ok(naive.and_utc())
}

pub fn format_alert_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
