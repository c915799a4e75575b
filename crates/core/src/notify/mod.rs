pub mod telegram;

use crate::domain::account::TrackedAccount;
use crate::domain::item::{truncate_chars, CandidateItem};
use crate::time::window::format_alert_time;

/// Characters of post text quoted in an alert.
pub const ALERT_EXCERPT_CHARS: usize = 200;

/// Delivers a finished alert string to a chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()>;
}

/// Writes alerts to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, destination: &str, text: &str) -> anyhow::Result<()> {
        tracing::info!(%destination, alert = %text, "dry run: alert not sent");
        Ok(())
    }
}

pub fn format_alert(account: &TrackedAccount, item: &CandidateItem) -> String {
    format!(
        "🚨 BUY ALERT from {}\n📅 {}\n📝 {}...\n🔗 {}",
        account.display_name,
        format_alert_time(item.posted_at),
        truncate_chars(&item.text, ALERT_EXCERPT_CHARS),
        item.permalink(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn alert_contains_name_time_excerpt_and_permalink() {
        let account = TrackedAccount::new("alice", "Alice A");
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 15, 55, 0).unwrap();
        let item = CandidateItem::new("Buy $XYZ now!!", "42", "alice", at);

        assert_eq!(
            format_alert(&account, &item),
            "🚨 BUY ALERT from Alice A\n📅 2026-01-05 15:55 UTC\n📝 Buy $XYZ now!!...\n🔗 https://twitter.com/alice/status/42"
        );
    }

    #[test]
    fn alert_excerpt_is_capped() {
        let account = TrackedAccount::new("bob", "Bob");
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 15, 55, 0).unwrap();
        let item = CandidateItem::new(&"₿".repeat(450), "7", "bob", at);

        let alert = format_alert(&account, &item);
        let excerpt_line = alert.lines().nth(2).unwrap();
        assert_eq!(excerpt_line, format!("📝 {}...", "₿".repeat(ALERT_EXCERPT_CHARS)));
    }
}
