use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a post body.
pub const MAX_TEXT_CHARS: usize = 500;

/// One recent post scraped from a tracked account's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub text: String,
    pub external_id: String,
    pub source_handle: String,
    pub posted_at: DateTime<Utc>,
}

impl CandidateItem {
    pub fn new(
        text: &str,
        external_id: impl Into<String>,
        source_handle: impl Into<String>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: truncate_chars(text, MAX_TEXT_CHARS).to_string(),
            external_id: external_id.into(),
            source_handle: source_handle.into(),
            posted_at,
        }
    }

    pub fn permalink(&self) -> String {
        format!(
            "https://twitter.com/{}/status/{}",
            self.source_handle, self.external_id
        )
    }
}

/// Returns the longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
