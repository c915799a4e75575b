pub mod domain;
pub mod llm;
pub mod monitor;
pub mod notify;
pub mod retry;
pub mod scrape;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    use crate::domain::account::{parse_accounts, TrackedAccount, DEFAULT_ACCOUNTS};
    use crate::scrape::FetchStrategy;

    pub const DEFAULT_HF_API_URL: &str =
        "https://api-inference.huggingface.co/models/meta-llama/Meta-Llama-3-8B-Instruct";
    pub const DEFAULT_NITTER_BASE_URL: &str = "https://nitter.net";
    pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

    const DEFAULT_HF_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 3;
    const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 3600;
    const DEFAULT_FIRST_RUN_DELAY_SECS: u64 = 10;

    pub const REQUIRED_VARS: [&str; 3] = ["TELEGRAM_BOT_TOKEN", "HF_API_TOKEN", "GROUP_CHAT_ID"];

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub telegram_bot_token: Option<String>,
        pub hf_api_token: Option<String>,
        pub group_chat_id: Option<String>,
        pub telegram_api_base_url: String,
        pub hf_api_url: String,
        pub hf_timeout: Duration,
        pub nitter_base_url: String,
        pub fetch_strategy: FetchStrategy,
        pub render_timeout: Duration,
        pub accounts: Vec<TrackedAccount>,
        pub cycle_interval: Duration,
        pub first_run_delay: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from any key/value source. Blank values count as unset.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let non_empty_var = |key: &str| non_empty(lookup(key));
            let secs_var = |key: &str, default: u64| secs(lookup(key), default);

            let fetch_strategy = match non_empty_var("FETCH_STRATEGY") {
                Some(s) => s.parse()?,
                None => FetchStrategy::default(),
            };

            let accounts = match non_empty_var("TRACKED_ACCOUNTS") {
                Some(s) => parse_accounts(&s).context("TRACKED_ACCOUNTS is malformed")?,
                None => DEFAULT_ACCOUNTS
                    .iter()
                    .map(|(handle, name)| TrackedAccount::new(*handle, *name))
                    .collect(),
            };

            Ok(Self {
                telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
                hf_api_token: non_empty_var("HF_API_TOKEN"),
                group_chat_id: non_empty_var("GROUP_CHAT_ID"),
                telegram_api_base_url: non_empty_var("TELEGRAM_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE_URL.to_string()),
                hf_api_url: non_empty_var("HF_API_URL")
                    .unwrap_or_else(|| DEFAULT_HF_API_URL.to_string()),
                hf_timeout: secs_var("HF_TIMEOUT_SECS", DEFAULT_HF_TIMEOUT_SECS),
                nitter_base_url: non_empty_var("NITTER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_NITTER_BASE_URL.to_string()),
                fetch_strategy,
                render_timeout: secs_var("RENDER_TIMEOUT_SECS", DEFAULT_RENDER_TIMEOUT_SECS),
                accounts,
                cycle_interval: secs_var("CYCLE_INTERVAL_SECS", DEFAULT_CYCLE_INTERVAL_SECS),
                first_run_delay: secs_var("FIRST_RUN_DELAY_SECS", DEFAULT_FIRST_RUN_DELAY_SECS),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        /// Names of required variables that are unset or blank.
        pub fn missing_required(&self) -> Vec<&'static str> {
            let values = [
                &self.telegram_bot_token,
                &self.hf_api_token,
                &self.group_chat_id,
            ];
            REQUIRED_VARS
                .iter()
                .zip(values)
                .filter(|(_, v)| v.is_none())
                .map(|(name, _)| *name)
                .collect()
        }

        pub fn require_telegram_bot_token(&self) -> anyhow::Result<&str> {
            self.telegram_bot_token
                .as_deref()
                .context("TELEGRAM_BOT_TOKEN is required")
        }

        pub fn require_hf_api_token(&self) -> anyhow::Result<&str> {
            self.hf_api_token
                .as_deref()
                .context("HF_API_TOKEN is required")
        }

        pub fn require_group_chat_id(&self) -> anyhow::Result<&str> {
            self.group_chat_id
                .as_deref()
                .context("GROUP_CHAT_ID is required")
        }
    }

    fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn secs(value: Option<String>, default: u64) -> Duration {
        let secs = value
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(default);
        Duration::from_secs(secs)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(vars: &[(&str, &str)]) -> Settings {
            let vars: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| vars.get(key).cloned()).unwrap()
        }

        #[test]
        fn telegram_api_base_url_defaults_when_unset_or_blank() {
            assert_eq!(
                settings(&[]).telegram_api_base_url,
                DEFAULT_TELEGRAM_API_BASE_URL
            );
            assert_eq!(
                settings(&[("TELEGRAM_API_BASE_URL", "   ")]).telegram_api_base_url,
                DEFAULT_TELEGRAM_API_BASE_URL
            );
        }

        #[test]
        fn telegram_api_base_url_override_is_trimmed() {
            let s = settings(&[("TELEGRAM_API_BASE_URL", " http://127.0.0.1:8081 ")]);
            assert_eq!(s.telegram_api_base_url, "http://127.0.0.1:8081");
        }

        #[test]
        fn blank_required_values_are_reported_missing() {
            let s = settings(&[
                ("TELEGRAM_BOT_TOKEN", "123:abc"),
                ("HF_API_TOKEN", " "),
            ]);
            assert_eq!(s.missing_required(), vec!["HF_API_TOKEN", "GROUP_CHAT_ID"]);
            assert_eq!(s.require_telegram_bot_token().unwrap(), "123:abc");
            assert!(s.require_group_chat_id().is_err());
        }

        #[test]
        fn unparseable_durations_fall_back_to_defaults() {
            let s = settings(&[("CYCLE_INTERVAL_SECS", "hourly"), ("HF_TIMEOUT_SECS", "45")]);
            assert_eq!(s.cycle_interval, Duration::from_secs(DEFAULT_CYCLE_INTERVAL_SECS));
            assert_eq!(s.hf_timeout, Duration::from_secs(45));
        }
    }
}
