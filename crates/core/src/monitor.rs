use crate::domain::account::TrackedAccount;
use crate::domain::item::CandidateItem;
use crate::llm::BuySignalClassifier;
use crate::notify::{format_alert, Notifier};
use crate::scrape::{Fetcher, SourceFactory};
use anyhow::Context;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Counters for one monitoring cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub accounts_checked: usize,
    pub items_seen: usize,
    pub items_failed: usize,
    pub alerts_sent: usize,
}

/// Runs scrape → classify → alert passes over the tracked accounts.
///
/// Each cycle opens its own content source and closes it before returning,
/// whatever happened in between. Accounts and posts are handled one at a
/// time, in configured order.
pub struct Monitor {
    accounts: Vec<TrackedAccount>,
    destination: String,
    sources: Arc<dyn SourceFactory>,
    classifier: Arc<dyn BuySignalClassifier>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        accounts: Vec<TrackedAccount>,
        destination: impl Into<String>,
        sources: Arc<dyn SourceFactory>,
        classifier: Arc<dyn BuySignalClassifier>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts,
            destination: destination.into(),
            sources,
            classifier,
            notifier,
        }
    }

    pub fn accounts(&self) -> &[TrackedAccount] {
        &self.accounts
    }

    /// One full pass. Never fails: every error is logged at the narrowest scope.
    pub async fn run_cycle(&self) -> CycleReport {
        tracing::info!(
            accounts = self.accounts.len(),
            classifier = ?self.classifier.provider(),
            "starting monitoring cycle"
        );
        let mut report = CycleReport::default();

        let fetcher = match self.sources.open().await {
            Ok(source) => Fetcher::new(source),
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to open content source; skipping cycle");
                return report;
            }
        };

        let outcome = AssertUnwindSafe(self.check_accounts(&fetcher, &mut report))
            .catch_unwind()
            .await;
        if let Err(panic) = outcome {
            tracing::error!(panic = %panic_message(panic.as_ref()), "cycle error");
        }

        fetcher.close().await;
        tracing::info!(
            accounts_checked = report.accounts_checked,
            items_seen = report.items_seen,
            items_failed = report.items_failed,
            alerts_sent = report.alerts_sent,
            "monitoring complete"
        );
        report
    }

    async fn check_accounts(&self, fetcher: &Fetcher, report: &mut CycleReport) {
        for account in &self.accounts {
            tracing::info!(handle = %account.handle, name = %account.display_name, "checking account");
            report.accounts_checked += 1;

            let items = fetcher.recent_items(&account.handle).await;
            if items.is_empty() {
                tracing::debug!(handle = %account.handle, "no recent posts");
                continue;
            }

            tracing::info!(handle = %account.handle, count = items.len(), "analyzing posts");
            for item in &items {
                report.items_seen += 1;
                let outcome = AssertUnwindSafe(self.process_item(account, item))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(true)) => report.alerts_sent += 1,
                    Ok(Ok(false)) => {}
                    Ok(Err(err)) => {
                        report.items_failed += 1;
                        tracing::error!(
                            handle = %account.handle,
                            id = %item.external_id,
                            error = %format!("{err:#}"),
                            "processing error"
                        );
                    }
                    Err(panic) => {
                        report.items_failed += 1;
                        tracing::error!(
                            handle = %account.handle,
                            id = %item.external_id,
                            panic = %panic_message(panic.as_ref()),
                            "processing error"
                        );
                    }
                }
            }
        }
    }

    /// Classifies one post and sends an alert when it is a buy signal.
    async fn process_item(
        &self,
        account: &TrackedAccount,
        item: &CandidateItem,
    ) -> anyhow::Result<bool> {
        tracing::info!(id = %item.external_id, posted_at = %item.posted_at.to_rfc3339(), "classifying post");
        let is_buy = self
            .classifier
            .is_buy_signal(&item.text)
            .await
            .context("classification failed")?;
        tracing::info!(id = %item.external_id, is_buy, "buy signal");
        if !is_buy {
            return Ok(false);
        }

        let message = format_alert(account, item);
        self.notifier
            .send(&self.destination, &message)
            .await
            .context("failed to send alert")?;
        tracing::info!(handle = %account.handle, id = %item.external_id, "alert sent");
        Ok(true)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
