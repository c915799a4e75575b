pub mod huggingface;
pub mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    HuggingFace,
}

/// Decides whether a post explicitly recommends buying a cryptocurrency.
///
/// Implementations degrade response-level failures to `Ok(false)`; an `Err`
/// means a transport failure survived the retry budget.
#[async_trait::async_trait]
pub trait BuySignalClassifier: Send + Sync {
    fn provider(&self) -> Provider;

    async fn is_buy_signal(&self, text: &str) -> anyhow::Result<bool>;
}
