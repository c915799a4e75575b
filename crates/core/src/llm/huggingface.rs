use crate::config::Settings;
use crate::domain::item::truncate_chars;
use crate::llm::prompt;
use crate::llm::{BuySignalClassifier, Provider};
use crate::retry::{is_transient_transport_error, RetryPolicy};
use anyhow::Context;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_NEW_TOKENS: u32 = 10;
const TEMPERATURE: f32 = 0.1;
const LOGGED_BODY_CHARS: usize = 200;

/// Text-generation client for the Hugging Face serverless inference API.
#[derive(Debug, Clone)]
pub struct HuggingFaceClassifier {
    http: reqwest::Client,
    url: Url,
    api_token: String,
    retry: RetryPolicy,
}

impl HuggingFaceClassifier {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_token = settings.require_hf_api_token()?.to_string();
        Self::new(&settings.hf_api_url, api_token, settings.hf_timeout)
    }

    pub fn new(url: &str, api_token: String, timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid inference URL: {url}"))?;
        anyhow::ensure!(url.host_str().is_some(), "inference URL has no host: {url}");

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build inference http client")?;

        Ok(Self {
            http,
            url,
            api_token,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Opens and drops a TCP connection to the endpoint's host.
    async fn endpoint_reachable(&self) -> bool {
        let Some(host) = self.url.host_str() else {
            return false;
        };
        let port = self.url.port_or_known_default().unwrap_or(443);

        match tokio::time::timeout(REACHABILITY_TIMEOUT, tokio::net::TcpStream::connect((host, port))).await
        {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                tracing::error!(%host, port, error = %err, "network error: inference endpoint unreachable");
                false
            }
            Err(_) => {
                tracing::error!(%host, port, timeout = ?REACHABILITY_TIMEOUT, "network error: reachability check timed out");
                false
            }
        }
    }

    async fn classify_once(&self, text: &str) -> anyhow::Result<bool> {
        if !self.endpoint_reachable().await {
            return Ok(false);
        }

        let req = InferenceRequest {
            inputs: prompt::build_prompt(text),
            parameters: InferenceParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: TEMPERATURE,
                return_full_text: false,
            },
        };

        let res = match self
            .http
            .post(self.url.clone())
            .bearer_auth(&self.api_token)
            .json(&req)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => return transport_failure(err, "inference request failed"),
        };

        let status = res.status();
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => return transport_failure(err, "failed to read inference response"),
        };

        Ok(interpret_response(status, &body))
    }
}

#[async_trait::async_trait]
impl BuySignalClassifier for HuggingFaceClassifier {
    fn provider(&self) -> Provider {
        Provider::HuggingFace
    }

    async fn is_buy_signal(&self, text: &str) -> anyhow::Result<bool> {
        self.retry
            .run(|| self.classify_once(text), is_transient_transport_error)
            .await
    }
}

// Connect failures and timeouts propagate so the retry policy sees them;
// anything else is a negative classification.
fn transport_failure(err: reqwest::Error, stage: &'static str) -> anyhow::Result<bool> {
    let err = anyhow::Error::new(err).context(stage);
    if is_transient_transport_error(&err) {
        tracing::error!(error = %format!("{err:#}"), "connection error");
        return Err(err);
    }
    tracing::error!(error = %format!("{err:#}"), "analysis error");
    Ok(false)
}

fn interpret_response(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::OK {
        tracing::error!(
            %status,
            body = %truncate_chars(body, LOGGED_BODY_CHARS),
            "inference API error"
        );
        match status {
            StatusCode::UNAUTHORIZED => tracing::error!("invalid inference API token"),
            StatusCode::NOT_FOUND => tracing::error!("inference model not found"),
            _ => {}
        }
        return false;
    }

    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(error = %err, "inference response is not valid JSON");
            return false;
        }
    };

    let Some(first) = parsed.as_array().and_then(|results| results.first()) else {
        tracing::error!(
            body = %truncate_chars(body, LOGGED_BODY_CHARS),
            "invalid inference response"
        );
        return false;
    };

    let answer = first
        .get("generated_text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let decision = prompt::is_affirmative(answer);
    tracing::info!(answer = %answer.trim(), decision, "inference response");
    decision
}

#[derive(Debug, Clone, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Clone, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}
