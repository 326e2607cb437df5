use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::config::{BackendKind, Config};

pub mod dedicated;
pub mod gemini;
pub mod transport;

pub use dedicated::DedicatedBackend;
pub use gemini::GeminiBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport failure, no response received
    NetworkError,
    /// Name resolution or host unreachable. A kind of `NetworkError`.
    NoConnection,
    /// Non-2xx status
    ApiError,
    /// Success status with a body we could not read
    ParseError,
}

impl FailureKind {
    #[inline]
    pub fn is_network(&self) -> bool {
        matches!(self, FailureKind::NetworkError | FailureKind::NoConnection)
    }
}

/// Outcome of one classification. Every call produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    Sentiment(Sentiment),
    /// The backend answered, but with a label outside the known set
    Unrecognized(String),
    Failure { kind: FailureKind, message: String },
}

impl ClassificationResult {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ClassificationResult::Failure {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationResult::Sentiment(s) => write!(f, "{:?}", s),
            ClassificationResult::Unrecognized(raw) => write!(f, "unrecognized '{}'", raw),
            ClassificationResult::Failure { kind, message } => {
                write!(f, "{:?}: {}", kind, message)
            }
        }
    }
}

/// Wire shape of one backend: where to POST, what to send, how to read a 2xx body.
pub trait SentimentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Full request URL, credential included. Never log this.
    fn url(&self) -> &Url;

    fn request_body(&self, text: &str) -> Value;

    fn parse_success(&self, body: &str) -> ClassificationResult;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Resolves exactly once, with a label or a typed failure.
    async fn classify(&self, text: &str) -> ClassificationResult;
}

/// Stateless between calls; concurrent calls are independent.
pub struct SentimentClient {
    client: Client,
    backend: Box<dyn SentimentBackend>,
}

impl SentimentClient {
    pub fn new(backend: Box<dyn SentimentBackend>) -> Self {
        Self {
            client: Client::new(),
            backend,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let backend: Box<dyn SentimentBackend> = match cfg.backend {
            BackendKind::Gemini => Box::new(GeminiBackend::new(&cfg.endpoint)?),
            BackendKind::Dedicated => Box::new(DedicatedBackend::new(&cfg.endpoint)?),
        };
        info!(
            "Using {} backend at {}",
            backend.name(),
            cfg.endpoint.base_url
        );
        Ok(Self::new(backend))
    }

    /// Forwards `text` as given; callers reject empty input.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let payload = self.backend.request_body(text);
        debug!("Request body: {}", payload);

        let response = match self
            .client
            .post(self.backend.url().clone())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // the URL may carry the API key
                let e = e.without_url();
                error!("{} call failed: {}", self.backend.name(), e);
                return transport::classify_transport_error(&e);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                error!("Failed to read {} response body: {}", self.backend.name(), e);
                return transport::classify_transport_error(&e);
            }
        };
        debug!("Response ({}): {}", status.as_u16(), body);

        if !status.is_success() {
            let result = api_failure(status.as_u16(), &body);
            error!("API returned error: {}", result);
            return result;
        }

        let result = self.backend.parse_success(&body);
        match &result {
            ClassificationResult::Sentiment(_) => debug!("Extracted sentiment: {}", result),
            _ => warn!("Could not determine sentiment: {}", result),
        }
        result
    }
}

#[async_trait]
impl Classifier for SentimentClient {
    fn backend_name(&self) -> &str {
        self.backend.name()
    }

    async fn classify(&self, text: &str) -> ClassificationResult {
        SentimentClient::classify(self, text).await
    }
}

/// Maps a non-2xx response to `ApiError`, preferring the body's `error` field.
pub fn api_failure(status: u16, body: &str) -> ClassificationResult {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(error_message))
        .unwrap_or_else(|| format!("API Error: {}", status));

    ClassificationResult::failure(FailureKind::ApiError, message)
}

fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(msg) => Some(msg.clone()),
        // {"error": {"code": 400, "message": "..."}}
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

pub(crate) fn parse_error(e: impl fmt::Display) -> ClassificationResult {
    error!("Error parsing response: {}", e);
    ClassificationResult::failure(FailureKind::ParseError, e.to_string())
}
