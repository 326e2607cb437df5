use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{parse_error, ClassificationResult, Sentiment, SentimentBackend};
use crate::config::EndpointConfig;

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    sentiment: String, // POS, NEG or NEU
}

/// Dedicated prediction endpoint. Codes are matched verbatim.
pub struct DedicatedBackend {
    url: Url,
}

impl DedicatedBackend {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let url = Url::parse(&endpoint.base_url)
            .map_err(|e| anyhow!("Invalid base URL '{}': {}", endpoint.base_url, e))?;

        Ok(Self { url })
    }
}

fn sentiment_from_code(code: &str) -> Option<Sentiment> {
    match code {
        "POS" => Some(Sentiment::Positive),
        "NEG" => Some(Sentiment::Negative),
        "NEU" => Some(Sentiment::Neutral),
        _ => None,
    }
}

impl SentimentBackend for DedicatedBackend {
    fn name(&self) -> &'static str {
        "dedicated"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn request_body(&self, text: &str) -> Value {
        json!({ "text": text })
    }

    fn parse_success(&self, body: &str) -> ClassificationResult {
        let response: PredictionResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) => return parse_error(e),
        };

        match sentiment_from_code(&response.sentiment) {
            Some(sentiment) => ClassificationResult::Sentiment(sentiment),
            None => ClassificationResult::Unrecognized(response.sentiment),
        }
    }
}
