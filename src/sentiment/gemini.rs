use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{parse_error, ClassificationResult, Sentiment, SentimentBackend};
use crate::config::EndpointConfig;

pub const NO_RESULTS: &str = "No results found";

const INSTRUCTION: &str = "Analyze the sentiment of this text and respond with exactly one word: \n\
either \"positive\", \"negative\", or \"neutral\".";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

/// Generative-language backend: the input is wrapped in a one-word instruction
/// and the model's reply is matched case-insensitively.
pub struct GeminiBackend {
    url: Url,
}

impl GeminiBackend {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let mut url = Url::parse(&endpoint.base_url)
            .map_err(|e| anyhow!("Invalid base URL '{}': {}", endpoint.base_url, e))?;

        if let Some(key) = &endpoint.auth_token {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(Self { url })
    }
}

pub fn prompt_for(text: &str) -> String {
    format!("{} Text: \"{}\"", INSTRUCTION, text)
}

/// `Ok(None)` when the response carries no candidates at all.
fn extract_text(body: &str) -> Result<Option<String>> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    let candidate = match response.candidates.and_then(|c| c.into_iter().next()) {
        Some(candidate) => candidate,
        None => return Ok(None),
    };

    let part = candidate
        .content
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("candidate content has no parts"))?;

    Ok(Some(part.text.trim().to_string()))
}

fn sentiment_from_word(word: &str) -> Option<Sentiment> {
    match word.to_lowercase().as_str() {
        "positive" => Some(Sentiment::Positive),
        "negative" => Some(Sentiment::Negative),
        "neutral" => Some(Sentiment::Neutral),
        _ => None,
    }
}

impl SentimentBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [
                { "parts": [ { "text": prompt_for(text) } ] }
            ]
        })
    }

    fn parse_success(&self, body: &str) -> ClassificationResult {
        match extract_text(body) {
            Ok(Some(word)) => match sentiment_from_word(&word) {
                Some(sentiment) => ClassificationResult::Sentiment(sentiment),
                None => ClassificationResult::Unrecognized(word),
            },
            Ok(None) => ClassificationResult::Unrecognized(NO_RESULTS.to_string()),
            Err(e) => parse_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::FailureKind;

    fn backend() -> GeminiBackend {
        GeminiBackend::new(&EndpointConfig {
            base_url: "https://example.test/v1beta/models/m:generateContent".into(),
            auth_token: Some("abc 123".into()),
        })
        .unwrap()
    }

    fn reply(text: &str) -> String {
        json!({ "candidates": [ { "content": { "parts": [ { "text": text } ], "role": "model" } } ] })
            .to_string()
    }

    #[test]
    fn test_url_carries_key() {
        assert_eq!(
            backend().url().as_str(),
            "https://example.test/v1beta/models/m:generateContent?key=abc+123"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let endpoint = EndpointConfig {
            base_url: "not a url".into(),
            auth_token: None,
        };
        assert!(GeminiBackend::new(&endpoint).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = backend().request_body("the soup was cold");
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts.as_array().map(Vec::len), Some(1));
        assert_eq!(
            parts[0]["text"],
            "Analyze the sentiment of this text and respond with exactly one word: \n\
             either \"positive\", \"negative\", or \"neutral\". Text: \"the soup was cold\""
        );
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let b = backend();
        assert_eq!(
            b.parse_success(&reply("Negative")),
            ClassificationResult::Sentiment(Sentiment::Negative)
        );
        assert_eq!(
            b.parse_success(&reply("  NEUTRAL \n")),
            ClassificationResult::Sentiment(Sentiment::Neutral)
        );
        assert_eq!(
            b.parse_success(&reply("Positive.")),
            ClassificationResult::Unrecognized("Positive.".into())
        );
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(
            backend().parse_success(r#"{"candidates":[]}"#),
            ClassificationResult::Unrecognized(NO_RESULTS.into())
        );
    }

    #[test]
    fn test_non_array_candidates_is_parse_error() {
        for body in [r#"{"candidates":"x"}"#, r#"{"candidates":{}}"#] {
            assert!(matches!(
                backend().parse_success(body),
                ClassificationResult::Failure {
                    kind: FailureKind::ParseError,
                    ..
                }
            ));
        }
        assert_eq!(
            backend().parse_success(r#"{"candidates":null}"#),
            ClassificationResult::Unrecognized(NO_RESULTS.into())
        );
    }

    #[test]
    fn test_structural_errors() {
        let b = backend();
        for body in [
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            "not json",
        ] {
            match b.parse_success(body) {
                ClassificationResult::Failure { kind, message } => {
                    assert_eq!(kind, FailureKind::ParseError);
                    assert!(!message.is_empty());
                }
                other => panic!("expected parse failure for {body}, got {other:?}"),
            }
        }
    }
}
