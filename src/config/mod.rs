use anyhow::anyhow;
use anyhow::Result;
use log::LevelFilter;
use std::env;
use std::str::FromStr;

pub const GEMINI_DEFAULT_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
pub const DEDICATED_DEFAULT_URL: &str = "http://localhost:8000/predict";

/// Which backend adapter the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Prompt-based generative-language API
    Gemini,
    /// Dedicated `{ "text": .. }` -> `{ "sentiment": .. }` endpoint
    Dedicated,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "llm" => Ok(BackendKind::Gemini),
            "dedicated" | "local" => Ok(BackendKind::Dedicated),
            other => Err(anyhow!(
                "Unknown SENTIMENT_BACKEND '{}'. Use 'gemini' or 'dedicated'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub endpoint: EndpointConfig,

    /// Run the HTTP API on this address instead of the terminal loop
    pub serve_addr: Option<String>,

    pub log_level: LevelFilter,
}

impl Config {
    /// Load from environment variables (dotenv recommended)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("SENTIMENT_BACKEND") {
            Some(name) => name.parse::<BackendKind>()?,
            None => BackendKind::Gemini,
        };

        let base_url = var("SENTIMENT_BASE_URL").unwrap_or_else(|| match backend {
            BackendKind::Gemini => GEMINI_DEFAULT_URL.into(),
            BackendKind::Dedicated => DEDICATED_DEFAULT_URL.into(),
        });

        let auth_token = match backend {
            BackendKind::Gemini => Some(
                var("SENTIMENT_API_KEY").ok_or_else(|| anyhow!("Missing SENTIMENT_API_KEY"))?,
            ),
            BackendKind::Dedicated => None,
        };

        let serve_addr = var("SERVE_ADDR");

        let log_level = match var("LOG_LEVEL") {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|_| anyhow!("Invalid LOG_LEVEL '{}'", level))?,
            None => LevelFilter::Info,
        };

        Ok(Config {
            backend,
            endpoint: EndpointConfig {
                base_url,
                auth_token,
            },
            serve_addr,
            log_level,
        })
    }
}
