//! Summarization capability used by the context compactor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::DramaturgError;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_SUMMARY_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_SUMMARY_TOKENS: u32 = 2048;

/// Prompt in, summary out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, DramaturgError>;
}

/// Summarizer backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicSummarizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, DramaturgError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DramaturgError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Read the key from `api_key_env`; `None` when it is unset or blank.
    pub fn from_env(api_key_env: &str, model: &str) -> Result<Option<Self>, DramaturgError> {
        match std::env::var(api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(key, model)?)),
            _ => Ok(None),
        }
    }

    fn headers(&self) -> Result<HeaderMap, DramaturgError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| DramaturgError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, DramaturgError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_SUMMARY_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(format!("{API_BASE}/messages"))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| DramaturgError::Summarization(format!("Network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DramaturgError::Summarization(format!(
                "API error (status {}): {}",
                status, message
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            DramaturgError::Summarization(format!("Failed to parse response: {}", e))
        })?;
        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(DramaturgError::Summarization("Empty summary".into()));
        }
        Ok(text)
    }
}
