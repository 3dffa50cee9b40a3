//! Client for the Anthropic messages endpoint.

use super::retry::{RetryPolicy, run_with_retry};
use super::{CompletionClient, CompletionError};
use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Hard ceiling on prompt length accepted by the messages endpoint, in characters.
const MAX_PROMPT_CHARS: usize = 190_000;

/// Completion client backed by the Anthropic messages API.
pub struct ClaudeClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl ClaudeClient {
    /// Construct a client from the loaded configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(
            config
                .claude_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            config.claude_api_key.clone(),
            config.claude_model.clone(),
            config.claude_max_tokens,
            RetryPolicy::default(),
        )
    }

    /// Construct a client against an explicit endpoint. Tests and proxies use this directly.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        let http = Client::builder()
            .user_agent("json-query/completion")
            .build()
            .expect("Failed to construct reqwest::Client for completions");
        Self {
            http,
            base_url,
            api_key,
            model,
            max_tokens,
            retry,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": truncate_chars(prompt, MAX_PROMPT_CHARS) },
            ],
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionError::ProviderUnavailable(format!(
                    "failed to reach Anthropic at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = response.json().await.map_err(|error| {
            CompletionError::InvalidResponse(format!("failed to decode Anthropic response: {error}"))
        })?;

        let block = body.content.into_iter().next().ok_or_else(|| {
            CompletionError::InvalidResponse("response contained no content blocks".into())
        })?;

        Ok(block.text.trim().to_string())
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[async_trait]
impl CompletionClient for ClaudeClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        run_with_retry(self.retry, || self.send_once(prompt)).await
    }
}
