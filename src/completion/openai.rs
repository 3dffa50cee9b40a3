//! Client for the OpenAI chat completions endpoint.

use super::retry::{RetryPolicy, run_with_retry};
use super::{CompletionClient, CompletionError};
use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const SYSTEM_INSTRUCTION: &str =
    "You are an assistant that answers questions based on provided JSON data.";

/// Completion client backed by the OpenAI chat completions API.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Construct a client from the loaded configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(
            config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            RetryPolicy::default(),
        )
    }

    /// Construct a client against an explicit endpoint. Tests and proxies use this directly.
    pub fn new(base_url: String, api_key: String, model: String, retry: RetryPolicy) -> Self {
        let http = Client::builder()
            .user_agent("json-query/completion")
            .build()
            .expect("Failed to construct reqwest::Client for completions");
        Self {
            http,
            base_url,
            api_key,
            model,
            retry,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": prompt },
            ],
            // temperature 0 keeps repeated summarization runs deterministic
            "temperature": 0,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionError::ProviderUnavailable(format!(
                    "failed to reach OpenAI at {}: {error}",
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

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            CompletionError::InvalidResponse(format!("failed to decode OpenAI response: {error}"))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("response contained no choices".into()))?;

        Ok(choice.message.content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        run_with_retry(self.retry, || self.send_once(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use std::time::Duration;

    fn test_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            server.base_url(),
            "test-key".into(),
            "gpt-4o".into(),
            RetryPolicy::new(3, Duration::ZERO, 2),
        )
    }

    #[tokio::test]
    async fn returns_trimmed_content_of_the_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{ "model": "gpt-4o", "temperature": 0 }"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "  Two keys, values 1 and 2.  " } }
                    ]
                }));
            })
            .await;

        let answer = test_client(&server)
            .complete("summarize this")
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(answer, "Two keys, values 1 and 2.");
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_exhaustion() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("upstream exploded");
            })
            .await;

        let error = test_client(&server)
            .complete("summarize this")
            .await
            .expect_err("exhausted retries");

        assert_eq!(mock.hits(), 3);
        assert!(matches!(
            error,
            CompletionError::RequestFailed { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body("bad key");
            })
            .await;

        let error = test_client(&server)
            .complete("summarize this")
            .await
            .expect_err("auth failure");

        assert_eq!(mock.hits(), 1);
        assert!(matches!(
            error,
            CompletionError::RequestFailed { status: 401, .. }
        ));
    }

    #[tokio::test]
    async fn missing_choices_is_a_malformed_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        let error = test_client(&server)
            .complete("summarize this")
            .await
            .expect_err("empty choices");

        assert!(matches!(error, CompletionError::InvalidResponse(_)));
    }
}
