//! Completion provider clients for summarization and question answering.
//!
//! Two hosted backends implement the same capability: take a prompt, return the generated
//! text of the top completion. Call sites select a backend through [`CompletionProvider`]
//! and the factory below, so adding a third variant touches only this module. Both clients
//! apply the same explicit [`RetryPolicy`] to transient failures.

mod claude;
mod openai;
mod retry;

pub use claude::ClaudeClient;
pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

use crate::config::CompletionProvider;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced while requesting a completion from a provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Provider endpoint could not be reached.
    #[error("Completion provider unreachable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned a non-success status.
    #[error("Completion request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Response body captured for diagnostics.
        body: String,
    },
    /// Provider response could not be parsed into a completion.
    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether the failure is worth retrying. Network failures and server-side statuses are
    /// transient; client errors and malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ProviderUnavailable(_) => true,
            Self::RequestFailed { status, .. } => (500..600).contains(status),
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Interface implemented by text-completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a prompt to the backend and return the trimmed text of the top completion.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Build the completion client for the given provider from the loaded configuration.
pub fn client_for_provider(provider: CompletionProvider) -> Box<dyn CompletionClient> {
    match provider {
        CompletionProvider::OpenAi => Box::new(OpenAiClient::from_config()),
        CompletionProvider::Claude => Box::new(ClaudeClient::from_config()),
    }
}
