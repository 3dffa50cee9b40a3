//! Core data types and error definitions for the summarization pipeline.

use crate::completion::CompletionError;
use crate::config::CompletionProvider;
use crate::processing::chunking::ChunkingError;
use crate::prompt::ConversationTurn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted while producing a combined document summary.
///
/// Each variant names the pipeline stage that failed; nothing partial is cached or returned.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Document could not be rendered to text before chunking.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Chunking step failed to slice the serialized document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// A chunk request failed after exhausting retries.
    #[error("Chunk summarization failed: {0}")]
    Completion(#[from] CompletionError),
}

/// Errors emitted while answering a query about a summarized document.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// No summary is cached for the supplied fingerprint.
    #[error("No summary cached for fingerprint {0}")]
    UnknownDocument(String),
    /// The selected provider failed to produce a reply.
    #[error("Completion request failed: {0}")]
    Completion(#[from] CompletionError),
}

/// Result of a completed summarization run.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Content fingerprint used as the cache key.
    pub fingerprint: String,
    /// Combined summary text, per-chunk results joined in original chunk order.
    pub summary: String,
    /// Number of chunk requests issued for this run; zero when served from the cache.
    pub chunk_count: usize,
    /// Whether the summary came from the cache without any provider calls.
    pub cached: bool,
}

/// Parameters for answering a question about a previously summarized document.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    /// Fingerprint returned by the upload endpoint.
    pub fingerprint: String,
    /// Free-text question to answer from the cached summary.
    pub query: String,
    /// Provider that should generate the answer.
    pub provider: CompletionProvider,
    /// Prior exchanges for multi-turn context, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// Reply produced for an answer request.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    /// Trimmed provider reply.
    pub answer: String,
    /// False when the reply is exactly the configured fallback sentence.
    pub answerable: bool,
}
