//! Query service coordinating fingerprinting, chunked summarization, and answering.

use crate::{
    completion::{CompletionClient, client_for_provider},
    config::{CompletionProvider, get_config},
    metrics::{MetricsSnapshot, QueryMetrics},
    processing::{
        cache::SummaryCache,
        chunking::chunk_text,
        hashing::document_fingerprint,
        types::{AnswerError, AnswerOutcome, AnswerRequest, DocumentSummary, SummarizeError},
    },
    prompt::{build_prompt, is_answerable},
};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;

/// Coordinates the full question-answering pipeline: content fingerprinting, chunked
/// summarization with caching, and prompt-driven answering.
///
/// The service owns the provider clients, the summary cache, and the metrics registry so
/// the HTTP surface reuses the same components. Construct it once near process start and
/// share it through an `Arc`.
pub struct QueryService {
    openai: Box<dyn CompletionClient>,
    claude: Box<dyn CompletionClient>,
    summary_provider: CompletionProvider,
    cache: SummaryCache,
    chunk_size: usize,
    fallback_message: String,
    metrics: Arc<QueryMetrics>,
}

/// Abstraction over the query pipeline consumed by the HTTP surface.
#[async_trait]
pub trait QueryApi: Send + Sync {
    /// Summarize a parsed document, serving repeats from the cache.
    async fn summarize_document(
        &self,
        document: Value,
        name: &str,
    ) -> Result<DocumentSummary, SummarizeError>;

    /// Answer a free-text question about a previously summarized document.
    async fn answer_query(&self, request: AnswerRequest) -> Result<AnswerOutcome, AnswerError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl QueryService {
    /// Build a new query service from the loaded configuration.
    pub fn new() -> Self {
        let config = get_config();
        Self::from_parts(
            client_for_provider(CompletionProvider::OpenAi),
            client_for_provider(CompletionProvider::Claude),
            config.summary_provider,
            SummaryCache::new(config.summary_cache_capacity),
            config.summary_chunk_size,
            config.fallback_message.clone(),
        )
    }

    /// Assemble a service from explicit components. Tests wire stub clients through here.
    pub fn from_parts(
        openai: Box<dyn CompletionClient>,
        claude: Box<dyn CompletionClient>,
        summary_provider: CompletionProvider,
        cache: SummaryCache,
        chunk_size: usize,
        fallback_message: String,
    ) -> Self {
        Self {
            openai,
            claude,
            summary_provider,
            cache,
            chunk_size,
            fallback_message,
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    /// Summarize a document, serving repeats from the cache.
    ///
    /// On a miss the serialized document is chunked and one completion request per chunk is
    /// issued concurrently; per-chunk results are joined in original chunk order. A single
    /// chunk failing after retries fails the whole call and nothing is cached.
    pub async fn summarize_document(
        &self,
        document: Value,
        name: &str,
    ) -> Result<DocumentSummary, SummarizeError> {
        let fingerprint = document_fingerprint(&document);
        if let Some(summary) = self.cache.lookup(&fingerprint) {
            self.metrics.record_cache_hit();
            tracing::info!(document = name, fingerprint = %fingerprint, "Summary served from cache");
            return Ok(DocumentSummary {
                fingerprint,
                summary,
                chunk_count: 0,
                cached: true,
            });
        }

        let serialized = serde_json::to_string(&document)?;
        let chunks = chunk_text(&serialized, self.chunk_size)?;
        tracing::debug!(
            document = name,
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            provider = ?self.summary_provider,
            "Summarizing document chunks"
        );

        let summarizer = self.client_for(self.summary_provider);
        let parts = try_join_all(chunks.iter().map(|chunk| summarizer.complete(chunk))).await?;
        let summary = parts.join(" ");

        self.cache.store(fingerprint.clone(), summary.clone());
        self.metrics.record_document(chunks.len() as u64);
        tracing::info!(
            document = name,
            fingerprint = %fingerprint,
            chunks = chunks.len(),
            "Document summarized"
        );

        Ok(DocumentSummary {
            fingerprint,
            summary,
            chunk_count: chunks.len(),
            cached: false,
        })
    }

    /// Answer a question about a previously summarized document.
    pub async fn answer_query(&self, request: AnswerRequest) -> Result<AnswerOutcome, AnswerError> {
        let AnswerRequest {
            fingerprint,
            query,
            provider,
            history,
        } = request;

        let summary = self
            .cache
            .lookup(&fingerprint)
            .ok_or_else(|| AnswerError::UnknownDocument(fingerprint.clone()))?;

        let prompt = build_prompt(&summary, &query, &history, &self.fallback_message);
        let answer = self.client_for(provider).complete(&prompt).await?;
        let answerable = is_answerable(&answer, &self.fallback_message);

        self.metrics.record_query();
        tracing::info!(
            fingerprint = %fingerprint,
            provider = ?provider,
            answerable,
            "Query answered"
        );

        Ok(AnswerOutcome { answer, answerable })
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn client_for(&self, provider: CompletionProvider) -> &dyn CompletionClient {
        match provider {
            CompletionProvider::OpenAi => self.openai.as_ref(),
            CompletionProvider::Claude => self.claude.as_ref(),
        }
    }
}

#[async_trait]
impl QueryApi for QueryService {
    async fn summarize_document(
        &self,
        document: Value,
        name: &str,
    ) -> Result<DocumentSummary, SummarizeError> {
        QueryService::summarize_document(self, document, name).await
    }

    async fn answer_query(&self, request: AnswerRequest) -> Result<AnswerOutcome, AnswerError> {
        QueryService::answer_query(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        QueryService::metrics_snapshot(self)
    }
}
