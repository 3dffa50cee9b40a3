use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization and query activity.
#[derive(Default)]
pub struct QueryMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    cache_hits: AtomicU64,
    queries_answered: AtomicU64,
}

impl QueryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly summarized document and the number of chunks sent for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a summary served from the cache without provider calls.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered query.
    pub fn record_query(&self) {
        self.queries_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            queries_answered: self.queries_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of activity counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized through provider calls since startup.
    pub documents_summarized: u64,
    /// Total chunk requests issued across all summarized documents.
    pub chunks_summarized: u64,
    /// Number of summaries served from the cache.
    pub cache_hits: u64,
    /// Number of queries answered since startup.
    pub queries_answered: u64,
}
