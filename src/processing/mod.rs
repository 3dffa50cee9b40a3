//! Document summarization pipeline: fingerprinting, chunking, caching, and answering.

pub mod cache;
pub mod chunking;
pub mod hashing;
mod service;
pub mod types;

pub use cache::SummaryCache;
pub use chunking::ChunkingError;
pub use service::{QueryApi, QueryService};
pub use types::{AnswerError, AnswerOutcome, AnswerRequest, DocumentSummary, SummarizeError};
