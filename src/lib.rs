#![deny(missing_docs)]

//! Core library for the JSON Query server.

/// HTTP routing and REST handlers.
pub mod api;
/// Completion provider clients and retry policy.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization and query metrics helpers.
pub mod metrics;
/// Document summarization pipeline utilities.
pub mod processing;
/// Prompt rendering for completion requests.
pub mod prompt;
