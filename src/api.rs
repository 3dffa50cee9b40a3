//! HTTP surface for the JSON Query server.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /documents/{name}` – Upload raw JSON bytes. The body is persisted under the
//!   configured upload directory, parsed, and summarized (served from the cache when the
//!   content fingerprint is already known). Returns `{fingerprint, summary, chunk_count,
//!   cached}`.
//! - `POST /query` – Answer a free-text question about a previously uploaded document with
//!   the selected completion provider. Returns `{answer, answerable}`.
//! - `GET /metrics` – Observe summarization and query counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by the upload
//!   form client.
//!
//! Parse failures are reported before the pipeline runs; a failed summarization never
//! surfaces a partial summary.

use crate::config::get_config;
use crate::processing::{
    AnswerError, AnswerRequest, DocumentSummary, QueryApi, SummarizeError,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Build the HTTP router exposing the upload and query surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: QueryApi + 'static,
{
    Router::new()
        .route("/documents/:name", post(upload_document::<S>))
        .route("/query", post(answer_query::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Upload a document and return its combined summary.
///
/// The raw body is written to the upload directory first, mirroring what the interactive
/// form expects for later inspection, then parsed. A body that is not valid JSON is an
/// input error and the pipeline is never invoked.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<DocumentSummary>, AppError>
where
    S: QueryApi,
{
    let stored_name = sanitize_file_name(&name);
    persist_upload(&stored_name, &body).await?;

    let document: Value = serde_json::from_slice(&body)
        .map_err(|error| AppError::InvalidDocument(error.to_string()))?;

    let outcome = service.summarize_document(document, &stored_name).await?;
    tracing::info!(
        document = %stored_name,
        fingerprint = %outcome.fingerprint,
        chunks = outcome.chunk_count,
        cached = outcome.cached,
        "Upload processed"
    );
    Ok(Json(outcome))
}

/// Answer a question about a previously uploaded document.
async fn answer_query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<crate::processing::AnswerOutcome>, AppError>
where
    S: QueryApi,
{
    let outcome = service.answer_query(request).await?;
    Ok(Json(outcome))
}

/// Return the current summarization and query counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: QueryApi,
{
    Json(service.metrics_snapshot())
}

/// Write the uploaded bytes under the configured upload directory.
async fn persist_upload(name: &str, bytes: &[u8]) -> Result<(), AppError> {
    let upload_dir = std::path::Path::new(&get_config().upload_dir);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(AppError::UploadStorage)?;
    tokio::fs::write(upload_dir.join(name), bytes)
        .await
        .map_err(AppError::UploadStorage)?;
    Ok(())
}

/// Reduce a client-supplied name to its final path component.
fn sanitize_file_name(name: &str) -> String {
    let candidate = std::path::Path::new(name)
        .file_name()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default();
    if candidate.is_empty() {
        "upload.json".to_string()
    } else {
        candidate
    }
}

/// Descriptor for a single command in the discovery catalog.
#[derive(serde::Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(serde::Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by the upload form client.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/documents/{name}",
                description: "Upload raw JSON bytes, summarize them through the configured provider, and return { \"fingerprint\": string, \"summary\": string, \"chunk_count\": number, \"cached\": bool }.",
                request_example: Some(json!({ "a": 1, "b": 2 })),
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/query",
                description: "Answer a free-text question about an uploaded document. \"answerable\" is false when the reply is the configured fallback sentence.",
                request_example: Some(json!({
                    "fingerprint": "2f7a…",
                    "query": "What is the value of a?",
                    "provider": "openai",
                    "history": [ { "query": "How many keys?", "answer": "Two." } ]
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization and query counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    /// Upload body was not valid JSON.
    InvalidDocument(String),
    /// Upload could not be persisted to disk.
    UploadStorage(std::io::Error),
    /// Summarization pipeline failed; nothing partial was produced.
    Summarize(SummarizeError),
    /// Query answering failed.
    Answer(AnswerError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidDocument(detail) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON upload: {detail}"),
            ),
            AppError::UploadStorage(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store upload: {error}"),
            ),
            AppError::Summarize(SummarizeError::Completion(error)) => {
                (StatusCode::BAD_GATEWAY, error.to_string())
            }
            AppError::Summarize(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            AppError::Answer(AnswerError::UnknownDocument(fingerprint)) => (
                StatusCode::NOT_FOUND,
                format!("No summary cached for fingerprint {fingerprint}; upload the document again"),
            ),
            AppError::Answer(AnswerError::Completion(error)) => {
                (StatusCode::BAD_GATEWAY, error.to_string())
            }
        };
        (status, message).into_response()
    }
}

impl From<SummarizeError> for AppError {
    fn from(inner: SummarizeError) -> Self {
        Self::Summarize(inner)
    }
}

impl From<AnswerError> for AppError {
    fn from(inner: AnswerError) -> Self {
        Self::Answer(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands, sanitize_file_name};
    use crate::config::{CONFIG, CompletionProvider, Config};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        AnswerError, AnswerOutcome, AnswerRequest, DocumentSummary, QueryApi, SummarizeError,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Once};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_upload_and_query() {
        let response = get_commands().await;
        let commands = response.0.commands;

        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload")
            .expect("upload command present");
        assert_eq!(upload.method, "POST");
        assert_eq!(upload.path, "/documents/{name}");

        assert!(commands.iter().any(|cmd| cmd.name == "query"));
        assert!(commands.len() >= 3);
    }

    #[tokio::test]
    async fn upload_route_parses_body_and_returns_summary() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents/sample.json")
                    .body(Body::from(r#"{"a":1,"b":2}"#))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let payload: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["summary"], "Two keys, values 1 and 2.");
        assert_eq!(payload["chunk_count"], 1);
        assert_eq!(payload["cached"], false);

        let calls = service.summarize_calls.lock().await;
        assert_eq!(calls.len(), 1);
        let (name, document) = &calls[0];
        assert_eq!(name, "sample.json");
        assert_eq!(document, &json!({"a": 1, "b": 2}));
    }

    #[tokio::test]
    async fn invalid_json_upload_is_rejected_before_the_pipeline() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents/broken.json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.summarize_calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn upload_names_are_reduced_to_their_final_component() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::new());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents/..%2F..%2Fescape.json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.summarize_calls.lock().await;
        assert_eq!(calls[0].0, "escape.json");
    }

    #[tokio::test]
    async fn query_route_forwards_request_and_returns_outcome() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::new());
        let app = create_router(service.clone());

        let payload = json!({
            "fingerprint": "fp-1",
            "query": "What is a?",
            "provider": "claude",
            "history": [ { "query": "How many keys?", "answer": "Two." } ]
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let reply: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(reply["answer"], "stub answer");
        assert_eq!(reply["answerable"], true);

        let calls = service.answer_calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].fingerprint, "fp-1");
        assert_eq!(calls[0].provider, CompletionProvider::Claude);
        assert_eq!(calls[0].history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_fingerprint_maps_to_not_found() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::unknown_document());
        let app = create_router(service);

        let payload = json!({
            "fingerprint": "evicted",
            "query": "anything",
            "provider": "openai"
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_reports_counters() {
        ensure_test_config();
        let service = Arc::new(StubQueryService::new());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let payload: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["documents_summarized"], 3);
        assert_eq!(payload["cache_hits"], 2);
    }

    #[test]
    fn sanitize_strips_directories_and_defaults_empty_names() {
        assert_eq!(sanitize_file_name("data.json"), "data.json");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".."), "upload.json");
    }

    struct StubQueryService {
        summarize_calls: Mutex<Vec<(String, Value)>>,
        answer_calls: Mutex<Vec<AnswerRequest>>,
        unknown_document: bool,
    }

    impl StubQueryService {
        fn new() -> Self {
            Self {
                summarize_calls: Mutex::new(Vec::new()),
                answer_calls: Mutex::new(Vec::new()),
                unknown_document: false,
            }
        }

        fn unknown_document() -> Self {
            Self {
                unknown_document: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl QueryApi for StubQueryService {
        async fn summarize_document(
            &self,
            document: Value,
            name: &str,
        ) -> Result<DocumentSummary, SummarizeError> {
            self.summarize_calls
                .lock()
                .await
                .push((name.to_string(), document));
            Ok(DocumentSummary {
                fingerprint: "fp-1".into(),
                summary: "Two keys, values 1 and 2.".into(),
                chunk_count: 1,
                cached: false,
            })
        }

        async fn answer_query(
            &self,
            request: AnswerRequest,
        ) -> Result<AnswerOutcome, AnswerError> {
            if self.unknown_document {
                return Err(AnswerError::UnknownDocument(request.fingerprint));
            }
            self.answer_calls.lock().await.push(request);
            Ok(AnswerOutcome {
                answer: "stub answer".into(),
                answerable: true,
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 3,
                chunks_summarized: 7,
                cache_hits: 2,
                queries_answered: 5,
            }
        }
    }

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let upload_dir = std::env::temp_dir().join("json-query-api-tests");
            let _ = CONFIG.set(Config {
                openai_api_key: "test-openai-key".into(),
                claude_api_key: "test-claude-key".into(),
                openai_model: "gpt-4o".into(),
                claude_model: "claude-3-5-sonnet-20240620".into(),
                openai_base_url: None,
                claude_base_url: None,
                claude_max_tokens: 100,
                summary_provider: CompletionProvider::OpenAi,
                fallback_message:
                    "I cannot answer the query using the information from the file.".into(),
                summary_chunk_size: 1000,
                summary_cache_capacity: 100,
                upload_dir: upload_dir.to_string_lossy().into_owned(),
                server_port: None,
            });
        });
    }
}
