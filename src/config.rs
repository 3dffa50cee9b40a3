use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Fallback sentence used when `FALLBACK_MESSAGE` is not set. Providers are instructed to
/// return this sentence verbatim when the document cannot answer a question.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I cannot answer the query using the information from the file.";

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20240620";
const DEFAULT_CLAUDE_MAX_TOKENS: u32 = 100;
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CACHE_CAPACITY: usize = 100;
const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the JSON Query server.
#[derive(Debug)]
pub struct Config {
    /// Secret API key for the OpenAI chat completions endpoint.
    pub openai_api_key: String,
    /// Secret API key for the Anthropic messages endpoint.
    pub claude_api_key: String,
    /// Model identifier sent to OpenAI.
    pub openai_model: String,
    /// Model identifier sent to Anthropic.
    pub claude_model: String,
    /// Optional base URL override for the OpenAI endpoint.
    pub openai_base_url: Option<String>,
    /// Optional base URL override for the Anthropic endpoint.
    pub claude_base_url: Option<String>,
    /// Maximum output tokens requested from Anthropic.
    pub claude_max_tokens: u32,
    /// Backend used to summarize document chunks.
    pub summary_provider: CompletionProvider,
    /// Sentence providers must return verbatim when the data cannot answer a question.
    pub fallback_message: String,
    /// Maximum chunk length, in characters, for summarization requests.
    pub summary_chunk_size: usize,
    /// Maximum number of cached summaries before least-recently-used eviction.
    pub summary_cache_capacity: usize,
    /// Directory where uploaded documents are persisted.
    pub upload_dir: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Hosted completion backends available for summarization and answering.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    /// OpenAI chat completions API.
    OpenAi,
    /// Anthropic messages API.
    Claude,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env("OPENAI_API_KEY")?,
            claude_api_key: load_env("CLAUDE_API_KEY")?,
            openai_model: load_env_optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            claude_model: load_env_optional("CLAUDE_MODEL")
                .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
            openai_base_url: load_env_optional("OPENAI_BASE_URL"),
            claude_base_url: load_env_optional("CLAUDE_BASE_URL"),
            claude_max_tokens: parse_env_or("CLAUDE_MAX_TOKENS", DEFAULT_CLAUDE_MAX_TOKENS)?,
            summary_provider: match load_env_optional("SUMMARY_PROVIDER") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("SUMMARY_PROVIDER".to_string()))?,
                None => CompletionProvider::OpenAi,
            },
            fallback_message: load_env_optional("FALLBACK_MESSAGE")
                .unwrap_or_else(|| DEFAULT_FALLBACK_MESSAGE.to_string()),
            summary_chunk_size: parse_env_or("SUMMARY_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            summary_cache_capacity: parse_env_or("SUMMARY_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            upload_dir: load_env_optional("UPLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl std::str::FromStr for CompletionProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        summary_provider = ?config.summary_provider,
        chunk_size = config.summary_chunk_size,
        cache_capacity = config.summary_cache_capacity,
        upload_dir = %config.upload_dir,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
