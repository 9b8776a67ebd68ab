//! Environment-based configuration.
//!
//! Every knob has a documented default so a bare `.env` with just
//! `GROQ_API_KEY` is enough to run the server.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::types::{AppError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineLimits,
    pub storage: StorageConfig,
}

/// HTTP server binding and request deadline.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request deadline for the synchronous research endpoint.
    pub request_timeout_secs: u64,
}

/// LLM provider settings (OpenAI-compatible; Groq by default).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub max_response_tokens: u32,
    pub temperature: f32,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Per-tool limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    pub max_search_results: usize,
    pub max_scrape_length: usize,
    pub scraper_timeout_secs: u64,
}

/// Bounding policy for the plan execution pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineLimits {
    /// Sub-questions are truncated to this many before the search stage.
    pub max_sub_questions: usize,
    /// More sub-questions than this collapses the search stage to the main query.
    pub search_fanout_limit: usize,
    /// At most this many URLs are scraped per run.
    pub max_urls_to_scrape: usize,
    /// The scrape stage stops once this many invocations succeeded.
    pub scrape_success_target: usize,
    /// Per-scrape excerpt size fed to the summarizer stage.
    pub scrape_excerpt_chars: usize,
    /// Hard cap on the summarizer stage's input buffer.
    pub summary_buffer_chars: usize,
    /// Target summary length in words.
    pub summary_max_words: usize,
    /// Summary style passed to the summarizer tool.
    pub summary_style: String,
}

/// Cache and similarity-index storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub cache_dir: PathBuf,
    pub cache_ttl_hours: u64,
    /// Directory for the persistent similarity index; in-memory when unset.
    pub vector_path: Option<PathBuf>,
    /// A prior result within this distance of the query short-circuits a run.
    pub similarity_threshold: f32,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_sub_questions: 5,
            search_fanout_limit: 3,
            max_urls_to_scrape: 3,
            scrape_success_target: 2,
            scrape_excerpt_chars: 2000,
            summary_buffer_chars: 3000,
            summary_max_words: 150,
            summary_style: "concise".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment (a `.env` file is honored).
    ///
    /// Fails only when a required value (`GROQ_API_KEY`) is absent or a
    /// numeric override does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env("PORT", 8000)?,
                request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 540)?,
            },
            llm: LlmConfig {
                api_key: env::var("GROQ_API_KEY").map_err(|_| {
                    AppError::Configuration(
                        "GROQ_API_KEY is required. Set it in the environment or a .env file"
                            .to_string(),
                    )
                })?,
                api_base: env::var("LLM_API_BASE")
                    .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
                model: env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
                max_response_tokens: parse_env("MAX_RESPONSE_TOKENS", 2000)?,
                temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
                max_retries: parse_env("MAX_RETRIES", 3)?,
                retry_delay_ms: parse_env("RETRY_DELAY_MS", 1000)?,
            },
            tools: ToolsConfig {
                max_search_results: parse_env("MAX_SEARCH_RESULTS", 3)?,
                max_scrape_length: parse_env("MAX_SCRAPE_LENGTH", 5000)?,
                scraper_timeout_secs: parse_env("SCRAPER_TIMEOUT_SECS", 10)?,
            },
            pipeline: PipelineLimits {
                max_sub_questions: parse_env("MAX_SUB_QUESTIONS", 5)?,
                search_fanout_limit: parse_env("SEARCH_FANOUT_LIMIT", 3)?,
                max_urls_to_scrape: parse_env("MAX_URLS_TO_SCRAPE", 3)?,
                scrape_success_target: parse_env("SCRAPE_SUCCESS_TARGET", 2)?,
                scrape_excerpt_chars: parse_env("SCRAPE_EXCERPT_CHARS", 2000)?,
                summary_buffer_chars: parse_env("SUMMARY_BUFFER_CHARS", 3000)?,
                summary_max_words: parse_env("SUMMARY_MAX_WORDS", 150)?,
                summary_style: env::var("SUMMARY_STYLE")
                    .unwrap_or_else(|_| "concise".to_string()),
            },
            storage: StorageConfig {
                cache_dir: env::var("CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./cache")),
                cache_ttl_hours: parse_env("CACHE_TTL_HOURS", 24)?,
                vector_path: env::var("VECTOR_PATH").ok().map(PathBuf::from),
                similarity_threshold: parse_env("SIMILARITY_THRESHOLD", 0.3)?,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| {
            AppError::Configuration(format!("{name} has an invalid value: {raw:?}"))
        }),
        Err(_) => Ok(default),
    }
}
