//! # Quaestor - Autonomous Research Agent Server
//!
//! An agentic research server built in Rust: given a natural-language
//! query, it decomposes the query into sub-questions, executes a bounded
//! tool pipeline (web search, scraping, numeric analysis, summarization),
//! and synthesizes the results into a cited Markdown report.
//!
//! ## Overview
//!
//! Quaestor can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `quaestor-server` binary
//! 2. **As a library** - Import components into your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use quaestor::{
//!     llm::{LLMClientFactory, Provider, client::RetryPolicy},
//!     research::{Pipeline, Planner, Synthesizer},
//!     tools::builtin_registry,
//! };
//! use std::sync::Arc;
//!
//! let factory = LLMClientFactory::new(
//!     Provider::Groq { api_key: "...".into(), model: "llama-3.1-8b-instant".into() },
//!     RetryPolicy::default(),
//! );
//! let llm: Arc<dyn quaestor::llm::LLMClient> = factory.create_default().into();
//! ```
//!
//! ## Architecture
//!
//! Control flow for one query:
//!
//! 1. The [`research::Planner`] asks the LLM for sub-questions and an
//!    ordered tool sequence, falling back to a fixed plan on failure.
//! 2. The [`research::Pipeline`] walks the tool sequence, threading
//!    outputs of earlier stages into inputs of later ones under bounded
//!    fan-out (search fan-out cap, scrape early stop, summary size caps).
//! 3. The [`research::Synthesizer`] extracts citations, builds a bounded
//!    textual context, and produces the final Markdown report, with a
//!    deterministic fallback when generation fails.
//!
//! Per-tool failures never abort a run: they are recorded in the execution
//! log's error list and the final report is always produced.
//!
//! ## Modules
//!
//! - [`research`] - Planner, execution pipeline, synthesizer, coordinator
//! - [`tools`] - Tool trait, registry, and the built-in tools
//! - [`llm`] - LLM client abstractions (OpenAI-compatible providers)
//! - [`storage`] - File cache and query similarity index
//! - [`api`] - REST API handlers and routes
//! - [`types`] - Common types and error handling

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Research workflow: planning, execution, synthesis.
pub mod research;
/// Cross-run storage (cache, similarity index).
pub mod storage;
/// Built-in tools and the tool registry.
pub mod tools;
/// Core types (plans, invocations, reports, errors).
pub mod types;
/// Configuration and validation utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use research::{Pipeline, Planner, ResearchCoordinator, Synthesizer};
pub use storage::{FileCache, SimilarityIndex};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, ExecutionLog, Plan, Report, Result, ToolInvocation};
pub use utils::config::Config;

use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// The research coordinator serving every request.
    pub coordinator: Arc<ResearchCoordinator>,
}
