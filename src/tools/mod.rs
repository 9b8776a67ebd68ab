//! Built-in tools and the registry that dispatches them.
//!
//! Each tool implements the [`registry::Tool`] trait and is looked up by
//! name. The pipeline only ever goes through [`registry::ToolRegistry::invoke`],
//! which converts every failure (unknown name included) into a failed
//! [`crate::types::ToolInvocation`] instead of an error.

/// Numeric extraction, statistics, and Markdown chart/table artifacts.
pub mod analysis;
/// Safe arithmetic expression evaluation.
pub mod calculator;
/// Tool trait, registry, and the invoke boundary.
pub mod registry;
/// Cache-backed HTML scraping with URL validation.
pub mod scraper;
/// Cache-backed web search.
pub mod search;
/// LLM-backed text summarization.
pub mod summarizer;

/// Canonical tool names used in plan tool sequences.
pub const WEB_SEARCH: &str = "web_search";
pub const SCRAPER: &str = "scraper";
pub const DATA_ANALYSIS: &str = "data_analysis";
pub const CALCULATOR: &str = "calculator";
pub const SUMMARIZER: &str = "summarizer";

use crate::llm::LLMClient;
use crate::storage::FileCache;
use crate::utils::config::ToolsConfig;
use registry::ToolRegistry;
use std::sync::Arc;

/// Build a registry holding every built-in tool.
pub fn builtin_registry(
    llm: Arc<dyn LLMClient>,
    cache: Arc<FileCache>,
    config: &ToolsConfig,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(search::SearchTool::new(
        cache.clone(),
        config.max_search_results,
    )));
    registry.register(Arc::new(scraper::ScraperTool::new(
        cache,
        config.max_scrape_length,
        config.scraper_timeout_secs,
    )));
    registry.register(Arc::new(analysis::AnalysisTool));
    registry.register(Arc::new(calculator::CalculatorTool));
    registry.register(Arc::new(summarizer::SummarizerTool::new(llm)));
    registry
}
