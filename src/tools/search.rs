//! Web search tool backed by daedra (DuckDuckGo).
//!
//! Results are cached under `search:<query>` keys. The tool never fails an
//! invocation: backend errors come back as an empty result set with an
//! `error` field, so a dead search API degrades a run instead of breaking
//! it.

use crate::storage::FileCache;
use crate::tools::registry::Tool;
use crate::types::{Result, SearchItem, SearchOutcome};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

pub struct SearchTool {
    cache: Arc<FileCache>,
    max_results: usize,
}

impl SearchTool {
    pub fn new(cache: Arc<FileCache>, max_results: usize) -> Self {
        Self { cache, max_results }
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        if query.is_empty() {
            return SearchOutcome {
                results: Vec::new(),
                query: String::new(),
                total_results: 0,
                error: Some("Empty search query".to_string()),
            };
        }

        let cache_key = format!("search:{query}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(outcome) = serde_json::from_value::<SearchOutcome>(cached) {
                tracing::debug!(query, "search cache hit");
                return outcome;
            }
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.max_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                let results: Vec<SearchItem> = response
                    .data
                    .iter()
                    .map(|r| SearchItem {
                        title: r.title.clone(),
                        url: r.url.clone(),
                        snippet: r.description.clone(),
                        score: 0.0,
                    })
                    .collect();

                let outcome = SearchOutcome {
                    total_results: results.len(),
                    results,
                    query: query.to_string(),
                    error: None,
                };

                if let Ok(value) = serde_json::to_value(&outcome) {
                    self.cache.set(&cache_key, value).await;
                }

                outcome
            }
            Err(e) => {
                tracing::warn!(query, "web search failed: {e}");
                SearchOutcome {
                    results: Vec::new(),
                    query: query.to_string(),
                    total_results: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        super::WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        // A missing query degrades to an error-carrying empty outcome.
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();

        let outcome = self.search(&query).await;
        serde_json::to_value(outcome)
            .map_err(|e| crate::types::AppError::Internal(e.to_string()))
    }
}
