//! Mock implementations for testing.
//!
//! Provides a mock LLM client and scripted tool stubs usable across test
//! files without duplication. None of these touch the network.

use async_trait::async_trait;
use parking_lot::Mutex;
use quaestor::llm::{GenerationOptions, LLMClient};
use quaestor::tools::registry::Tool;
use quaestor::types::{AppError, Result};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock LLM client with scripted responses.
///
/// Responses queued via [`MockLLMClient::with_responses`] are served in
/// order; once exhausted, the fallback response is repeated. Use
/// [`MockLLMClient::failing`] to simulate provider failures.
pub struct MockLLMClient {
    responses: Mutex<VecDeque<String>>,
    fallback: String,
    should_fail: bool,
}

impl MockLLMClient {
    /// A client that always returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: response.to_string(),
            should_fail: false,
        }
    }

    /// A client that serves the given responses in order, then repeats the
    /// last one.
    pub fn with_responses(responses: &[&str]) -> Self {
        let fallback = responses.last().copied().unwrap_or_default().to_string();
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            fallback,
            should_fail: false,
        }
    }

    /// A client that always returns an error.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
        if self.should_fail {
            return Err(AppError::Llm("Mock LLM failure".to_string()));
        }
        let mut responses = self.responses.lock();
        Ok(responses.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Deterministic URL for a query, shared by the stubs and assertions.
pub fn url_for(query: &str) -> String {
    let slug: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("https://example.com/{slug}")
}

/// Search stub returning one URL per query, counting invocations.
pub struct SearchStub {
    pub calls: Arc<AtomicUsize>,
}

impl SearchStub {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl Tool for SearchStub {
    fn name(&self) -> &str {
        "web_search"
    }
    fn description(&self) -> &str {
        "scripted search stub"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, args: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let query = args["query"].as_str().unwrap_or_default().to_string();
        let url = url_for(&query);
        Ok(json!({
            "results": [{
                "title": format!("Result for {query}"),
                "url": url,
                "snippet": "snippet text",
                "score": 0.0
            }],
            "query": query,
            "total_results": 1
        }))
    }
}

/// Scraper stub that succeeds only for an allowlisted set of URLs.
pub struct ScraperStub {
    pub calls: Arc<AtomicUsize>,
    succeed_for: Vec<String>,
}

impl ScraperStub {
    pub fn new(calls: Arc<AtomicUsize>, succeed_for: Vec<String>) -> Self {
        Self { calls, succeed_for }
    }
}

#[async_trait]
impl Tool for ScraperStub {
    fn name(&self) -> &str {
        "scraper"
    }
    fn description(&self) -> &str {
        "scripted scraper stub"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, args: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = args["url"].as_str().unwrap_or_default().to_string();
        if self.succeed_for.contains(&url) {
            let text = format!("Scraped content from {url} with enough words to summarize.");
            Ok(json!({
                "url": url,
                "title": "Stub Page",
                "length": text.len(),
                "text": text,
                "success": true
            }))
        } else {
            Err(AppError::Http(format!("Request error: {url} unreachable")))
        }
    }
}
