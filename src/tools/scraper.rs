//! Web page scraping tool.
//!
//! Validates and normalizes the URL before any network activity, fetches
//! with a bounded timeout, and extracts readable text (headings,
//! paragraphs, list items) with a body-text fallback. Pages are cached
//! under `scrape:<url>` keys.
//!
//! Unlike the search tool, scrape failures are real invocation failures:
//! the pipeline's early-stop counter must only count pages that actually
//! produced text.

use crate::storage::FileCache;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result, ScrapedPage};
use crate::utils::validators::{sanitize_url, truncate_chars, validate_url};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct ScraperTool {
    cache: Arc<FileCache>,
    http: reqwest::Client,
    max_length: usize,
}

impl ScraperTool {
    pub fn new(cache: Arc<FileCache>, max_length: usize, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            cache,
            http,
            max_length,
        }
    }

    async fn scrape(&self, raw_url: &str) -> Result<ScrapedPage> {
        let url = sanitize_url(raw_url).unwrap_or_else(|| raw_url.to_string());
        if !validate_url(&url) {
            return Err(AppError::InvalidInput(format!("Invalid URL: {raw_url}")));
        }

        let cache_key = format!("scrape:{url}");
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(page) = serde_json::from_value::<ScrapedPage>(cached) {
                tracing::debug!(url, "scrape cache hit");
                return Ok(page);
            }
        }

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request error: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Http(format!("Request error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(format!("Request error: {e}")))?;

        let (title, text) = extract_text(&body);
        if text.is_empty() {
            return Err(AppError::Tool(format!("No readable text at {url}")));
        }

        let mut text = text;
        if text.chars().count() > self.max_length {
            text = format!("{}...", truncate_chars(&text, self.max_length));
        }

        let page = ScrapedPage {
            url: url.clone(),
            title,
            length: text.len(),
            text,
            success: true,
        };

        if let Ok(value) = serde_json::to_value(&page) {
            self.cache.set(&cache_key, value).await;
        }

        Ok(page)
    }
}

/// Pull the title and readable text out of an HTML document.
///
/// Content elements (headings, paragraphs, list items, blockquotes) are
/// preferred; documents without any fall back to whole-body text. Script
/// and style contents never appear in either path's selected elements.
fn extract_text(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let content_selector =
        Selector::parse("h1, h2, h3, h4, h5, h6, p, li, blockquote").expect("static selector");
    let mut chunks: Vec<String> = document
        .select(&content_selector)
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|chunk| !chunk.is_empty())
        .collect();

    if chunks.is_empty() {
        let body_selector = Selector::parse("body").expect("static selector");
        if let Some(body) = document.select(&body_selector).next() {
            let text = body
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                chunks.push(text);
            }
        }
    }

    (title, chunks.join(" "))
}

#[async_trait]
impl Tool for ScraperTool {
    fn name(&self) -> &str {
        super::SCRAPER
    }

    fn description(&self) -> &str {
        "Extract readable text content from a webpage"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the page to scrape"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        // A missing url degrades to a validation failure, not a crash.
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim();

        let page = self.scrape(url).await?;
        serde_json::to_value(page).map_err(|e| AppError::Internal(e.to_string()))
    }
}
