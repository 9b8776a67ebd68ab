//! Report synthesis: citation extraction, bounded context construction,
//! and Markdown report generation with a deterministic fallback.

use crate::llm::{GenerationOptions, LLMClient};
use crate::types::{Citation, Plan, Report, ToolInvocation};
use crate::utils::validators::truncate_chars;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// At most this many search items are stringified into the context per
/// search invocation.
const CONTEXT_SEARCH_ITEMS: usize = 3;
/// At most this many scraped pages contribute to the context.
const CONTEXT_SCRAPED_PAGES: usize = 3;
/// Per-page excerpt size in the context.
const CONTEXT_SCRAPE_CHARS: usize = 1000;
/// Context excerpt inlined into the fallback report.
const FALLBACK_CONTEXT_CHARS: usize = 2000;
/// Hard cap on report completion tokens.
const REPORT_TOKEN_CAP: u32 = 3000;

const REPORT_SYSTEM_PROMPT: &str = "You are a research report writer. Create a comprehensive, \
well-structured research report based on the provided information. The report should be \
professional, accurate, and well-organized.";

pub struct Synthesizer {
    llm: Arc<dyn LLMClient>,
    max_response_tokens: u32,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LLMClient>, max_response_tokens: u32) -> Self {
        Self {
            llm,
            max_response_tokens,
        }
    }

    /// Extract citations from tool results, deduplicated by exact URL
    /// string in first-seen order.
    pub fn extract_citations(tool_results: &[ToolInvocation]) -> Vec<Citation> {
        let mut citations = Vec::new();
        let mut seen_urls: HashSet<String> = HashSet::new();

        for invocation in tool_results {
            if !invocation.success {
                continue;
            }
            let Some(result) = &invocation.result else {
                continue;
            };

            match invocation.tool.as_str() {
                crate::tools::WEB_SEARCH => {
                    let Some(items) = result.get("results").and_then(|v| v.as_array()) else {
                        continue;
                    };
                    for item in items {
                        let url = item.get("url").and_then(|v| v.as_str()).unwrap_or_default();
                        if url.is_empty() || seen_urls.contains(url) {
                            continue;
                        }
                        let title = item
                            .get("title")
                            .and_then(|v| v.as_str())
                            .filter(|t| !t.is_empty())
                            .unwrap_or(url);
                        citations.push(Citation {
                            title: title.to_string(),
                            url: url.to_string(),
                        });
                        seen_urls.insert(url.to_string());
                    }
                }
                crate::tools::SCRAPER => {
                    let url = result.get("url").and_then(|v| v.as_str()).unwrap_or_default();
                    if url.is_empty() || seen_urls.contains(url) {
                        continue;
                    }
                    let title = result
                        .get("title")
                        .and_then(|v| v.as_str())
                        .filter(|t| !t.is_empty())
                        .unwrap_or(url);
                    citations.push(Citation {
                        title: title.to_string(),
                        url: url.to_string(),
                    });
                    seen_urls.insert(url.to_string());
                }
                _ => {}
            }
        }

        citations
    }

    /// Build the bounded textual context handed to the report prompt.
    fn build_context(tool_results: &[ToolInvocation]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut scraped_seen = 0;

        for invocation in tool_results {
            if !invocation.success {
                continue;
            }
            let Some(result) = &invocation.result else {
                continue;
            };

            match invocation.tool.as_str() {
                crate::tools::WEB_SEARCH => {
                    if let Some(items) = result.get("results").and_then(|v| v.as_array()) {
                        let shown: Vec<&Value> =
                            items.iter().take(CONTEXT_SEARCH_ITEMS).collect();
                        if !shown.is_empty() {
                            let rendered = serde_json::to_string(&shown).unwrap_or_default();
                            parts.push(format!("Search Results:\n{rendered}"));
                        }
                    }
                }
                crate::tools::SCRAPER => {
                    if scraped_seen >= CONTEXT_SCRAPED_PAGES {
                        continue;
                    }
                    scraped_seen += 1;
                    let text = result.get("text").and_then(|v| v.as_str()).unwrap_or_default();
                    let title = result
                        .get("title")
                        .and_then(|v| v.as_str())
                        .filter(|t| !t.is_empty())
                        .unwrap_or("page");
                    parts.push(format!(
                        "Content from {title}:\n{}",
                        truncate_chars(text, CONTEXT_SCRAPE_CHARS)
                    ));
                }
                crate::tools::DATA_ANALYSIS => {
                    let rendered = serde_json::to_string(result).unwrap_or_default();
                    parts.push(format!("Data Analysis:\n{rendered}"));
                }
                _ => {}
            }
        }

        parts.join("\n\n")
    }

    /// Generate the final report. Never fails: generation errors produce a
    /// deterministic templated fallback marked `success = false`.
    pub async fn generate_report(
        &self,
        query: &str,
        _plan: &Plan,
        tool_results: &[ToolInvocation],
    ) -> Report {
        let citations = Self::extract_citations(tool_results);
        let context = Self::build_context(tool_results);

        let prompt = format!(
            "Based on the following research query and collected information, create a \
             comprehensive research report in Markdown format.\n\n\
             Research Query: {query}\n\n\
             Collected Information:\n{context}\n\n\
             Create a report with the following structure:\n\
             1. # Title (based on the query)\n\
             2. ## Executive Summary (2-3 paragraphs)\n\
             3. ## Key Findings (bullet points of main findings)\n\
             4. ## Deep Dive (detailed sections covering different aspects)\n\
             5. ## Data Analysis (if data was found, include tables/charts descriptions)\n\
             6. ## Conclusion (summary and implications)\n\
             7. ## References (list all source URLs)\n\n\
             Make sure to:\n\
             - Synthesize information from multiple sources\n\
             - Provide accurate information\n\
             - Include specific details and numbers when available\n\
             - Write in a professional, academic style\n\
             - Cite sources naturally in the text\n\
             - Format the report properly in Markdown"
        );

        let options = GenerationOptions {
            system: Some(REPORT_SYSTEM_PROMPT.to_string()),
            max_tokens: Some((self.max_response_tokens * 2).min(REPORT_TOKEN_CAP)),
            temperature: Some(0.7),
        };

        match self.llm.generate(&prompt, &options).await {
            Ok(mut markdown) => {
                if !markdown.contains("## References") && !citations.is_empty() {
                    markdown.push_str("\n\n## References\n\n");
                    markdown.push_str(&render_references(&citations));
                }
                Report {
                    query: query.to_string(),
                    markdown,
                    citations,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(query, "report generation failed, using fallback: {e}");
                Report {
                    query: query.to_string(),
                    markdown: fallback_report(query, &context, &citations),
                    citations,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn render_references(citations: &[Citation]) -> String {
    citations
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. [{}]({})\n", i + 1, c.title, c.url))
        .collect()
}

/// The deterministic report used when generation fails.
fn fallback_report(query: &str, context: &str, citations: &[Citation]) -> String {
    format!(
        "# Research Report: {query}\n\n\
         ## Executive Summary\n\n\
         Research was conducted on: {query}\n\n\
         ## Key Findings\n\n\
         - Information gathered from {} sources\n\
         - Multiple perspectives analyzed\n\n\
         ## Deep Dive\n\n\
         {}\n\n\
         ## Conclusion\n\n\
         Research completed with findings from various sources.\n\n\
         ## References\n\n\
         {}",
        citations.len(),
        truncate_chars(context, FALLBACK_CONTEXT_CHARS),
        render_references(citations)
    )
}
