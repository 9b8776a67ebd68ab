//! The plan execution pipeline.
//!
//! Walks a plan's tool sequence in order, deriving each stage's inputs from
//! the outputs of prior stages: search results feed the scraper's URL queue,
//! scraped text feeds analysis and summarization. Stages are bounded to keep
//! latency predictable: sub-question fan-out is capped, scraping stops early
//! once enough pages succeeded, and summarizer input is size-limited.
//!
//! Execution is strictly sequential. Failed invocations are recorded in the
//! log's `errors` list but never abort the run: the pipeline's contract is
//! to always hand the synthesizer *something*.

use crate::tools::registry::ToolRegistry;
use crate::types::{ExecutionLog, Plan, ScrapedPage, SearchOutcome, StageError, ToolInvocation};
use crate::utils::config::PipelineLimits;
use crate::utils::validators::truncate_chars;
use serde_json::json;
use std::sync::Arc;

/// Per-run accumulator threaded through the stage handlers.
///
/// Owned by exactly one pipeline run; concurrent queries never share one.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// URLs discovered by search stages, in discovery order. Duplicates are
    /// kept: scraping is idempotent and cache-backed downstream.
    pub urls_to_scrape: Vec<String>,
    /// Every invocation so far, in execution order.
    pub tool_results: Vec<ToolInvocation>,
    /// Every failed invocation so far, in execution order.
    pub errors: Vec<StageError>,
}

impl ExecutionContext {
    /// Record one invocation, mirroring failures into the error list.
    fn record(&mut self, invocation: ToolInvocation) {
        if !invocation.success {
            self.errors.push(StageError {
                tool: invocation.tool.clone(),
                error: invocation
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        self.tool_results.push(invocation);
    }

    /// Texts of all successful scrapes so far, in execution order.
    fn scraped_texts(&self) -> Vec<String> {
        self.tool_results
            .iter()
            .filter(|inv| inv.tool == crate::tools::SCRAPER && inv.success)
            .filter_map(|inv| inv.result.as_ref())
            .filter_map(|value| serde_json::from_value::<ScrapedPage>(value.clone()).ok())
            .map(|page| page.text)
            .collect()
    }
}

/// Executes research plans stage by stage.
pub struct Pipeline {
    registry: Arc<ToolRegistry>,
    limits: PipelineLimits,
}

impl Pipeline {
    pub fn new(registry: Arc<ToolRegistry>, limits: PipelineLimits) -> Self {
        Self { registry, limits }
    }

    /// Execute a plan, optionally overriding its sub-questions.
    ///
    /// Always returns a complete log; per-stage failures are reported in
    /// `errors`, never propagated.
    pub async fn execute(&self, plan: &Plan, sub_questions: Option<&[String]>) -> ExecutionLog {
        let sub_questions = sub_questions.unwrap_or(&plan.sub_questions);
        let limited: Vec<&String> = sub_questions
            .iter()
            .take(self.limits.max_sub_questions)
            .collect();

        let mut ctx = ExecutionContext::default();

        for stage in &plan.tool_sequence {
            tracing::info!(stage, "executing pipeline stage");
            match stage.as_str() {
                crate::tools::WEB_SEARCH => self.search_stage(plan, &limited, &mut ctx).await,
                crate::tools::SCRAPER => self.scrape_stage(&mut ctx).await,
                crate::tools::DATA_ANALYSIS => self.analysis_stage(&mut ctx).await,
                crate::tools::SUMMARIZER => self.summarizer_stage(&mut ctx).await,
                other => self.generic_stage(other, &mut ctx).await,
            }
        }

        ExecutionLog {
            plan: plan.clone(),
            tool_results: ctx.tool_results,
            // Lenient by design: per-tool failures live in `errors` and do
            // not mark the run as failed.
            success: true,
            errors: ctx.errors,
        }
    }

    /// Search stage: one invocation per sub-question, unless there are too
    /// many, in which case only the main query is searched to bound latency.
    async fn search_stage(
        &self,
        plan: &Plan,
        sub_questions: &[&String],
        ctx: &mut ExecutionContext,
    ) {
        if sub_questions.len() > self.limits.search_fanout_limit {
            tracing::debug!(
                count = sub_questions.len(),
                limit = self.limits.search_fanout_limit,
                "too many sub-questions, searching main query only"
            );
            let query = if plan.query.is_empty() {
                sub_questions[0].as_str()
            } else {
                plan.query.as_str()
            };
            let invocation = self
                .registry
                .invoke(crate::tools::WEB_SEARCH, json!({ "query": query }))
                .await;
            collect_urls(&invocation, &mut ctx.urls_to_scrape);
            ctx.record(invocation);
            return;
        }

        for question in sub_questions {
            let invocation = self
                .registry
                .invoke(crate::tools::WEB_SEARCH, json!({ "query": question }))
                .await;
            collect_urls(&invocation, &mut ctx.urls_to_scrape);
            ctx.record(invocation);
        }
    }

    /// Scrape stage: bounded, sequential, with early stop once enough
    /// invocations succeeded. URLs past the stop point are never fetched.
    async fn scrape_stage(&self, ctx: &mut ExecutionContext) {
        let candidates: Vec<String> = ctx
            .urls_to_scrape
            .iter()
            .take(self.limits.max_urls_to_scrape)
            .cloned()
            .collect();

        let mut successes = 0;
        for url in candidates {
            let invocation = self
                .registry
                .invoke(crate::tools::SCRAPER, json!({ "url": url }))
                .await;
            if invocation.success {
                successes += 1;
            }
            ctx.record(invocation);

            if successes >= self.limits.scrape_success_target {
                tracing::debug!(successes, "scrape stage reached success target, stopping");
                break;
            }
        }
    }

    /// Analysis stage: feed every successfully scraped text to the analysis
    /// tool. Skipped silently when nothing was scraped.
    async fn analysis_stage(&self, ctx: &mut ExecutionContext) {
        let text = ctx.scraped_texts().join(" ");
        if text.is_empty() {
            tracing::debug!("no scraped text, skipping analysis stage");
            return;
        }

        let invocation = self
            .registry
            .invoke(
                crate::tools::DATA_ANALYSIS,
                json!({ "text": text, "create_chart": true }),
            )
            .await;
        ctx.record(invocation);
    }

    /// Summarizer stage: concatenate bounded excerpts of scraped text and
    /// summarize once. Skipped silently when nothing was scraped.
    async fn summarizer_stage(&self, ctx: &mut ExecutionContext) {
        let mut buffer = String::new();
        for text in ctx.scraped_texts() {
            buffer.push_str(truncate_chars(&text, self.limits.scrape_excerpt_chars));
            buffer.push_str("\n\n");
            if buffer.chars().count() > self.limits.summary_buffer_chars {
                break;
            }
        }

        if buffer.is_empty() {
            tracing::debug!("no scraped text, skipping summarizer stage");
            return;
        }

        let text = truncate_chars(&buffer, self.limits.summary_buffer_chars);
        let invocation = self
            .registry
            .invoke(
                crate::tools::SUMMARIZER,
                json!({
                    "text": text,
                    "max_length": self.limits.summary_max_words,
                    "style": self.limits.summary_style,
                }),
            )
            .await;
        ctx.record(invocation);
    }

    /// Unknown stage names are invoked generically with no derived inputs.
    async fn generic_stage(&self, name: &str, ctx: &mut ExecutionContext) {
        let invocation = self.registry.invoke(name, json!({})).await;
        ctx.record(invocation);
    }
}

/// Append every item URL from a successful search result, order preserved.
fn collect_urls(invocation: &ToolInvocation, urls: &mut Vec<String>) {
    if !invocation.success {
        return;
    }
    let Some(result) = &invocation.result else {
        return;
    };
    let Ok(outcome) = serde_json::from_value::<SearchOutcome>(result.clone()) else {
        return;
    };
    for item in outcome.results {
        if !item.url.is_empty() {
            urls.push(item.url);
        }
    }
}
