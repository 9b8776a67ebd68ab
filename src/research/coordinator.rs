//! End-to-end research coordination: plan, execute, synthesize, index.

use crate::research::{Pipeline, Planner, Synthesizer, pdf};
use crate::storage::SimilarityIndex;
use crate::types::{ResearchOutcome, Result, StepEvent};
use crate::utils::validators::sanitize_query;
use futures::Stream;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

/// Drives the complete research workflow for one query at a time.
///
/// Runs are independent: all per-run state lives in the pipeline's
/// execution context, so a coordinator can serve concurrent queries. The
/// similarity index and tool caches are the only cross-run state.
pub struct ResearchCoordinator {
    planner: Planner,
    pipeline: Pipeline,
    synthesizer: Synthesizer,
    similarity: Arc<SimilarityIndex>,
    similarity_threshold: f32,
    pdf_dir: PathBuf,
}

impl ResearchCoordinator {
    pub fn new(
        planner: Planner,
        pipeline: Pipeline,
        synthesizer: Synthesizer,
        similarity: Arc<SimilarityIndex>,
        similarity_threshold: f32,
        pdf_dir: PathBuf,
    ) -> Self {
        Self {
            planner,
            pipeline,
            synthesizer,
            similarity,
            similarity_threshold,
            pdf_dir,
        }
    }

    /// Perform the complete research workflow.
    ///
    /// Fails only on invalid input; planning, execution, and synthesis all
    /// degrade internally and always produce a result.
    pub async fn research(
        &self,
        query: &str,
        use_cache: bool,
        generate_pdf: bool,
    ) -> Result<ResearchOutcome> {
        let query = sanitize_query(query)?;

        if use_cache {
            if let Some(cached) = self.lookup_similar(&query).await {
                tracing::info!(query, "serving research outcome from similarity index");
                return Ok(cached);
            }
        }

        let run_id = uuid::Uuid::new_v4();
        tracing::info!(query, %run_id, "starting research run");
        let plan = self.planner.create_plan(&query).await;
        let log = self.pipeline.execute(&plan, Some(&plan.sub_questions)).await;
        let report = self
            .synthesizer
            .generate_report(&query, &plan, &log.tool_results)
            .await;

        let pdf = if generate_pdf {
            Some(pdf::render_report(&report, &self.pdf_dir).await)
        } else {
            None
        };

        let outcome = ResearchOutcome {
            query: query.clone(),
            plan,
            tool_results: log.tool_results,
            report,
            pdf,
            success: true,
        };

        self.index_outcome(&query, &outcome).await;

        Ok(outcome)
    }

    /// Perform research while emitting staged progress events.
    ///
    /// Tool results are replayed one event at a time after execution so the
    /// caller can render per-tool progress; errors never terminate the
    /// stream early except for invalid input.
    pub fn research_stream(
        self: Arc<Self>,
        query: String,
        use_cache: bool,
    ) -> impl Stream<Item = StepEvent> + Send {
        async_stream::stream! {
            let query = match sanitize_query(&query) {
                Ok(query) => query,
                Err(e) => {
                    yield StepEvent::data("error", json!({ "error": e.to_string() }));
                    return;
                }
            };

            if use_cache {
                if let Some(cached) = self.lookup_similar(&query).await {
                    tracing::info!(query, "streaming cached research outcome");
                    yield StepEvent::data("complete", to_value_or_null(&cached));
                    return;
                }
            }

            yield StepEvent::in_progress("planning");
            let plan = self.planner.create_plan(&query).await;
            yield StepEvent::completed("planning", to_value_or_null(&plan));

            yield StepEvent::in_progress("execution");
            let log = self.pipeline.execute(&plan, Some(&plan.sub_questions)).await;
            for invocation in &log.tool_results {
                yield StepEvent::data("tool_result", to_value_or_null(invocation));
            }
            yield StepEvent::completed("execution", to_value_or_null(&log));

            yield StepEvent::in_progress("synthesis");
            let report = self
                .synthesizer
                .generate_report(&query, &plan, &log.tool_results)
                .await;
            yield StepEvent::completed("synthesis", to_value_or_null(&report));

            let outcome = ResearchOutcome {
                query: query.clone(),
                plan,
                tool_results: log.tool_results,
                report,
                pdf: None,
                success: true,
            };
            self.index_outcome(&query, &outcome).await;

            yield StepEvent::data("complete", to_value_or_null(&outcome));
        }
    }

    /// Return a prior outcome when one sits within the similarity threshold.
    async fn lookup_similar(&self, query: &str) -> Option<ResearchOutcome> {
        let hits = self.similarity.search(query, 1).await;
        let hit = hits.into_iter().next()?;
        if hit.distance >= self.similarity_threshold {
            return None;
        }
        match serde_json::from_value::<ResearchOutcome>(hit.payload) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::debug!("similar outcome payload did not deserialize: {e}");
                None
            }
        }
    }

    /// Store the outcome for future similarity lookups. Failures swallowed.
    async fn index_outcome(&self, query: &str, outcome: &ResearchOutcome) {
        match serde_json::to_value(outcome) {
            Ok(payload) => self.similarity.add(query, &payload).await,
            Err(e) => tracing::debug!("research outcome did not serialize: {e}"),
        }
    }
}

fn to_value_or_null<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
