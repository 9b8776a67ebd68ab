//! Integration tests for the research coordinator: full runs, the
//! similarity short-circuit, graceful degradation, and streaming events.

mod common;

use common::mocks::{MockLLMClient, ScraperStub, SearchStub, url_for};
use futures::StreamExt;
use quaestor::research::{Pipeline, Planner, ResearchCoordinator, Synthesizer};
use quaestor::storage::SimilarityIndex;
use quaestor::tools::registry::ToolRegistry;
use quaestor::tools::summarizer::SummarizerTool;
use quaestor::utils::config::PipelineLimits;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const PLAN_JSON: &str = r#"{
    "sub_questions": ["q1", "q2", "q3"],
    "tool_sequence": ["web_search", "scraper", "summarizer"],
    "reasoning": "search, read, compress"
}"#;

struct Harness {
    coordinator: Arc<ResearchCoordinator>,
    search_calls: Arc<AtomicUsize>,
    _tmp: tempfile::TempDir,
}

async fn harness(llm: Arc<MockLLMClient>) -> Harness {
    let tmp = tempfile::TempDir::new().unwrap();
    let search_calls = Arc::new(AtomicUsize::new(0));
    let scrape_calls = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls.clone())));
    registry.register(Arc::new(ScraperStub::new(
        scrape_calls,
        vec![url_for("q1"), url_for("q2")],
    )));
    registry.register(Arc::new(SummarizerTool::new(llm.clone())));

    let limits = PipelineLimits::default();
    let similarity = Arc::new(SimilarityIndex::open(None).await.unwrap());

    let coordinator = Arc::new(ResearchCoordinator::new(
        Planner::new(llm.clone(), &limits),
        Pipeline::new(Arc::new(registry), limits),
        Synthesizer::new(llm, 2000),
        similarity,
        0.3,
        tmp.path().join("reports"),
    ));

    Harness {
        coordinator,
        search_calls,
        _tmp: tmp,
    }
}

#[tokio::test]
async fn full_run_produces_plan_results_and_report() {
    let llm = Arc::new(MockLLMClient::with_responses(&[
        PLAN_JSON,
        "a compact summary",
        "# AI and Jobs\n\nFindings here.",
    ]));
    let h = harness(llm).await;

    let outcome = h
        .coordinator
        .research("Impact of AI on jobs", false, false)
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.plan.success);
    assert_eq!(outcome.plan.sub_questions.len(), 3);
    assert_eq!(h.search_calls.load(Ordering::SeqCst), 3);
    assert!(outcome.report.success);
    assert!(outcome.report.markdown.starts_with("# AI and Jobs"));
    // The generated text had no references section, so one was appended.
    assert!(outcome.report.markdown.contains("## References"));
    assert!(!outcome.report.citations.is_empty());
    assert!(outcome.pdf.is_none());
}

#[tokio::test]
async fn rejects_empty_queries() {
    let h = harness(Arc::new(MockLLMClient::new(PLAN_JSON))).await;
    assert!(h.coordinator.research("   ", true, false).await.is_err());
}

#[tokio::test]
async fn repeated_query_is_served_from_the_similarity_index() {
    let llm = Arc::new(MockLLMClient::with_responses(&[
        PLAN_JSON,
        "a compact summary",
        "# Report\n\nBody.",
    ]));
    let h = harness(llm).await;

    let first = h
        .coordinator
        .research("Impact of AI on jobs", true, false)
        .await
        .unwrap();
    let searches_after_first = h.search_calls.load(Ordering::SeqCst);

    let second = h
        .coordinator
        .research("Impact of AI on jobs", true, false)
        .await
        .unwrap();

    // No new tool activity: the outcome came back from the index.
    assert_eq!(h.search_calls.load(Ordering::SeqCst), searches_after_first);
    assert_eq!(second.report.markdown, first.report.markdown);
    assert_eq!(second.query, first.query);
}

#[tokio::test]
async fn cache_bypass_reruns_the_pipeline() {
    let llm = Arc::new(MockLLMClient::with_responses(&[
        PLAN_JSON,
        "a compact summary",
        "# Report\n\nBody.",
    ]));
    let h = harness(llm).await;

    h.coordinator
        .research("Impact of AI on jobs", true, false)
        .await
        .unwrap();
    let searches_after_first = h.search_calls.load(Ordering::SeqCst);

    h.coordinator
        .research("Impact of AI on jobs", false, false)
        .await
        .unwrap();

    assert!(h.search_calls.load(Ordering::SeqCst) > searches_after_first);
}

#[tokio::test]
async fn total_llm_failure_still_yields_a_labeled_report() {
    // Planner, summarizer, and synthesizer all fail: the run degrades to
    // the fallback plan and the templated fallback report instead of
    // erroring.
    let h = harness(Arc::new(MockLLMClient::failing())).await;

    let outcome = h
        .coordinator
        .research("Impact of AI on jobs", false, false)
        .await
        .unwrap();

    assert!(!outcome.plan.success);
    assert_eq!(
        outcome.plan.tool_sequence,
        vec!["web_search", "scraper", "summarizer"]
    );
    assert!(!outcome.report.success);
    assert!(outcome.report.error.is_some());
    assert!(outcome.report.markdown.starts_with("# Research Report:"));
    // Summarizer failures surface per-tool, not as a run failure.
    assert!(outcome.success);
}

#[tokio::test]
async fn streaming_yields_staged_events_in_order() {
    let llm = Arc::new(MockLLMClient::with_responses(&[
        PLAN_JSON,
        "a compact summary",
        "# Report\n\nBody.",
    ]));
    let h = harness(llm).await;

    let events: Vec<_> = h
        .coordinator
        .clone()
        .research_stream("Impact of AI on jobs".to_string(), false)
        .collect()
        .await;

    assert_eq!(events.first().unwrap().step, "planning");
    assert_eq!(events.first().unwrap().status.as_deref(), Some("in_progress"));
    assert_eq!(events.last().unwrap().step, "complete");

    let steps: Vec<&str> = events.iter().map(|e| e.step.as_str()).collect();
    assert!(steps.contains(&"execution"));
    assert!(steps.contains(&"synthesis"));

    // One tool_result event per invocation: 3 searches + 2 scrapes + 1 summary.
    let tool_events = steps.iter().filter(|s| **s == "tool_result").count();
    assert_eq!(tool_events, 6);
}

#[tokio::test]
async fn streaming_rejects_empty_queries_with_an_error_event() {
    let h = harness(Arc::new(MockLLMClient::new(PLAN_JSON))).await;

    let events: Vec<_> = h
        .coordinator
        .clone()
        .research_stream("  ".to_string(), true)
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].step, "error");
}
