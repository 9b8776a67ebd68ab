//! Integration tests for the plan execution pipeline against scripted
//! tools: bounding, early stop, failure isolation, and the end-to-end
//! research scenario.

mod common;

use common::mocks::{MockLLMClient, ScraperStub, SearchStub, url_for};
use quaestor::research::{Pipeline, Synthesizer};
use quaestor::tools::registry::ToolRegistry;
use quaestor::tools::summarizer::SummarizerTool;
use quaestor::types::Plan;
use quaestor::utils::config::PipelineLimits;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn plan(query: &str, tool_sequence: &[&str], sub_questions: &[&str]) -> Plan {
    Plan {
        query: query.to_string(),
        sub_questions: sub_questions.iter().map(|s| s.to_string()).collect(),
        tool_sequence: tool_sequence.iter().map(|s| s.to_string()).collect(),
        reasoning: "test plan".to_string(),
        success: true,
        error: None,
    }
}

#[tokio::test]
async fn empty_tool_sequence_produces_empty_log() {
    let pipeline = Pipeline::new(Arc::new(ToolRegistry::new()), PipelineLimits::default());
    let log = pipeline.execute(&plan("q", &[], &["a", "b", "c"]), None).await;

    assert!(log.tool_results.is_empty());
    assert!(log.errors.is_empty());
    assert!(log.success);
}

#[tokio::test]
async fn unknown_tools_never_panic_and_mention_their_name() {
    let registry = ToolRegistry::new();
    let invocation = registry.invoke("warp_drive", json!({})).await;

    assert!(!invocation.success);
    assert!(invocation.error.as_deref().unwrap().contains("warp_drive"));
}

#[rstest]
#[case::four_collapses(vec!["q1", "q2", "q3", "q4"], 1)]
#[case::three_fans_out(vec!["q1", "q2", "q3"], 3)]
#[case::ten_collapses_after_truncation(
    vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"],
    1
)]
#[tokio::test]
async fn search_bounding_boundary(
    #[case] sub_questions: Vec<&str>,
    #[case] expected_searches: usize,
) {
    let search_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls.clone())));

    let pipeline = Pipeline::new(Arc::new(registry), PipelineLimits::default());
    pipeline
        .execute(&plan("main query", &["web_search"], &sub_questions), None)
        .await;

    assert_eq!(search_calls.load(Ordering::SeqCst), expected_searches);
}

#[tokio::test]
async fn scrape_early_stop_skips_remaining_urls() {
    // Five candidate URLs, all scrapable: the stage stops after two
    // successes and never touches the rest.
    let search_calls = Arc::new(AtomicUsize::new(0));
    let scrape_calls = Arc::new(AtomicUsize::new(0));
    let questions = ["q1", "q2", "q3"];

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls.clone())));
    registry.register(Arc::new(ScraperStub::new(
        scrape_calls.clone(),
        questions.iter().map(|q| url_for(q)).collect(),
    )));

    let limits = PipelineLimits {
        max_urls_to_scrape: 5,
        ..Default::default()
    };
    let pipeline = Pipeline::new(Arc::new(registry), limits);
    let log = pipeline
        .execute(&plan("q", &["web_search", "scraper"], &questions), None)
        .await;

    assert_eq!(scrape_calls.load(Ordering::SeqCst), 2);
    assert!(log.errors.is_empty());
}

#[tokio::test]
async fn end_to_end_research_scenario() {
    // Three sub-questions fan out to three searches, each yielding one
    // URL; only the first two URLs scrape successfully, stopping the
    // scrape stage early; the summarizer runs once over the scraped text.
    let search_calls = Arc::new(AtomicUsize::new(0));
    let scrape_calls = Arc::new(AtomicUsize::new(0));
    let questions = ["q1", "q2", "q3"];

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls.clone())));
    registry.register(Arc::new(ScraperStub::new(
        scrape_calls.clone(),
        vec![url_for("q1"), url_for("q2")],
    )));
    registry.register(Arc::new(SummarizerTool::new(Arc::new(MockLLMClient::new(
        "a compact summary of the findings",
    )))));

    let pipeline = Pipeline::new(Arc::new(registry), PipelineLimits::default());
    let log = pipeline
        .execute(
            &plan(
                "Impact of AI on jobs",
                &["web_search", "scraper", "summarizer"],
                &questions,
            ),
            None,
        )
        .await;

    assert_eq!(search_calls.load(Ordering::SeqCst), 3);
    assert_eq!(scrape_calls.load(Ordering::SeqCst), 2);
    let summarizer_runs = log
        .tool_results
        .iter()
        .filter(|inv| inv.tool == "summarizer")
        .count();
    assert_eq!(summarizer_runs, 1);
    assert!(log.errors.is_empty());
    assert!(log.success);

    // Citations dedup by URL across search and scrape results.
    let citations = Synthesizer::extract_citations(&log.tool_results);
    assert!(citations.len() <= 6);
    assert_eq!(citations.len(), 3);
    let urls: Vec<String> = citations.iter().map(|c| c.url.clone()).collect();
    let expected: Vec<String> = questions.iter().map(|q| url_for(q)).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn failed_stages_do_not_abort_the_run() {
    // No scraper registered: every discovered URL fails to scrape, yet the
    // run completes and reports the failures in `errors`.
    let search_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls.clone())));

    let pipeline = Pipeline::new(Arc::new(registry), PipelineLimits::default());
    let log = pipeline
        .execute(&plan("q", &["web_search", "scraper"], &["q1", "q2"]), None)
        .await;

    assert_eq!(search_calls.load(Ordering::SeqCst), 2);
    let scrape_failures = log
        .tool_results
        .iter()
        .filter(|inv| inv.tool == "scraper" && !inv.success)
        .count();
    assert_eq!(scrape_failures, 2);
    assert_eq!(log.errors.len(), 2);
    assert!(log.success);
}

#[tokio::test]
async fn citation_extraction_is_idempotent() {
    let search_calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchStub::new(search_calls)));

    let pipeline = Pipeline::new(Arc::new(registry), PipelineLimits::default());
    let log = pipeline
        .execute(&plan("q", &["web_search"], &["q1", "q2"]), None)
        .await;

    let first = Synthesizer::extract_citations(&log.tool_results);
    let second = Synthesizer::extract_citations(&log.tool_results);
    assert_eq!(first, second);
}
