//! Core types shared across the research agent: the plan/execution data
//! model, tool payloads, report types, and the crate-wide error type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============= Planning Types =============

/// A research plan produced by the planner for a single query.
///
/// Plans are immutable once produced; the pipeline consumes them read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// The sanitized research query.
    pub query: String,
    /// Focused sub-questions derived from the query (3-7 before truncation).
    pub sub_questions: Vec<String>,
    /// Ordered tool names to execute.
    pub tool_sequence: Vec<String>,
    /// Brief explanation of why this plan should work.
    pub reasoning: String,
    /// False when the planner fell back to the fixed template plan.
    pub success: bool,
    /// Planner error that triggered the fallback, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============= Execution Types =============

/// The outcome of one tool invocation.
///
/// Exactly one of `result`/`error` is present: successful invocations carry
/// a payload and no error, failed ones carry a non-empty error and no
/// payload. Use the constructors to uphold this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the invoked tool.
    pub tool: String,
    /// Whether the invocation produced a payload.
    pub success: bool,
    /// Tool-specific payload, present iff `success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure description, present iff not `success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolInvocation {
    /// A successful invocation carrying `result`.
    pub fn succeeded(tool: impl Into<String>, result: Value) -> Self {
        Self {
            tool: tool.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// A failed invocation carrying a non-empty error message.
    pub fn failed(tool: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.is_empty() {
            "Unknown error".to_string()
        } else {
            error
        };
        Self {
            tool: tool.into(),
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// A per-stage failure recorded in the execution log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageError {
    /// Tool that failed.
    pub tool: String,
    /// Failure description.
    pub error: String,
}

/// The full accumulated record of one pipeline run.
///
/// `tool_results` preserves execution order exactly; citation extraction and
/// context building rely on that order to associate search results with the
/// scrapes they triggered. `success` is initialized true and is not flipped
/// by individual tool failures; partial failure is surfaced via `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// The plan this run executed.
    pub plan: Plan,
    /// Every tool invocation, in execution order.
    pub tool_results: Vec<ToolInvocation>,
    /// Run-level success flag (lenient: tolerant of per-tool failures).
    pub success: bool,
    /// Every failed invocation, in execution order.
    pub errors: Vec<StageError>,
}

// ============= Tool Payload Types =============

/// One web search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: f32,
}

/// Payload of the web search tool.
///
/// The search tool never fails an invocation: backend errors surface as an
/// empty result set with `error` populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchItem>,
    pub query: String,
    pub total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload of the scraper tool on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub text: String,
    pub length: usize,
    pub success: bool,
}

/// Payload of the summarizer tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub compression_ratio: f64,
    pub success: bool,
}

/// Payload of the calculator tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub expression: String,
    pub result: f64,
    pub success: bool,
}

/// Basic statistics over numbers extracted from text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

/// Numbers extracted from free text plus their statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericProfile {
    pub numbers: Vec<f64>,
    pub count: usize,
    pub statistics: NumericStatistics,
}

/// Payload of the data analysis tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<NumericProfile>,
    /// Markdown bar chart of the extracted numbers, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    /// Markdown table of structured input rows, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

// ============= Report Types =============

/// A deduplicated source reference surfaced in the final report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// The synthesized research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub query: String,
    pub markdown: String,
    pub citations: Vec<Citation>,
    /// False when report generation fell back to the deterministic template.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of rendering a report to PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfArtifact {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============= API Request/Response Types =============

/// Request body accepted by the research endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default)]
    pub generate_pdf: bool,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

/// Complete result of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub query: String,
    pub plan: Plan,
    pub tool_results: Vec<ToolInvocation>,
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfArtifact>,
    pub success: bool,
}

/// A staged progress event emitted by the streaming research endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    /// Stage identifier (planning, execution, tool_result, synthesis, complete).
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl StepEvent {
    pub fn in_progress(step: &str) -> Self {
        Self {
            step: step.to_string(),
            status: Some("in_progress".to_string()),
            data: None,
        }
    }

    pub fn completed(step: &str, data: Value) -> Self {
        Self {
            step: step.to_string(),
            status: Some("completed".to_string()),
            data: Some(data),
        }
    }

    pub fn data(step: &str, data: Value) -> Self {
        Self {
            step: step.to_string(),
            status: None,
            data: Some(data),
        }
    }
}

// ============= Error Types =============

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Configuration(msg)
            | AppError::Llm(msg)
            | AppError::Tool(msg)
            | AppError::Storage(msg)
            | AppError::Http(msg)
            | AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({ "error": message });

        (status, axum::Json(body)).into_response()
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppError>;
