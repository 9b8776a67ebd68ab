//! Text summarization tool backed by the LLM client.

use crate::llm::{GenerationOptions, LLMClient};
use crate::tools::registry::Tool;
use crate::types::{AppError, Result, SummaryOutcome};
use crate::utils::validators::truncate_chars;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// Inputs longer than this are truncated before prompting.
const MAX_INPUT_CHARS: usize = 2000;
/// Hard cap on summary completion tokens.
const MAX_SUMMARY_TOKENS: u32 = 500;

pub struct SummarizerTool {
    llm: Arc<dyn LLMClient>,
}

impl SummarizerTool {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    async fn summarize(&self, text: &str, max_length: usize, style: &str) -> Result<SummaryOutcome> {
        if text.trim().chars().count() < 10 {
            return Err(AppError::InvalidInput(
                "Text too short to summarize".to_string(),
            ));
        }

        let text = if text.chars().count() > MAX_INPUT_CHARS {
            format!("{}...", truncate_chars(text, MAX_INPUT_CHARS))
        } else {
            text.to_string()
        };

        let prompt = match style {
            "bullet" => format!(
                "Summarize the following text in bullet points (maximum {max_length} words):\n\n{text}"
            ),
            "detailed" => format!(
                "Provide a detailed summary of the following text (maximum {max_length} words):\n\n{text}"
            ),
            _ => format!(
                "Provide a concise summary of the following text (maximum {max_length} words):\n\n{text}"
            ),
        };

        let options = GenerationOptions {
            system: Some(
                "You are a helpful assistant that creates clear and accurate summaries."
                    .to_string(),
            ),
            max_tokens: Some(((max_length * 2) as u32).min(MAX_SUMMARY_TOKENS)),
            // Low temperature keeps summaries consistent across retries.
            temperature: Some(0.3),
        };

        let summary = self.llm.generate(&prompt, &options).await?;
        let summary = summary.trim().to_string();

        let original_length = text.len();
        let summary_length = summary.len();
        Ok(SummaryOutcome {
            compression_ratio: if original_length > 0 {
                summary_length as f64 / original_length as f64
            } else {
                1.0
            },
            summary,
            original_length,
            summary_length,
            success: true,
        })
    }
}

#[async_trait]
impl Tool for SummarizerTool {
    fn name(&self) -> &str {
        super::SUMMARIZER
    }

    fn description(&self) -> &str {
        "Summarize long text into a shorter form"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text to summarize"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum summary length in words",
                    "default": 100
                },
                "style": {
                    "type": "string",
                    "enum": ["concise", "detailed", "bullet"],
                    "default": "concise"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        let max_length = args
            .get("max_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(100) as usize;
        let style = args
            .get("style")
            .and_then(|v| v.as_str())
            .unwrap_or("concise");

        let outcome = self.summarize(text, max_length, style).await?;
        serde_json::to_value(outcome).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::GenerationOptions;

    struct CannedLlm(String);

    #[async_trait]
    impl LLMClient for CannedLlm {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(self.0.clone())
        }
        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LLMClient for FailingLlm {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Err(AppError::Llm("model offline".to_string()))
        }
        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn summarizes_and_reports_compression() {
        let tool = SummarizerTool::new(Arc::new(CannedLlm("short summary".to_string())));
        let value = tool
            .execute(json!({"text": "a long enough body of text to summarize properly"}))
            .await
            .unwrap();
        let outcome: SummaryOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(outcome.summary, "short summary");
        assert!(outcome.success);
        assert!(outcome.compression_ratio > 0.0 && outcome.compression_ratio < 1.0);
    }

    #[tokio::test]
    async fn rejects_too_short_input() {
        let tool = SummarizerTool::new(Arc::new(CannedLlm("irrelevant".to_string())));
        let result = tool.execute(json!({"text": "tiny"})).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn surfaces_llm_failures() {
        let tool = SummarizerTool::new(Arc::new(FailingLlm));
        let result = tool
            .execute(json!({"text": "a long enough body of text to summarize"}))
            .await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
