//! LLM client abstractions and provider management.
//!
//! All providers implement [`LLMClient`], allowing the planner, summarizer,
//! and synthesizer to swap between providers (or test doubles) without
//! changing application code.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Per-request generation knobs. Unset fields use provider defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// System prompt prepended to the conversation.
    pub system: Option<String>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    pub fn with_system(system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            ..Default::default()
        }
    }
}

/// Generic LLM client trait for provider abstraction.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion for a prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Generate a structured JSON response.
    ///
    /// Appends a JSON-only instruction to the prompt, then extracts the
    /// first JSON object from the response (stripping markdown fencing).
    /// Errors when no parseable object is found.
    async fn generate_json(&self, prompt: &str, system: &str) -> Result<Value> {
        let json_prompt =
            format!("{prompt}\n\nRespond with valid JSON only, no markdown formatting.");
        let options = GenerationOptions::with_system(system);
        let response = self.generate(&json_prompt, &options).await?;
        extract_json(&response)
    }

    /// Model name/identifier served by this client.
    fn model_name(&self) -> &str;
}

/// Extract the first JSON object from an LLM response.
///
/// Markdown code fences are stripped first; failing a direct parse, the
/// first brace-delimited span is attempted.
pub fn extract_json(response: &str) -> Result<Value> {
    let fence = regex::Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("static regex");
    let candidate = match fence.captures(response) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(response),
        None => response,
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate.trim()) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Last resort: the widest brace-delimited span in the raw response.
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&response[start..=end]) {
                return Ok(value);
            }
        }
    }

    let preview: String = response.chars().take(200).collect();
    Err(AppError::Llm(format!(
        "Could not parse JSON from response: {preview}"
    )))
}

/// Provider enum for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Groq's hosted OpenAI-compatible endpoint.
    Groq { api_key: String, model: String },
    /// Any other OpenAI-compatible endpoint.
    OpenAICompatible {
        api_key: String,
        api_base: String,
        model: String,
    },
}

/// Retry policy applied to provider calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Provider {
    /// Create a client instance for this provider.
    pub fn create_client(&self, retry: RetryPolicy) -> Box<dyn LLMClient> {
        match self {
            Provider::Groq { api_key, model } => Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                "https://api.groq.com/openai/v1".to_string(),
                model.clone(),
                retry,
            )),
            Provider::OpenAICompatible {
                api_key,
                api_base,
                model,
            } => Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                retry,
            )),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq { .. } => "Groq",
            Provider::OpenAICompatible { .. } => "OpenAI-compatible",
        }
    }
}

/// Configuration-based client factory.
pub struct LLMClientFactory {
    default_provider: Provider,
    retry: RetryPolicy,
}

impl LLMClientFactory {
    pub fn new(default_provider: Provider, retry: RetryPolicy) -> Self {
        Self {
            default_provider,
            retry,
        }
    }

    /// Create a client using the default provider.
    pub fn create_default(&self) -> Box<dyn LLMClient> {
        self.default_provider.create_client(self.retry.clone())
    }

    /// Create a client using a specific provider.
    pub fn create_with_provider(&self, provider: Provider) -> Box<dyn LLMClient> {
        provider.create_client(self.retry.clone())
    }

    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}
