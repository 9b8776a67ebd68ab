//! OpenAI-compatible chat completion client.
//!
//! Works against any endpoint speaking the OpenAI chat API, including
//! Groq's hosted models. Transient API failures are retried with
//! exponential backoff before being surfaced as [`AppError::Llm`].

use crate::llm::client::{GenerationOptions, LLMClient, RetryPolicy};
use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    retry: RetryPolicy,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, retry: RetryPolicy) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            retry,
        }
    }

    fn build_messages(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Vec<ChatCompletionRequestMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(system.clone()),
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(prompt.to_string()),
        ));
        messages
    }

    async fn complete_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(self.build_messages(prompt, options));
        if let Some(max_tokens) = options.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            builder.temperature(temperature);
        }
        let request = builder
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::Llm(format!("Chat completion error: {e}")))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Llm("Empty completion response".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.complete_once(prompt, options).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        return Err(err);
                    }
                    // Exponential backoff: base, 2x, 4x, ...
                    let delay = self
                        .retry
                        .base_delay_ms
                        .saturating_mul(1u64 << (attempt - 1).min(16));
                    tracing::warn!(
                        model = %self.model,
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms = delay,
                        "LLM call failed, retrying: {err}"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
