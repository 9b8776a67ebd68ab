//! LLM provider clients and abstractions.
//!
//! The [`LLMClient`] trait is the single seam between the agent and any
//! OpenAI-compatible chat completion endpoint. The default provider is
//! Groq's hosted endpoint; any compatible base URL works.

/// Client trait, generation options, and provider selection.
pub mod client;
/// OpenAI-compatible client implementation (Groq included).
pub mod openai;

pub use client::{GenerationOptions, LLMClient, LLMClientFactory, Provider, extract_json};
pub use openai::OpenAIClient;
