//! LLM Client abstractions and provider management
//!
//! The research core only needs plain text completion: a templated instruction
//! goes in, text that should embed one JSON object comes back. This module
//! provides that transport for:
//! - **OpenAI-compatible** endpoints (OpenAI, OpenRouter, vLLM, ...)
//! - **Ollama**: local inference (feature `ollama`)

use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, so the decision policy can be
/// pointed at any backend without changing the orchestrator.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a single user prompt
    async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Generate with a system instruction followed by a user prompt
    async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend to constrain output to a JSON object when it supports it.
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 3000,
            json_mode: false,
        }
    }
}

impl CompletionOptions {
    /// Low-temperature JSON reply, used for planning and evaluation calls.
    pub fn structured(max_tokens: u32) -> Self {
        Self {
            temperature: 0.1,
            max_tokens,
            json_mode: true,
        }
    }

    /// Free-text reply for the final synthesis.
    pub fn prose(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            json_mode: false,
        }
    }
}

/// Provider enum for runtime selection
///
/// | Provider | Transport | JSON mode |
/// |----------|-----------|-----------|
/// | OpenAI | `async-openai` chat completions | `response_format` |
/// | Ollama | `ollama-rs` | `format: json` |
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI-compatible API provider (OpenAI, OpenRouter, Azure, vLLM)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://openrouter.ai/api/v1".to_string(),
    ///     model: "qwen/qwen-2.5-72b-instruct".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the provider's
    /// feature was compiled out.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(crate::types::AppError::Config(format!(
                "Ollama support not compiled in (requested model '{}'). \
                 Rebuild with `--features ollama` or use an OpenAI-compatible endpoint.",
                model
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model identifier configured for this provider
    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}
