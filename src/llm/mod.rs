//! LLM Provider Clients
//!
//! The decision policy talks to a language model through the [`LLMClient`]
//! trait only. Two transports are provided:
//! - [`openai::OpenAIClient`] - any OpenAI-compatible `/chat/completions` endpoint
//! - `ollama::OllamaClient` - local Ollama server (feature `ollama`)
//!
//! # Example
//!
//! ```ignore
//! use juris::llm::{CompletionOptions, Provider};
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "qwen2.5:7b".to_string(),
//! }
//! .create_client()
//! .await?;
//!
//! let reply = client
//!     .generate_with_system("Reply in JSON.", "{\"ping\": true}", &CompletionOptions::structured(200))
//!     .await?;
//! ```

/// Core LLM client trait, completion options and provider selection.
pub mod client;
/// OpenAI-compatible HTTP transport.
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{CompletionOptions, LLMClient, Provider};
