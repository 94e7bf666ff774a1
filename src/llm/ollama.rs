use crate::llm::client::{CompletionOptions, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::{
        chat::{ChatMessage, request::ChatMessageRequest},
        parameters::FormatType,
    },
    models::ModelOptions,
};

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

const DEFAULT_PORT: u16 = 11434;

impl OllamaClient {
    /// `base_url` may omit the port; Ollama's default is assumed then.
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let url = reqwest::Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| AppError::Config(format!("invalid Ollama URL {}: {}", base_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| AppError::Config(format!("Ollama URL has no host: {}", base_url)))?;
        let port = url.port().unwrap_or(DEFAULT_PORT);

        let client = Ollama::new(format!("{}://{}", url.scheme(), host), port);

        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>, options: &CompletionOptions) -> Result<String> {
        let model_options = ModelOptions::default()
            .temperature(options.temperature)
            .num_predict(options.max_tokens as i32);

        let mut request = ChatMessageRequest::new(self.model.clone(), messages).options(model_options);
        if options.json_mode {
            request = request.format(FormatType::Json);
        }

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())], options)
            .await
    }

    async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String> {
        self.chat(
            vec![
                ChatMessage::system(system.to_string()),
                ChatMessage::user(prompt.to_string()),
            ],
            options,
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
