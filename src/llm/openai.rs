//! OpenAI-compatible chat completions over `async-openai`.

use crate::llm::client::{CompletionOptions, LLMClient};
use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/');
        if api_base.is_empty() {
            return Err(AppError::Config("OpenAI api_base is empty".to_string()));
        }
        let config = OpenAIConfig::new().with_api_key(api_key).with_api_base(api_base);

        Ok(Self {
            client: Client::with_config(config),
            model,
        })
    }

    async fn chat(&self, messages: Vec<ChatCompletionRequestMessage>, options: &CompletionOptions) -> Result<String> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(options.temperature)
            .max_completion_tokens(options.max_tokens);
        if options.json_mode {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))?;

        let response = self.client.chat().create(request).await.map_err(|e| match e {
            OpenAIError::ApiError(api) => AppError::LLM(format!("OpenAI API error: {}", api)),
            other => AppError::LLM(format!("Completion request failed: {}", other)),
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::LLM("No content in completion response".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.chat(
            vec![ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                prompt.to_string(),
            ))],
            options,
        )
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
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(system.to_string())),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(prompt.to_string())),
            ],
            options,
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
