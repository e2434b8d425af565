use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};

use super::GenerationError;
use super::secrets::ApiKey;

const OPENAI_COMPAT_PATH: &str = "/v1beta/openai";

/// Vendor client strategy: the OpenAI-compatible surface of the Gemini API,
/// driven through `async-openai`.
pub struct ManagedBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ManagedBackend {
    pub fn new(api_key: &ApiKey, host: &str, model: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose())
            .with_api_base(format!(
                "{}{}",
                host.trim_end_matches('/'),
                OPENAI_COMPAT_PATH
            ));
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(backend_error)?
            .into();
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(temperature)
            .messages(vec![message])
            .build()
            .map_err(backend_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(backend_error)?;

        let text = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Shape("no text output returned from model".into()))?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GenerationError::Shape("model returned empty text".into()));
        }
        Ok(trimmed.to_string())
    }
}

fn backend_error(err: OpenAIError) -> GenerationError {
    GenerationError::Backend(err.to_string())
}
