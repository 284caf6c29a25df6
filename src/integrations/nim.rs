//! Streaming client for OpenAI-compatible chat endpoints (NVIDIA NIM by default).

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};
use futures::StreamExt;
use tracing::debug;

use super::llm::LanguageModel;
use crate::{Error, Result};

pub const NIM_API_URL: &str = "https://integrate.api.nvidia.com/v1";
pub const NIM_DEFAULT_MODEL: &str = "nvidia/llama-3.1-nemotron-70b-instruct";
pub const NIM_MAX_TOKENS: u32 = 1024;

/// Remote chat-completion client.
#[derive(Debug, Clone)]
pub struct NimClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl NimClient {
    /// Create client for the hosted NIM endpoint.
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        Self::with_base_url(api_key, NIM_API_URL)
    }

    /// Create client for any OpenAI-compatible endpoint.
    pub fn with_base_url<S: Into<String>>(api_key: S, base_url: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let config = OpenAIConfig::new()
            .with_api_base(base_url.trim_end_matches('/'))
            .with_api_key(api_key);

        Ok(Self {
            client: Client::with_config(config),
            model: NIM_DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: NIM_MAX_TOKENS,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Stream one completion and concatenate the content deltas of the first choice.
    #[allow(deprecated)] // NIM still expects `max_tokens`
    pub async fn stream_completion(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            max_tokens: Some(self.max_tokens),
            stream: Some(true),
            ..Default::default()
        };

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| Error::LlmError(e.to_string()))?;

        let mut out = String::new();
        let mut fragments = 0usize;
        while let Some(event) = stream.next().await {
            let response = event.map_err(|e| Error::LlmError(e.to_string()))?;
            if let Some(content) = response
                .choices
                .first()
                .and_then(|choice| choice.delta.content.as_deref())
            {
                out.push_str(content);
                fragments += 1;
            }
        }

        debug!(model = %self.model, fragments, chars = out.len(), "Completion streamed");
        Ok(out)
    }
}

impl LanguageModel for NimClient {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.stream_completion(prompt).await
    }
}
