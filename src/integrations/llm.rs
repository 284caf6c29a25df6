//! Language-model seam used by the extractor.

use std::future::Future;

use crate::config::Config;
use crate::{Error, Result};

use super::{NimClient, OllamaClient};

/// Anything that turns a prompt into free-form text.
pub trait LanguageModel {
    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Run one completion for `prompt`.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Backend picked from configuration.
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// Hosted OpenAI-compatible endpoint (streaming)
    Remote(NimClient),
    /// Local model server
    Local(OllamaClient),
}

impl LlmBackend {
    /// Build the backend described by `config`.
    ///
    /// Remote mode requires a non-empty API key.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.local {
            let client = OllamaClient::with_url(&config.ollama_url)?
                .with_model(&config.local_model)
                .with_max_tokens(config.chunk_size as u32);
            return Ok(LlmBackend::Local(client));
        }

        let api_key = config.api_key.as_deref().unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = NimClient::with_base_url(api_key, &config.base_url)?
            .with_model(&config.model)
            .with_max_tokens(config.max_tokens);
        Ok(LlmBackend::Remote(client))
    }
}

impl LanguageModel for LlmBackend {
    fn name(&self) -> &'static str {
        match self {
            LlmBackend::Remote(client) => client.name(),
            LlmBackend::Local(client) => client.name(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            LlmBackend::Remote(client) => client.complete(prompt).await,
            LlmBackend::Local(client) => client.complete(prompt).await,
        }
    }
}
