//! Ollama client for local LLM inference.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::llm::LanguageModel;
use crate::kg::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};

pub const OLLAMA_URL: &str = "http://localhost:11434";
/// 14B-class instruction model; smaller models produce unusable triples.
pub const OLLAMA_DEFAULT_MODEL: &str = "qwen2.5:14b";

/// Ollama client for a locally hosted model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OllamaClient {
    /// Create new client with default URL.
    pub fn new() -> Result<Self> {
        Self::with_url(OLLAMA_URL)
    }

    /// Create client with custom URL.
    pub fn with_url(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| local_error("HTTP client error", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: OLLAMA_DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_CHUNK_SIZE as u32,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Cap on generated tokens per prompt.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Check if Ollama server is running.
    pub async fn is_running(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// List available models.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| local_error("request failed", e))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| local_error("invalid response", e))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Fail fast when the server is down or the configured model is not pulled.
    pub async fn ensure_model(&self) -> Result<()> {
        if !self.is_running().await {
            return Err(local_error(
                "server not reachable",
                format!("{} (is `ollama serve` running?)", self.base_url),
            ));
        }

        let models = self.list_models().await?;
        let tagged = format!("{}:latest", self.model);
        if !models.iter().any(|m| *m == self.model || *m == tagged) {
            return Err(local_error(
                "model not available",
                format!(
                    "{} on {} (try `ollama pull {}`)",
                    self.model, self.base_url, self.model
                ),
            ));
        }

        debug!(model = %self.model, url = %self.base_url, "Local model ready");
        Ok(())
    }

    /// Generate text for a single prompt.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            system: system.map(|s| s.to_string()),
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| local_error("request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(local_error(&status.to_string(), text));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| local_error("invalid response", e))?;

        Ok(result.response)
    }

    /// Run a list of prompts one after another, returning one output per prompt.
    pub async fn inference(&self, questions: &[String], max_tokens: u32) -> Result<Vec<String>> {
        let mut outputs = Vec::with_capacity(questions.len());
        for question in questions {
            outputs.push(self.generate(question, None, 0.0, max_tokens).await?);
        }
        debug!(model = %self.model, prompts = questions.len(), "Local inference done");
        Ok(outputs)
    }
}

impl LanguageModel for OllamaClient {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let outputs = self
            .inference(&[prompt.to_string()], self.max_tokens)
            .await?;
        Ok(outputs.into_iter().next().unwrap_or_default())
    }
}

fn local_error(context: &str, detail: impl std::fmt::Display) -> Error {
    Error::LocalModelError(format!("Ollama {}: {}", context, detail))
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::with_url(&server.base_url())
            .expect("client")
            .with_model("llama3")
    }

    #[test]
    fn defaults() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.model(), OLLAMA_DEFAULT_MODEL);
        assert_eq!(client.max_tokens(), 512);
    }

    #[tokio::test]
    async fn list_models_returns_names() {
        let server = MockServer::start_async().await;

        let tags_mock = server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [
                    { "name": "llama3" },
                    { "name": "mistral" }
                ]
            }));
        });

        let models = client(&server).list_models().await.unwrap();

        assert_eq!(models, vec!["llama3".to_string(), "mistral".to_string()]);
        tags_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_reports_error_on_http_failure() {
        let server = MockServer::start_async().await;

        let gen_mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("boom");
        });

        let err = client(&server)
            .generate("hi", None, 0.2, 64)
            .await
            .unwrap_err();

        let msg = format!("{err}");
        assert!(msg.contains("Ollama 500"));
        assert!(msg.contains("boom"));
        gen_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn complete_bounds_generation_by_max_tokens() {
        let server = MockServer::start_async().await;

        let generate_mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate").is_true(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body().as_ref()).unwrap_or_default();
                body["options"]["num_predict"] == json!(128)
                    && body["model"] == json!("llama3")
                    && body["stream"] == json!(false)
                    && body.get("system").is_none()
            });
            then.status(200)
                .json_body(json!({ "response": "('a', 'b', 'c')" }));
        });

        let reply = client(&server)
            .with_max_tokens(128)
            .complete("chunk")
            .await
            .unwrap();

        assert_eq!(reply, "('a', 'b', 'c')");
        generate_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn inference_returns_one_output_per_prompt() {
        let server = MockServer::start_async().await;

        let generate_mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({ "response": "out" }));
        });

        let outputs = client(&server)
            .inference(&["one".to_string(), "two".to_string()], 32)
            .await
            .unwrap();

        assert_eq!(outputs, vec!["out".to_string(), "out".to_string()]);
        generate_mock.assert_calls(2);
    }

    #[tokio::test]
    async fn ensure_model_accepts_latest_tag() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [{ "name": "llama3:latest" }]
            }));
        });

        client(&server).ensure_model().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_model_rejects_missing_model() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [{ "name": "mistral:7b" }]
            }));
        });

        let err = client(&server).ensure_model().await.unwrap_err();

        assert!(matches!(err, Error::LocalModelError(_)));
        assert!(err.to_string().contains("ollama pull llama3"));
    }

    #[tokio::test]
    async fn ensure_model_names_unreachable_server() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(503);
        });

        let err = client(&server).ensure_model().await.unwrap_err();

        assert!(err.to_string().contains(&server.base_url()));
    }

    #[tokio::test]
    async fn is_running_respects_http_status() {
        let healthy = MockServer::start_async().await;
        healthy.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200);
        });

        let failing = MockServer::start_async().await;
        failing.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(503);
        });

        assert!(client(&healthy).is_running().await);
        assert!(!client(&failing).is_running().await);
    }
}
