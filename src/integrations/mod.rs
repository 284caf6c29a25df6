//! LLM collaborators.
//!
//! Provides clients for:
//! - OpenAI-compatible hosted endpoints (NVIDIA NIM), streaming
//! - Ollama (local LLM)

pub mod llm;
pub mod nim;
pub mod ollama;

pub use llm::{LanguageModel, LlmBackend};
pub use nim::NimClient;
pub use ollama::OllamaClient;
