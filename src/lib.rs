//! Text to Knowledge Graph
//!
//! This library provides tools to:
//! - Split free text into fixed-size character chunks
//! - Ask an LLM (hosted OpenAI-compatible endpoint or local Ollama) for
//!   `('entity', 'relation', 'entity')` triples per chunk
//! - Keep the triples per document in a persistent knowledge store
//! - Flatten a store into an edge-list graph

pub mod config;
pub mod error;
pub mod integrations;
pub mod kg;
pub mod metrics;
pub mod prompts;

// Re-export common types
pub use config::Config;
pub use error::{Error, Result};
pub use integrations::{LanguageModel, LlmBackend, NimClient, OllamaClient};
pub use kg::{DocKey, GraphData, KgExtractor, KnowledgeStore, TextChunker, Triple, TripleGraph};
pub use prompts::{build_prompt, load_prompt, Prompt};

pub mod commands;
