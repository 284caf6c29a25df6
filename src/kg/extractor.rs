//! Document ingestion: chunk → LLM → parse → store.

use std::path::Path;

use tracing::{debug, info};

use super::chunker::TextChunker;
use super::store::{DocKey, KnowledgeStore};
use super::triples::{parse_triples_detailed, Triple};
use crate::config::Config;
use crate::integrations::{LanguageModel, LlmBackend};
use crate::metrics;
use crate::prompts::{build_prompt, Prompt};
use crate::Result;

/// Builds a knowledge store by asking a language model for triples.
///
/// The model is an explicit collaborator, so any [`LanguageModel`] works,
/// including test doubles.
#[derive(Debug)]
pub struct KgExtractor<L> {
    llm: L,
    chunker: TextChunker,
    instruction: String,
    store: KnowledgeStore,
}

impl KgExtractor<LlmBackend> {
    /// Extractor wired to the backend described by `config`.
    ///
    /// Fails with [`crate::Error::MissingApiKey`] in remote mode without a key.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = LlmBackend::from_config(config)?;
        Ok(Self::new(llm, config.chunk_size).with_instruction(Prompt::TripleExtraction.load()))
    }
}

impl<L: LanguageModel> KgExtractor<L> {
    pub fn new(llm: L, chunk_size: usize) -> Self {
        Self {
            llm,
            chunker: TextChunker::new(chunk_size),
            instruction: Prompt::TripleExtraction.builtin().to_string(),
            store: KnowledgeStore::new(),
        }
    }

    /// Replace the instruction appended to every chunk.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Start from an existing store instead of an empty one.
    pub fn with_store(mut self, store: KnowledgeStore) -> Self {
        self.store = store;
        self
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub fn chunk_size(&self) -> usize {
        self.chunker.size()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn into_store(self) -> KnowledgeStore {
        self.store
    }

    /// Tag a stored document with the input it came from.
    pub fn record_source(&mut self, source: impl Into<String>, key: &DocKey) -> bool {
        self.store.record_source(source, key)
    }

    /// Ask the model for the raw triple listing of one chunk.
    pub async fn chunk_to_triples_str(&self, chunk: &str) -> Result<String> {
        let prompt = build_prompt(chunk, &self.instruction);
        let result = self.llm.complete(&prompt).await;
        metrics::record_llm_request(self.llm.name(), result.is_ok());
        result
    }

    /// Triples extracted from one chunk.
    pub async fn extract_chunk(&self, chunk: &str) -> Result<Vec<Triple>> {
        let output = self.chunk_to_triples_str(chunk).await?;
        let parsed = parse_triples_detailed(&output);

        metrics::record_parsed_lines(parsed.triples.len(), parsed.discarded);
        if parsed.discarded > 0 {
            debug!(
                discarded = parsed.discarded,
                accepted = parsed.triples.len(),
                "Dropped LLM output lines that are not triples"
            );
        }

        Ok(parsed.triples)
    }

    /// Extract triples from `text` and store them.
    ///
    /// With `qa` the document is keyed by that question/answer pair, which
    /// must be new; otherwise by the running document counter. The store is
    /// only touched once every chunk succeeded, and the counter advances
    /// for both key kinds.
    pub async fn add_document(
        &mut self,
        text: &str,
        qa: Option<(String, String)>,
    ) -> Result<DocKey> {
        let key = self.store.resolve_key(qa)?;
        let chunks = self.chunker.chunk(text);
        debug!(key = %key, chunks = chunks.len(), "Ingesting document");

        let mut triples = Vec::new();
        for chunk in &chunks {
            let found = self.extract_chunk(chunk.text).await?;
            debug!(
                key = %key,
                chunk = chunk.index,
                triples = found.len(),
                "Chunk processed"
            );
            triples.extend(found);
        }

        info!(
            key = %key,
            chunks = chunks.len(),
            triples = triples.len(),
            "Document added to knowledge graph"
        );
        self.store.commit(key.clone(), triples);
        Ok(key)
    }

    /// Persist the store.
    pub fn save_kg<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.store.save(path)
    }

    /// Replace the store with the one saved at `path`.
    pub fn load_kg<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.store.load(path)
    }
}
