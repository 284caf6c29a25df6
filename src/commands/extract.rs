//! `extract` command: turn text files into a saved knowledge graph.
//!
//! - Plain files are one document each; directories are walked recursively
//! - A JSONL file adds `{"text", "question"?, "answer"?}` records
//! - The store is written even when a document fails, so `--resume` can pick up
//! - Inputs already recorded in the store are skipped

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::integrations::{LanguageModel, LlmBackend};
use crate::kg::{DocKey, KgExtractor, KnowledgeStore};

/// File extensions picked up when walking a directory.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// One document to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Where the text came from (path or `file:line`)
    pub label: String,
    pub text: String,
    pub qa: Option<(String, String)>,
}

/// Options of the `extract` command.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub inputs: Vec<PathBuf>,
    pub jsonl: Option<PathBuf>,
    pub output: PathBuf,
    pub local: bool,
    pub chunk_size: Option<usize>,
    pub resume: bool,
}

/// What an extraction run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub documents: usize,
    /// Inputs found in the store already
    pub skipped: usize,
    pub triples: usize,
    pub keys: Vec<DocKey>,
}

#[derive(Debug, Deserialize)]
struct JsonlRecord {
    text: String,
    question: Option<String>,
    answer: Option<String>,
}

/// Collect documents from files, directories and an optional JSONL file.
pub fn collect_documents(inputs: &[PathBuf], jsonl: Option<&Path>) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        warn!("Skipping unreadable entry: {}", err);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| has_text_extension(path))
                .collect();
            files.sort();

            for path in files {
                if let Some(doc) = read_text_file(&path)? {
                    documents.push(doc);
                }
            }
        } else if let Some(doc) = read_text_file(input)? {
            documents.push(doc);
        }
    }

    if let Some(path) = jsonl {
        documents.extend(read_jsonl(path)?);
    }

    Ok(documents)
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_text_file(path: &Path) -> Result<Option<SourceDocument>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(SourceDocument {
            label: path.display().to_string(),
            text,
            qa: None,
        })),
        Err(_) => {
            warn!("Skipping non UTF-8 file {}", path.display());
            Ok(None)
        }
    }
}

/// Read `{"text", "question"?, "answer"?}` records, one per line.
pub fn read_jsonl(path: &Path) -> Result<Vec<SourceDocument>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut documents = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: JsonlRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), idx + 1))?;

        let qa = match (record.question, record.answer) {
            (Some(q), Some(a)) => Some((q, a)),
            (None, None) => None,
            _ => bail!(
                "{}:{}: question and answer must be given together",
                path.display(),
                idx + 1
            ),
        };

        documents.push(SourceDocument {
            label: format!("{}:{}", path.display(), idx + 1),
            text: record.text,
            qa,
        });
    }

    Ok(documents)
}

/// Feed documents to the extractor, saving the store to `output` at the end
/// or as soon as a document fails.
///
/// Each stored document is tagged with its label; documents whose label is
/// already tagged are skipped.
pub async fn ingest<L: LanguageModel>(
    kg: &mut KgExtractor<L>,
    documents: Vec<SourceDocument>,
    output: &Path,
) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();
    let total = documents.len();

    for (idx, doc) in documents.into_iter().enumerate() {
        if let Some(key) = kg.store().source_key(&doc.label) {
            info!(
                "[{}/{}] {} already stored as {}, skipping",
                idx + 1,
                total,
                doc.label,
                key
            );
            summary.skipped += 1;
            continue;
        }
        info!("[{}/{}] {}", idx + 1, total, doc.label);

        let key = match kg.add_document(&doc.text, doc.qa).await {
            Ok(key) => key,
            Err(err) => {
                kg.save_kg(output)
                    .with_context(|| format!("failed to save {}", output.display()))?;
                return Err(err).with_context(|| format!("extraction failed for {}", doc.label));
            }
        };

        kg.record_source(doc.label, &key);
        summary.triples += kg.store().get(&key).map(<[_]>::len).unwrap_or(0);
        summary.documents += 1;
        summary.keys.push(key);
    }

    kg.save_kg(output)
        .with_context(|| format!("failed to save {}", output.display()))?;
    Ok(summary)
}

/// Run the `extract` command with the configured backend.
pub async fn run(options: ExtractOptions) -> Result<ExtractSummary> {
    let mut config = Config::new();
    if options.local {
        config.local = true;
    }
    if let Some(size) = options.chunk_size {
        config.chunk_size = size.max(1);
    }

    let documents = collect_documents(&options.inputs, options.jsonl.as_deref())?;
    if documents.is_empty() {
        warn!("No documents found in the given inputs");
    }

    let mut kg = KgExtractor::from_config(&config)?;
    if let LlmBackend::Local(client) = kg.llm() {
        client.ensure_model().await?;
    }
    if options.resume && options.output.exists() {
        let store = KnowledgeStore::from_file(&options.output)
            .with_context(|| format!("failed to load {}", options.output.display()))?;
        info!("Resuming from {} ({} documents)", options.output.display(), store.len());
        kg = kg.with_store(store);
    }

    info!(
        "Extracting {} documents (chunk size {}, {} backend)",
        documents.len(),
        kg.chunk_size(),
        kg.llm().name()
    );

    ingest(&mut kg, documents, &options.output).await
}
