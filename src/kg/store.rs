//! In-memory knowledge store with single-file persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::triples::Triple;
use crate::error::{Error, Result};

/// Identifier of one ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKey {
    /// Auto-incremented document counter
    Id(u64),
    /// Caller-supplied question/answer pair
    Qa { question: String, answer: String },
}

impl DocKey {
    pub fn qa(question: impl Into<String>, answer: impl Into<String>) -> Self {
        DocKey::Qa {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKey::Id(id) => write!(f, "#{}", id),
            DocKey::Qa { question, answer } => write!(f, "Q: {} | A: {}", question, answer),
        }
    }
}

/// Mapping from document key to the triples extracted from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeStore {
    documents: BTreeMap<DocKey, Vec<Triple>>,
    /// Input label (file path, `file:line`) → key it was stored under
    sources: BTreeMap<String, DocKey>,
    next_doc_id: u64,
}

/// Version written into saved stores.
pub const STORE_FORMAT: u32 = 1;

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    format: u32,
    next_doc_id: u64,
    documents: Vec<StoreEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sources: BTreeMap<String, DocKey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreEntry {
    key: DocKey,
    triples: Vec<Triple>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store previously written with [`KnowledgeStore::save`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of triples across all documents.
    pub fn triple_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    /// Value the next auto-assigned key will use.
    pub fn next_doc_id(&self) -> u64 {
        self.next_doc_id
    }

    pub fn contains_key(&self, key: &DocKey) -> bool {
        self.documents.contains_key(key)
    }

    pub fn get(&self, key: &DocKey) -> Option<&[Triple]> {
        self.documents.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DocKey> {
        self.documents.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocKey, &[Triple])> {
        self.documents.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Pick the key for the next document.
    ///
    /// A question/answer key must not be present yet; without one the
    /// current counter value is used.
    pub fn resolve_key(&self, qa: Option<(String, String)>) -> Result<DocKey> {
        match qa {
            Some((question, answer)) => {
                let key = DocKey::Qa { question, answer };
                if self.documents.contains_key(&key) {
                    return Err(Error::DuplicateKey(key));
                }
                Ok(key)
            }
            None => Ok(DocKey::Id(self.next_doc_id)),
        }
    }

    /// Remember that `source` was ingested as `key`.
    ///
    /// Ignored when `key` is not stored.
    pub fn record_source(&mut self, source: impl Into<String>, key: &DocKey) -> bool {
        if !self.documents.contains_key(key) {
            return false;
        }
        self.sources.insert(source.into(), key.clone());
        true
    }

    /// Key under which `source` was stored, if any.
    pub fn source_key(&self, source: &str) -> Option<&DocKey> {
        self.sources.get(source)
    }

    /// Store the triples of one finished document and advance the counter.
    pub fn commit(&mut self, key: DocKey, triples: Vec<Triple>) {
        debug!(key = %key, triples = triples.len(), "Committing document");
        self.documents.insert(key, triples);
        self.next_doc_id += 1;
    }

    /// Write the whole store to `path`, replacing the file.
    ///
    /// The blob goes to a sibling temp file first and is renamed over
    /// `path`, so a failed write leaves the previous store readable.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock_exclusive(&target, path)?;

        let result = self.write_replacing(path);
        let _ = FileExt::unlock(&target);
        result?;

        info!(
            path = %path.display(),
            documents = self.len(),
            triples = self.triple_count(),
            "Knowledge store saved"
        );
        Ok(())
    }

    fn write_replacing(&self, path: &Path) -> Result<()> {
        let blob = StoreFile {
            format: STORE_FORMAT,
            next_doc_id: self.next_doc_id,
            documents: self
                .documents
                .iter()
                .map(|(key, triples)| StoreEntry {
                    key: key.clone(),
                    triples: triples.clone(),
                })
                .collect(),
            sources: self.sources.clone(),
        };

        let tmp = temp_path(path);
        let written = File::create(&tmp).map_err(Error::from).and_then(|file| {
            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, &blob)?;
            writer.flush()?;
            drop(writer);
            file.sync_all()?;
            Ok(())
        });

        if let Err(err) = written.and_then(|_| fs::rename(&tmp, path).map_err(Error::from)) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        Ok(())
    }

    /// Replace the current content with the store saved at `path`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        file.try_lock_shared()
            .map_err(|_| Error::StoreLocked(path.display().to_string()))?;

        let blob: StoreFile = serde_json::from_reader(BufReader::new(&file))?;
        let _ = FileExt::unlock(&file);

        if blob.format != STORE_FORMAT {
            return Err(Error::SerializationError(format!(
                "{}: unsupported store format {}",
                path.display(),
                blob.format
            )));
        }

        self.documents = blob
            .documents
            .into_iter()
            .map(|entry| (entry.key, entry.triples))
            .collect();
        self.sources = blob.sources;
        self.next_doc_id = blob.next_doc_id;

        info!(
            path = %path.display(),
            documents = self.len(),
            triples = self.triple_count(),
            "Knowledge store loaded"
        );
        Ok(())
    }
}

/// `dir/.name.tmp` next to the target, so the rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn lock_exclusive(file: &File, path: &Path) -> Result<()> {
    file.try_lock_exclusive()
        .map_err(|_| Error::StoreLocked(path.display().to_string()))
}
