//! `show` command: print the documents of a saved knowledge graph.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::kg::KnowledgeStore;

/// Render up to `limit` documents with their triples.
pub fn render(store: &KnowledgeStore, limit: Option<usize>) -> String {
    let mut out = String::new();
    let shown = limit.unwrap_or(usize::MAX);

    for (key, triples) in store.iter().take(shown) {
        let _ = writeln!(out, "{} ({} triples)", key, triples.len());
        for triple in triples {
            let _ = writeln!(out, "  {}", triple);
        }
    }

    let hidden = store.len().saturating_sub(shown);
    if hidden > 0 {
        let _ = writeln!(out, "... {} more documents", hidden);
    }
    let _ = writeln!(
        out,
        "{} documents, {} triples",
        store.len(),
        store.triple_count()
    );
    out
}

pub fn run(kg: &Path, limit: Option<usize>) -> Result<()> {
    let store = KnowledgeStore::from_file(kg)
        .with_context(|| format!("failed to load {}", kg.display()))?;
    print!("{}", render(&store, limit));
    Ok(())
}
