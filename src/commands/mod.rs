//! Command implementations
//!
//! Each module corresponds to a subcommand of the `txt2kg` CLI.

pub mod extract;
pub mod graph;
pub mod show;

pub use extract::{
    collect_documents, ingest, read_jsonl, run as extract_run, ExtractOptions, ExtractSummary,
    SourceDocument,
};
