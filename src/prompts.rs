//! Instruction prompts sent along with every chunk.
//!
//! A built-in text is always available; a Markdown file with the same name
//! under `prompts/` overrides it.

use std::path::PathBuf;

use crate::{Error, Result};

/// Instruction appended after each chunk.
pub const TRIPLE_EXTRACTION_PROMPT: &str = "Please convert the above text into a list of knowledge triples with the form ('entity', 'relation', 'entity'). Seperate each with a new line. Do not output anything else.";

/// Available prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Turn text into `('entity', 'relation', 'entity')` lines.
    TripleExtraction,
}

impl Prompt {
    /// Prompt file name (Markdown).
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::TripleExtraction => "triple_extraction.md",
        }
    }

    /// Built-in text.
    pub fn builtin(&self) -> &'static str {
        match self {
            Prompt::TripleExtraction => TRIPLE_EXTRACTION_PROMPT,
        }
    }

    /// File override if present, built-in text otherwise.
    pub fn load(&self) -> String {
        load_prompt(self.filename())
            .map(|text| text.trim().to_string())
            .ok()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.builtin().to_string())
    }
}

/// Compose the text sent to the model for one chunk.
pub fn build_prompt(chunk: &str, instruction: &str) -> String {
    format!("{}\n{}", chunk, instruction)
}

/// Load a prompt file by name.
pub fn load_prompt(filename: &str) -> Result<String> {
    let path = prompts_dir().join(filename);
    std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgument(format!("Failed to load prompt {}: {}", filename, e))
    })
}

/// Prompt directory.
pub fn prompts_dir() -> PathBuf {
    let candidates = [PathBuf::from("prompts"), PathBuf::from("../prompts")];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("prompts")
}
