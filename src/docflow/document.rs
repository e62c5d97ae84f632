// SPDX-License-Identifier: MIT

//! Document loading
//!
//! A run processes exactly one document, loaded before the graph starts.

use crate::adk::error::BoxError;
use std::fs;
use std::path::Path;

/// Loaded input document: its text plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    /// Provenance of the document, usually the path it was read from
    pub source: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// Loads a document from a path
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Document, BoxError>;
}

/// Reads a UTF-8 text file
#[derive(Debug, Default, Clone, Copy)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document, BoxError> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {}", path.display(), e))?;
        Ok(Document::new(content, path.to_string_lossy()))
    }
}

/// Strip surrounding whitespace and quotes from a path typed at a prompt
pub fn clean_input_path(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}
