// SPDX-License-Identifier: MIT

//! Run state threaded through every step of the document graph

use crate::docflow::document::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of document decided by classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Report,
    Form,
    Draft,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Report => "report",
            DocumentType::Form => "form",
            DocumentType::Draft => "draft",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the best-effort notify step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    /// No artifact to attach
    Skipped,
    Failed(String),
}

/// Mutable record owned by the engine for the duration of one run
#[derive(Debug, Clone)]
pub struct WorkflowState {
    document: Document,
    /// `None` until classification runs
    pub document_type: Option<DocumentType>,
    pub processed_content: String,
    /// Present only when the reviewer rejected the result
    pub human_feedback: Option<String>,
    /// `None` = unknown, resolved by the review step
    pub human_satisfied: Option<bool>,
    pub output_location: Option<PathBuf>,
    pub notification: NotificationStatus,
    /// Number of restart traversals so far
    pub restarts: u32,
}

impl WorkflowState {
    /// Create the initial state for a freshly loaded document
    pub fn new(document: Document) -> Self {
        Self {
            document,
            document_type: None,
            processed_content: String::new(),
            human_feedback: None,
            human_satisfied: None,
            output_location: None,
            notification: NotificationStatus::Pending,
            restarts: 0,
        }
    }

    /// The input document; fixed for the whole run
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Clear review-cycle fields before looping back to classification
    pub fn reset_for_restart(&mut self) {
        self.processed_content.clear();
        self.human_feedback = None;
        self.human_satisfied = None;
        self.restarts += 1;
    }
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
