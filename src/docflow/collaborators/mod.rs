// SPDX-License-Identifier: MIT

//! External collaborators invoked by workflow steps
//!
//! Each trait is a narrow contract; the engine only sees these traits, so
//! tests swap in doubles and the binary wires in the real clients:
//! - [classifier] - model-backed document classification
//! - [transformer] - model-backed type-specific rewriting
//! - [persister] - durable output files
//! - [notifier] - best-effort delivery of the persisted artifact
//! - [reviewer] - the human decision at the review node

pub mod classifier;
pub mod notifier;
pub mod persister;
pub mod reviewer;
pub mod transformer;

pub use classifier::{classify_label, LlmClassifier};
pub use notifier::{LogNotifier, WebhookNotifier};
pub use persister::{derive_artifact_name, FilePersister};
pub use reviewer::ConsoleReviewer;
pub use transformer::LlmTransformer;

use crate::adk::error::BoxError;
use crate::docflow::workflow::state::DocumentType;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Produces a free-text label for a document prefix
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text_prefix: &str) -> Result<String, BoxError>;
}

/// Rewrites a document according to its kind
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, kind: DocumentType, full_text: &str) -> Result<String, BoxError>;
}

/// Stores processed content; must never overwrite an existing artifact
#[async_trait]
pub trait Persister: Send + Sync {
    async fn persist(&self, content: &str, derived_name: &str) -> Result<PathBuf, BoxError>;
}

/// What the notifier knows about the finished run
#[derive(Debug, Clone)]
pub struct Delivery<'a> {
    pub artifact: &'a Path,
    pub document_type: Option<DocumentType>,
    pub content_preview: &'a str,
}

/// Delivers the persisted artifact to someone
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, delivery: Delivery<'_>) -> Result<(), BoxError>;
}

/// Human verdict on the processed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected { feedback: String },
}

/// Blocking source of human decisions
pub trait Reviewer: Send + Sync {
    fn review(&self, preview: &str) -> Result<ReviewDecision, BoxError>;
}
