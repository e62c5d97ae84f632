// SPDX-License-Identifier: MIT

//! Steps and routers of the document graph
//!
//! Every step makes at most one collaborator call and otherwise only
//! reads and writes `WorkflowState`.

use crate::adk::error::{NotificationError, WorkflowError};
use crate::docflow::collaborators::{
    classify_label, derive_artifact_name, Classifier, Delivery, Notifier, Persister,
    ReviewDecision, Reviewer, Transformer,
};
use crate::docflow::workflow::graph::{RouteLabel, Router, Step};
use crate::docflow::workflow::state::{char_prefix, DocumentType, NotificationStatus, WorkflowState};
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

/// Node identifiers of the document graph
pub mod nodes {
    pub const CLASSIFY: &str = "classify";
    pub const TRANSFORM_REPORT: &str = "transform-report";
    pub const TRANSFORM_FORM: &str = "transform-form";
    pub const TRANSFORM_DRAFT: &str = "transform-draft";
    pub const REVIEW: &str = "review";
    pub const PERSIST: &str = "persist";
    pub const NOTIFY: &str = "notify";
    pub const RESTART: &str = "restart";
}

/// Character budgets for text handed to collaborators
#[derive(Debug, Clone, Copy)]
pub struct StepSettings {
    pub classify_prefix_chars: usize,
    pub review_preview_chars: usize,
    pub notify_preview_chars: usize,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            classify_prefix_chars: 1000,
            review_preview_chars: 800,
            notify_preview_chars: 500,
        }
    }
}

/// Sets `document_type` from a prefix of the document
pub struct ClassifyStep {
    classifier: Arc<dyn Classifier>,
    prefix_chars: usize,
}

impl ClassifyStep {
    pub fn new(classifier: Arc<dyn Classifier>, prefix_chars: usize) -> Self {
        Self {
            classifier,
            prefix_chars,
        }
    }
}

#[async_trait]
impl Step for ClassifyStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let prefix = char_prefix(&state.document().content, self.prefix_chars);
        let answer = self
            .classifier
            .classify(prefix)
            .await
            .map_err(|e| WorkflowError::collaborator(nodes::CLASSIFY, e))?;

        let kind = classify_label(&answer);
        log::info!("Document classified as {}", kind);
        state.document_type = Some(kind);
        Ok(())
    }
}

/// Writes the transformed document into `processed_content`
pub struct TransformStep {
    kind: DocumentType,
    transformer: Arc<dyn Transformer>,
}

impl TransformStep {
    pub fn new(kind: DocumentType, transformer: Arc<dyn Transformer>) -> Self {
        Self { kind, transformer }
    }

    pub fn node_id(kind: DocumentType) -> &'static str {
        match kind {
            DocumentType::Report => nodes::TRANSFORM_REPORT,
            DocumentType::Form => nodes::TRANSFORM_FORM,
            DocumentType::Draft => nodes::TRANSFORM_DRAFT,
        }
    }
}

#[async_trait]
impl Step for TransformStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let node = Self::node_id(self.kind);
        if state.document_type.is_none() {
            return Err(WorkflowError::Unclassified(node.to_string()));
        }

        let output = self
            .transformer
            .transform(self.kind, &state.document().content)
            .await
            .map_err(|e| WorkflowError::collaborator(node, e))?;
        state.processed_content = output;
        Ok(())
    }
}

/// Blocks on the human reviewer
pub struct ReviewStep {
    reviewer: Arc<dyn Reviewer>,
    preview_chars: usize,
}

impl ReviewStep {
    pub fn new(reviewer: Arc<dyn Reviewer>, preview_chars: usize) -> Self {
        Self {
            reviewer,
            preview_chars,
        }
    }
}

#[async_trait]
impl Step for ReviewStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let preview = char_prefix(&state.processed_content, self.preview_chars).to_string();
        let reviewer = self.reviewer.clone();

        let decision = tokio::task::spawn_blocking(move || reviewer.review(&preview))
            .await
            .map_err(|e| WorkflowError::InputUnavailable(e.to_string()))?
            .map_err(|e| WorkflowError::InputUnavailable(e.to_string()))?;

        match decision {
            ReviewDecision::Approved => {
                state.human_satisfied = Some(true);
            }
            ReviewDecision::Rejected { feedback } => {
                log::info!("Reviewer rejected the result: {}", feedback);
                state.human_satisfied = Some(false);
                state.human_feedback = Some(feedback);
            }
        }
        Ok(())
    }

    fn shows_progress(&self) -> bool {
        false
    }
}

/// Stores `processed_content` and records where it went
pub struct PersistStep {
    persister: Arc<dyn Persister>,
}

impl PersistStep {
    pub fn new(persister: Arc<dyn Persister>) -> Self {
        Self { persister }
    }
}

#[async_trait]
impl Step for PersistStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let name = derive_artifact_name(&state.document().source, Local::now());
        let location = self
            .persister
            .persist(&state.processed_content, &name)
            .await
            .map_err(|e| WorkflowError::collaborator(nodes::PERSIST, e))?;
        state.output_location = Some(location);
        Ok(())
    }
}

/// Best-effort delivery; failures are logged and recorded, never raised
pub struct NotifyStep {
    notifier: Arc<dyn Notifier>,
    preview_chars: usize,
}

impl NotifyStep {
    pub fn new(notifier: Arc<dyn Notifier>, preview_chars: usize) -> Self {
        Self {
            notifier,
            preview_chars,
        }
    }
}

#[async_trait]
impl Step for NotifyStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let Some(artifact) = state.output_location.as_deref() else {
            log::warn!("No output file, skipping notification");
            state.notification = NotificationStatus::Skipped;
            return Ok(());
        };

        let delivery = Delivery {
            artifact,
            document_type: state.document_type,
            content_preview: char_prefix(&state.processed_content, self.preview_chars),
        };

        let status = match self.notifier.notify(delivery).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                let err = NotificationError(e.to_string());
                log::warn!("{}", err);
                NotificationStatus::Failed(err.0)
            }
        };
        state.notification = status;
        Ok(())
    }
}

/// Clears the review cycle before looping back to classification
pub struct RestartStep;

#[async_trait]
impl Step for RestartStep {
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        log::info!("Restarting process with feedback");
        state.reset_for_restart();
        Ok(())
    }
}

impl RouteLabel for DocumentType {
    const ALL: &'static [Self] = &[DocumentType::Report, DocumentType::Form, DocumentType::Draft];

    fn as_str(&self) -> &'static str {
        DocumentType::as_str(*self)
    }
}

/// Picks the transform node for the classified type
pub struct TypeRouter;

impl Router for TypeRouter {
    type Label = DocumentType;

    fn route(&self, state: &WorkflowState) -> Result<DocumentType, WorkflowError> {
        state
            .document_type
            .ok_or_else(|| WorkflowError::Unclassified(nodes::CLASSIFY.to_string()))
    }
}

/// Labels leaving the review node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackRoute {
    Save,
    Restart,
}

impl RouteLabel for FeedbackRoute {
    const ALL: &'static [Self] = &[FeedbackRoute::Save, FeedbackRoute::Restart];

    fn as_str(&self) -> &'static str {
        match self {
            FeedbackRoute::Save => "save",
            FeedbackRoute::Restart => "restart",
        }
    }
}

/// `Save` only on explicit approval
pub struct FeedbackRouter;

impl Router for FeedbackRouter {
    type Label = FeedbackRoute;

    fn route(&self, state: &WorkflowState) -> Result<FeedbackRoute, WorkflowError> {
        match state.human_satisfied {
            Some(true) => Ok(FeedbackRoute::Save),
            Some(false) => Ok(FeedbackRoute::Restart),
            None => {
                log::warn!("Review decision unresolved, restarting");
                Ok(FeedbackRoute::Restart)
            }
        }
    }
}
