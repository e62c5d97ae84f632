// SPDX-License-Identifier: MIT

//! Document pipeline wiring and the run-level entry point

use super::graph::{GraphBuilder, GraphEngine, RunEvent, RunOutcome, END};
use super::progress::ProgressSink;
use super::state::{DocumentType, WorkflowState};
use super::steps::{
    nodes, ClassifyStep, FeedbackRoute, FeedbackRouter, NotifyStep, PersistStep, RestartStep,
    ReviewStep, StepSettings, TransformStep, TypeRouter,
};
use crate::adk::error::{DocflowError, WorkflowError};
use crate::docflow::collaborators::{Classifier, Notifier, Persister, Reviewer, Transformer};
use crate::docflow::document::DocumentLoader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything the graph calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub transformer: Arc<dyn Transformer>,
    pub persister: Arc<dyn Persister>,
    pub notifier: Arc<dyn Notifier>,
    pub reviewer: Arc<dyn Reviewer>,
}

/// Build the classify → transform → review → persist → notify graph
///
/// Rejection at review routes through `restart` back to `classify`.
pub fn build_document_graph(
    collaborators: Collaborators,
    settings: StepSettings,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
) -> Result<GraphEngine, WorkflowError> {
    let transform = |kind| Arc::new(TransformStep::new(kind, collaborators.transformer.clone()));

    GraphBuilder::new()
        .add_node(
            nodes::CLASSIFY,
            Arc::new(ClassifyStep::new(
                collaborators.classifier.clone(),
                settings.classify_prefix_chars,
            )),
        )
        .add_node(nodes::TRANSFORM_REPORT, transform(DocumentType::Report))
        .add_node(nodes::TRANSFORM_FORM, transform(DocumentType::Form))
        .add_node(nodes::TRANSFORM_DRAFT, transform(DocumentType::Draft))
        .add_node(
            nodes::REVIEW,
            Arc::new(ReviewStep::new(
                collaborators.reviewer.clone(),
                settings.review_preview_chars,
            )),
        )
        .add_node(
            nodes::PERSIST,
            Arc::new(PersistStep::new(collaborators.persister.clone())),
        )
        .add_node(
            nodes::NOTIFY,
            Arc::new(NotifyStep::new(
                collaborators.notifier.clone(),
                settings.notify_preview_chars,
            )),
        )
        .add_node(nodes::RESTART, Arc::new(RestartStep))
        .add_conditional_edges(
            nodes::CLASSIFY,
            TypeRouter,
            [
                (DocumentType::Report, nodes::TRANSFORM_REPORT),
                (DocumentType::Form, nodes::TRANSFORM_FORM),
                (DocumentType::Draft, nodes::TRANSFORM_DRAFT),
            ],
        )
        .add_edge(nodes::TRANSFORM_REPORT, nodes::REVIEW)
        .add_edge(nodes::TRANSFORM_FORM, nodes::REVIEW)
        .add_edge(nodes::TRANSFORM_DRAFT, nodes::REVIEW)
        .add_conditional_edges(
            nodes::REVIEW,
            FeedbackRouter,
            [
                (FeedbackRoute::Save, nodes::PERSIST),
                (FeedbackRoute::Restart, nodes::RESTART),
            ],
        )
        .add_edge(nodes::PERSIST, nodes::NOTIFY)
        .add_edge(nodes::NOTIFY, END)
        .add_edge(nodes::RESTART, nodes::CLASSIFY)
        .set_entry_point(nodes::CLASSIFY)
        .with_progress_sink(sink)
        .with_progress_interval(interval)
        .compile()
}

/// Load `path`, run the graph over it and stream node visits to `tx`
pub async fn process_document(
    path: &Path,
    loader: &dyn DocumentLoader,
    engine: &GraphEngine,
    tx: mpsc::Sender<RunEvent>,
) -> Result<RunOutcome, DocflowError> {
    let document = loader.load(path)?;
    log::info!(
        "Loaded '{}' ({} chars)",
        document.source,
        document.content.chars().count()
    );

    let outcome = engine.run_stream(WorkflowState::new(document), tx).await?;
    Ok(outcome)
}
