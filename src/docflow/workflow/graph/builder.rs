// SPDX-License-Identifier: MIT

//! Graph builder - assembles and validates a workflow graph
//!
//! All topology checks happen in `compile`, so a compiled `GraphEngine`
//! never meets an unknown node or an uncovered router label at run time.

use super::executor::GraphEngine;
use super::types::{Edge, Router, RouterBranch, Step, END};
use crate::adk::error::WorkflowError;
use crate::docflow::workflow::progress::{LogSink, ProgressSink, DEFAULT_INTERVAL};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Incrementally describes nodes and edges, then compiles them
pub struct GraphBuilder {
    nodes: HashMap<String, Arc<dyn Step>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
    errors: Vec<String>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            errors: Vec::new(),
            sink: Arc::new(LogSink),
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn add_node(mut self, id: &str, step: Arc<dyn Step>) -> Self {
        if id == END {
            self.errors.push(format!("'{}' is reserved", END));
        } else if self.nodes.insert(id.to_string(), step).is_some() {
            self.errors.push(format!("node '{}' added twice", id));
        }
        self
    }

    pub fn add_edge(self, from: &str, to: &str) -> Self {
        self.insert_edge(from, Edge::Fixed(to.to_string()))
    }

    /// Route from `from` with `router`; `table` maps each label to a node
    pub fn add_conditional_edges<R, I>(self, from: &str, router: R, table: I) -> Self
    where
        R: Router + 'static,
        I: IntoIterator<Item = (R::Label, &'static str)>,
    {
        let table: HashMap<R::Label, String> = table
            .into_iter()
            .map(|(label, to)| (label, to.to_string()))
            .collect();
        self.insert_edge(from, Edge::Conditional(Box::new(RouterBranch { router, table })))
    }

    pub fn set_entry_point(mut self, id: &str) -> Self {
        self.entry = Some(id.to_string());
        self
    }

    /// Where overlay observations go
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    fn insert_edge(mut self, from: &str, edge: Edge) -> Self {
        if self.edges.insert(from.to_string(), edge).is_some() {
            self.errors
                .push(format!("node '{}' has more than one outgoing edge", from));
        }
        self
    }

    /// Validate the topology and produce an executable engine
    pub fn compile(self) -> Result<GraphEngine, WorkflowError> {
        let mut errors = self.errors;

        let entry = match self.entry {
            Some(entry) if self.nodes.contains_key(&entry) => entry,
            Some(entry) => {
                errors.push(format!("entry point '{}' is not a node", entry));
                entry
            }
            None => {
                errors.push("no entry point set".to_string());
                String::new()
            }
        };

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                errors.push(format!("edge starts at unknown node '{}'", from));
            }
            for to in edge.targets() {
                if to != END && !self.nodes.contains_key(to) {
                    errors.push(format!("edge '{}' -> '{}' targets unknown node", from, to));
                }
            }
            if let Edge::Conditional(branch) = edge {
                for label in branch.missing_labels() {
                    errors.push(format!("node '{}' has no edge for label '{}'", from, label));
                }
            }
        }

        for id in self.nodes.keys() {
            if !self.edges.contains_key(id) {
                errors.push(format!("node '{}' has no outgoing edge", id));
            }
        }

        if !errors.is_empty() {
            errors.sort();
            return Err(WorkflowError::InvalidGraph(errors.join("; ")));
        }

        log::debug!(
            "Compiled graph with {} nodes, entry '{}'",
            self.nodes.len(),
            entry
        );

        Ok(GraphEngine::new(
            entry,
            self.nodes,
            self.edges,
            self.sink,
            self.interval,
        ))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docflow::workflow::state::{DocumentType, WorkflowState};
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Step for Noop {
        async fn run(&self, _state: &mut WorkflowState) -> Result<(), WorkflowError> {
            Ok(())
        }
    }

    struct ByType;

    impl Router for ByType {
        type Label = DocumentType;

        fn route(&self, _state: &WorkflowState) -> Result<DocumentType, WorkflowError> {
            Ok(DocumentType::Draft)
        }
    }

    fn invalid_message(result: Result<GraphEngine, WorkflowError>) -> String {
        match result {
            Err(WorkflowError::InvalidGraph(msg)) => msg,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("graph should not compile"),
        }
    }

    #[test]
    fn test_linear_graph_compiles() {
        let graph = GraphBuilder::new()
            .add_node("a", Arc::new(Noop))
            .add_node("b", Arc::new(Noop))
            .add_edge("a", "b")
            .add_edge("b", END)
            .set_entry_point("a")
            .compile();
        assert!(graph.is_ok());
    }

    #[test]
    fn test_missing_entry_point() {
        let msg = invalid_message(
            GraphBuilder::new()
                .add_node("a", Arc::new(Noop))
                .add_edge("a", END)
                .compile(),
        );
        assert!(msg.contains("no entry point"));
    }

    #[test]
    fn test_unknown_target() {
        let msg = invalid_message(
            GraphBuilder::new()
                .add_node("a", Arc::new(Noop))
                .add_edge("a", "ghost")
                .set_entry_point("a")
                .compile(),
        );
        assert!(msg.contains("'a' -> 'ghost'"));
    }

    #[test]
    fn test_node_without_edge() {
        let msg = invalid_message(
            GraphBuilder::new()
                .add_node("a", Arc::new(Noop))
                .add_node("b", Arc::new(Noop))
                .add_edge("a", END)
                .set_entry_point("a")
                .compile(),
        );
        assert!(msg.contains("node 'b' has no outgoing edge"));
    }

    #[test]
    fn test_uncovered_router_label() {
        let msg = invalid_message(
            GraphBuilder::new()
                .add_node("classify", Arc::new(Noop))
                .add_node("report", Arc::new(Noop))
                .add_node("form", Arc::new(Noop))
                .add_conditional_edges(
                    "classify",
                    ByType,
                    [
                        (DocumentType::Report, "report"),
                        (DocumentType::Form, "form"),
                    ],
                )
                .add_edge("report", END)
                .add_edge("form", END)
                .set_entry_point("classify")
                .compile(),
        );
        assert!(msg.contains("no edge for label 'draft'"));
    }

    #[test]
    fn test_duplicate_edges_rejected() {
        let msg = invalid_message(
            GraphBuilder::new()
                .add_node("a", Arc::new(Noop))
                .add_edge("a", END)
                .add_edge("a", END)
                .set_entry_point("a")
                .compile(),
        );
        assert!(msg.contains("more than one outgoing edge"));
    }
}
