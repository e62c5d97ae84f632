//! Graph workflow executor

use super::types::{Edge, RunEvent, RunOutcome, Step, END};
use crate::adk::error::WorkflowError;
use crate::docflow::workflow::progress::{with_progress, ProgressSink};
use crate::docflow::workflow::state::WorkflowState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Drives a compiled graph from its entry node to `END`
///
/// Exactly one step runs at a time. The restart cycle is an ordinary edge,
/// so the loop below may revisit nodes any number of times.
pub struct GraphEngine {
    entry: String,
    nodes: HashMap<String, Arc<dyn Step>>,
    edges: HashMap<String, Edge>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
}

impl GraphEngine {
    pub(crate) fn new(
        entry: String,
        nodes: HashMap<String, Arc<dyn Step>>,
        edges: HashMap<String, Edge>,
        sink: Arc<dyn ProgressSink>,
        interval: Duration,
    ) -> Self {
        Self {
            entry,
            nodes,
            edges,
            sink,
            interval,
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Run to completion
    pub async fn run(&self, state: WorkflowState) -> Result<RunOutcome, WorkflowError> {
        self.execute(state, None).await
    }

    /// Run to completion, streaming node visits to `tx`
    pub async fn run_stream(
        &self,
        state: WorkflowState,
        tx: mpsc::Sender<RunEvent>,
    ) -> Result<RunOutcome, WorkflowError> {
        self.execute(state, Some(tx)).await
    }

    async fn execute(
        &self,
        mut state: WorkflowState,
        tx: Option<mpsc::Sender<RunEvent>>,
    ) -> Result<RunOutcome, WorkflowError> {
        let mut trace = Vec::new();
        let mut current = self.entry.clone();

        loop {
            let step = self
                .nodes
                .get(&current)
                .ok_or_else(|| WorkflowError::InvalidGraph(format!("unknown node '{}'", current)))?;

            log::info!("Executing node: {}", current);
            trace.push(current.clone());
            send(&tx, RunEvent::NodeStarted(current.clone())).await;

            if let Err(e) = self.execute_node(&current, step.as_ref(), &mut state).await {
                log::error!("Node {} failed: {}", current, e);
                return Err(e);
            }

            log::info!("Node {} completed", current);
            send(&tx, RunEvent::NodeCompleted(current.clone())).await;

            let next = self.successor(&current, &state)?;
            if next == END {
                trace.push(END.to_string());
                send(&tx, RunEvent::Finished).await;
                log::info!("Run finished after {} node visits", trace.len() - 1);
                return Ok(RunOutcome { state, trace });
            }
            current = next.to_string();
        }
    }

    async fn execute_node(
        &self,
        node: &str,
        step: &dyn Step,
        state: &mut WorkflowState,
    ) -> Result<(), WorkflowError> {
        if step.shows_progress() {
            with_progress(node, self.sink.clone(), self.interval, step.run(state)).await
        } else {
            step.run(state).await
        }
    }

    /// Follow the node's fixed edge or ask its router
    fn successor(&self, node: &str, state: &WorkflowState) -> Result<&str, WorkflowError> {
        match self.edges.get(node) {
            Some(Edge::Fixed(to)) => Ok(to.as_str()),
            Some(Edge::Conditional(branch)) => branch.next(node, state),
            None => Err(WorkflowError::InvalidGraph(format!(
                "node '{}' has no outgoing edge",
                node
            ))),
        }
    }
}

async fn send(tx: &Option<mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = tx {
        // A dropped observer must not stop the run
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docflow::document::Document;
    use crate::docflow::workflow::graph::builder::GraphBuilder;
    use crate::docflow::workflow::graph::types::{RouteLabel, Router};
    use crate::docflow::workflow::progress::ProgressEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Appends a marker to processed_content
    struct Append(&'static str);

    #[async_trait]
    impl Step for Append {
        async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError> {
            state.processed_content.push_str(self.0);
            Ok(())
        }
    }

    struct Fail;

    #[async_trait]
    impl Step for Fail {
        async fn run(&self, _state: &mut WorkflowState) -> Result<(), WorkflowError> {
            Err(WorkflowError::collaborator("boom", "model unavailable"))
        }
    }

    struct Quiet;

    #[async_trait]
    impl Step for Quiet {
        async fn run(&self, _state: &mut WorkflowState) -> Result<(), WorkflowError> {
            Ok(())
        }

        fn shows_progress(&self) -> bool {
            false
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Loop {
        Again,
        Done,
    }

    impl RouteLabel for Loop {
        const ALL: &'static [Self] = &[Loop::Again, Loop::Done];

        fn as_str(&self) -> &'static str {
            match self {
                Loop::Again => "again",
                Loop::Done => "done",
            }
        }
    }

    /// Loops until it has been asked `limit` times
    struct Countdown {
        calls: AtomicU32,
        limit: u32,
    }

    impl Router for Countdown {
        type Label = Loop;

        fn route(&self, _state: &WorkflowState) -> Result<Loop, WorkflowError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(if n >= self.limit { Loop::Done } else { Loop::Again })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn state() -> WorkflowState {
        WorkflowState::new(Document::new("text", "doc.txt"))
    }

    #[tokio::test]
    async fn test_sequential_execution() {
        let graph = GraphBuilder::new()
            .add_node("a", Arc::new(Append("a")))
            .add_node("b", Arc::new(Append("b")))
            .add_edge("a", "b")
            .add_edge("b", END)
            .set_entry_point("a")
            .compile()
            .unwrap();

        let outcome = graph.run(state()).await.unwrap();
        assert_eq!(outcome.state.processed_content, "ab");
        assert_eq!(outcome.trace, vec!["a", "b", END]);
    }

    #[tokio::test]
    async fn test_cycle_runs_until_router_exits() {
        let graph = GraphBuilder::new()
            .add_node("work", Arc::new(Append("x")))
            .add_conditional_edges(
                "work",
                Countdown {
                    calls: AtomicU32::new(0),
                    limit: 250,
                },
                [(Loop::Again, "work"), (Loop::Done, END)],
            )
            .set_entry_point("work")
            .compile()
            .unwrap();

        let outcome = graph.run(state()).await.unwrap();
        assert_eq!(outcome.state.processed_content.len(), 250);
        assert_eq!(outcome.trace.len(), 251);
    }

    #[tokio::test]
    async fn test_failure_aborts_at_failing_node() {
        let graph = GraphBuilder::new()
            .add_node("a", Arc::new(Append("a")))
            .add_node("boom", Arc::new(Fail))
            .add_node("c", Arc::new(Append("c")))
            .add_edge("a", "boom")
            .add_edge("boom", "c")
            .add_edge("c", END)
            .set_entry_point("a")
            .compile()
            .unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let err = graph.run_stream(state(), tx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Collaborator { .. }));

        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                RunEvent::NodeStarted("a".to_string()),
                RunEvent::NodeCompleted("a".to_string()),
                RunEvent::NodeStarted("boom".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_overlay_skipped_for_quiet_steps() {
        let sink = Arc::new(RecordingSink::default());
        let graph = GraphBuilder::new()
            .add_node("busy", Arc::new(Append("a")))
            .add_node("quiet", Arc::new(Quiet))
            .add_edge("busy", "quiet")
            .add_edge("quiet", END)
            .set_entry_point("busy")
            .with_progress_sink(sink.clone())
            .compile()
            .unwrap();

        graph.run(state()).await.unwrap();

        let events = sink.events.lock().unwrap();
        assert!(events.iter().all(|e| e.node() == "busy"));
        assert!(matches!(events.last(), Some(ProgressEvent::Stopped { .. })));
    }

    #[tokio::test]
    async fn test_overlay_stopped_when_step_fails() {
        let sink = Arc::new(RecordingSink::default());
        let graph = GraphBuilder::new()
            .add_node("boom", Arc::new(Fail))
            .add_edge("boom", END)
            .set_entry_point("boom")
            .with_progress_sink(sink.clone())
            .compile()
            .unwrap();

        assert!(graph.run(state()).await.is_err());
        let events = sink.events.lock().unwrap();
        assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
        assert!(matches!(events.last(), Some(ProgressEvent::Stopped { .. })));
    }
}
