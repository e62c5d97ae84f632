//! Graph type definitions
//!
//! Steps, routers and the edge representation shared by the builder and
//! the executor.

use crate::adk::error::WorkflowError;
use crate::docflow::workflow::state::WorkflowState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Terminal marker: an edge to `END` finishes the run
pub const END: &str = "__end__";

/// Unit of work executed at a node
#[async_trait]
pub trait Step: Send + Sync {
    /// Transform the state in place
    async fn run(&self, state: &mut WorkflowState) -> Result<(), WorkflowError>;

    /// Whether the engine shows a live elapsed-time overlay while this runs
    fn shows_progress(&self) -> bool {
        true
    }
}

/// Closed set of labels a router may return
pub trait RouteLabel: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every label; the builder requires an edge for each
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;
}

/// Decision function at a branch node
pub trait Router: Send + Sync {
    type Label: RouteLabel;

    fn route(&self, state: &WorkflowState) -> Result<Self::Label, WorkflowError>;
}

/// Type-erased router plus its label table
pub(crate) trait Branch: Send + Sync {
    fn next(&self, node: &str, state: &WorkflowState) -> Result<&str, WorkflowError>;

    fn targets(&self) -> Vec<&str>;

    /// Labels without a table entry
    fn missing_labels(&self) -> Vec<&'static str>;
}

pub(crate) struct RouterBranch<R: Router> {
    pub router: R,
    pub table: HashMap<R::Label, String>,
}

impl<R: Router> Branch for RouterBranch<R> {
    fn next(&self, node: &str, state: &WorkflowState) -> Result<&str, WorkflowError> {
        let label = self.router.route(state)?;
        log::info!("Node {} routed via '{}'", node, label.as_str());
        self.table
            .get(&label)
            .map(String::as_str)
            .ok_or_else(|| WorkflowError::Routing {
                node: node.to_string(),
                label: label.as_str().to_string(),
            })
    }

    fn targets(&self) -> Vec<&str> {
        self.table.values().map(String::as_str).collect()
    }

    fn missing_labels(&self) -> Vec<&'static str> {
        <R::Label as RouteLabel>::ALL
            .iter()
            .filter(|l| !self.table.contains_key(*l))
            .map(|l| l.as_str())
            .collect()
    }
}

/// Outgoing edge of a node
pub(crate) enum Edge {
    Fixed(String),
    Conditional(Box<dyn Branch>),
}

impl Edge {
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Fixed(to) => vec![to.as_str()],
            Edge::Conditional(branch) => branch.targets(),
        }
    }
}

/// Progress notification streamed while a run executes
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    NodeStarted(String),
    NodeCompleted(String),
    /// The terminal marker was reached
    Finished,
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunOutcome {
    pub state: WorkflowState,
    /// Node ids in visit order, ending with `END`
    pub trace: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docflow::document::Document;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Coin {
        Heads,
        Tails,
    }

    impl RouteLabel for Coin {
        const ALL: &'static [Self] = &[Coin::Heads, Coin::Tails];

        fn as_str(&self) -> &'static str {
            match self {
                Coin::Heads => "heads",
                Coin::Tails => "tails",
            }
        }
    }

    struct AlwaysTails;

    impl Router for AlwaysTails {
        type Label = Coin;

        fn route(&self, _state: &WorkflowState) -> Result<Coin, WorkflowError> {
            Ok(Coin::Tails)
        }
    }

    fn state() -> WorkflowState {
        WorkflowState::new(Document::new("", "x"))
    }

    #[test]
    fn test_missing_labels() {
        let branch = RouterBranch {
            router: AlwaysTails,
            table: HashMap::from([(Coin::Heads, "a".to_string())]),
        };
        assert_eq!(branch.missing_labels(), vec!["tails"]);
    }

    #[test]
    fn test_unmatched_label_is_routing_error() {
        let branch = RouterBranch {
            router: AlwaysTails,
            table: HashMap::from([(Coin::Heads, "a".to_string())]),
        };
        let err = branch.next("flip", &state()).unwrap_err();
        assert!(matches!(err, WorkflowError::Routing { ref label, .. } if label == "tails"));
    }

    #[test]
    fn test_matched_label() {
        let branch = RouterBranch {
            router: AlwaysTails,
            table: HashMap::from([
                (Coin::Heads, "a".to_string()),
                (Coin::Tails, "b".to_string()),
            ]),
        };
        assert_eq!(branch.next("flip", &state()).unwrap(), "b");
        assert!(branch.missing_labels().is_empty());
    }
}
