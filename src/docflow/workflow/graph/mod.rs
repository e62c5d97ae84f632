// SPDX-License-Identifier: MIT

//! Graph-based workflow execution
//!
//! This module provides the builder that validates a node/edge topology
//! and the executor that walks it one step at a time.

pub mod builder;
pub mod executor;
pub mod types;

pub use builder::GraphBuilder;
pub use executor::GraphEngine;
pub use types::{RouteLabel, Router, RunEvent, RunOutcome, Step, END};
