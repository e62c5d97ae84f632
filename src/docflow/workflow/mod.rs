// SPDX-License-Identifier: MIT

pub mod graph;
pub mod pipeline;
pub mod progress;
pub mod state;
pub mod steps;
