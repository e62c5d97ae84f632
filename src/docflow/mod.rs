// SPDX-License-Identifier: MIT

pub mod collaborators;
pub mod config;
pub mod document;
pub mod workflow;
