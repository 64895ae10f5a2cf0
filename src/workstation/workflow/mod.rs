// SPDX-License-Identifier: MIT

//! Workflow module
//!
//! A workflow file is loaded into a [`WorkflowConfig`], the [`GraphBuilder`]
//! turns it into a [`WorkflowGraph`] of live nodes, and the graph is either
//! [`run`] in-process or [`compile`]d into a standalone program.

pub mod builder;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod executor;
pub mod graph;
pub mod loader;
pub mod node;
pub mod program;
pub mod registry;
pub mod sanitize;
pub mod types;

pub use builder::GraphBuilder;
pub use compiler::{compile, CompileOptions};
pub use error::WorkflowError;
pub use executor::{run, RunSummary};
pub use graph::WorkflowGraph;
pub use loader::WorkflowLoader;
pub use program::GeneratedProgram;
pub use types::{NodeDescriptor, WorkflowConfig};
