// SPDX-License-Identifier: MIT

//! Workflow graph assembly, execution and code generation

pub mod workflow;
