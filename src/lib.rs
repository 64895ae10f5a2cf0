// SPDX-License-Identifier: MIT

//! workstation-rs
//!
//! Turns a visual workflow description (typed nodes and their connections)
//! into either an in-process run or an equivalent standalone Rust program.
//!
//! - [`adk`] - the agent development kit the workflow nodes wrap
//! - [`workstation`] - graph assembly, execution and code generation

pub mod adk;
pub mod workstation;
