// SPDX-License-Identifier: MIT

//! Expression language for callable node parameters
//!
//! Pipelines take their loop, branch and switch logic as callables written
//! in the workflow file, for example:
//! - `|x| x.content contains 'done'`
//! - `lambda i, x: i < 3`
//! - `|x| x.metadata.route`
//!
//! The language is closed: comparisons, `and`/`or`/`not`, literals and
//! dotted paths rooted at the callable's parameters. Nothing else runs.

mod ast;
mod callable;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal};
pub use callable::Callable;
pub use evaluator::{evaluate, evaluate_value, truthy, Scope};
pub use parser::parse;
