// SPDX-License-Identifier: MIT

//! Callable expressions: `|x| x.content == 'done'` or `lambda i, x: i < 3`
//!
//! A callable binds its parameters positionally and evaluates a closed
//! expression over them. Every path in the body has to start at one of the
//! declared parameters.

use super::ast::Expression;
use super::evaluator::{evaluate_value, truthy, Scope};
use super::parser::{is_identifier, parse};
use crate::adk::message::Msg;
use crate::adk::pipeline::{LoopCondition, Predicate, Selector};
use crate::workstation::workflow::error::WorkflowError;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    source: String,
    params: Vec<String>,
    body: Expression,
}

impl Callable {
    /// Whether a parameter string is meant as a callable
    pub fn looks_callable(text: &str) -> bool {
        let text = text.trim_start();
        text.starts_with('|') || text.starts_with("lambda ") || text.starts_with("lambda:")
    }

    pub fn parse(source: &str) -> Result<Self, WorkflowError> {
        let trimmed = source.trim();
        let (params, body) = if let Some(rest) = trimmed.strip_prefix('|') {
            rest.split_once('|').ok_or_else(|| {
                WorkflowError::invalid_expression(source, "missing closing '|'")
            })?
        } else if let Some(rest) = trimmed.strip_prefix("lambda") {
            rest.split_once(':')
                .ok_or_else(|| WorkflowError::invalid_expression(source, "missing ':'"))?
        } else {
            return Err(WorkflowError::invalid_expression(
                source,
                "expected '|args| body' or 'lambda args: body'",
            ));
        };

        let params: Vec<String> = params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        for (index, param) in params.iter().enumerate() {
            if !is_identifier(param) {
                return Err(WorkflowError::invalid_expression(
                    source,
                    format!("'{}' is not a valid parameter name", param),
                ));
            }
            if params[..index].contains(param) {
                return Err(WorkflowError::invalid_expression(
                    source,
                    format!("parameter '{}' declared twice", param),
                ));
            }
        }

        let body = parse(body)?;
        for path in body.paths() {
            let root = path.split('.').next().unwrap_or(path);
            if !params.iter().any(|p| p == root) {
                return Err(WorkflowError::invalid_expression(
                    source,
                    format!("'{}' is not a parameter", root),
                ));
            }
        }

        Ok(Self {
            source: trimmed.to_string(),
            params,
            body,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Evaluate with positional arguments; missing arguments are null
    pub fn call(&self, args: &[Value]) -> Value {
        let scope = self
            .params
            .iter()
            .enumerate()
            .fold(Scope::new(), |scope, (i, name)| {
                scope.bind(name.clone(), args.get(i).cloned().unwrap_or(Value::Null))
            });
        evaluate_value(&self.body, &scope)
    }

    fn expect_arity(&self, expected: usize) -> Result<(), WorkflowError> {
        if self.arity() == expected {
            Ok(())
        } else {
            Err(WorkflowError::invalid_expression(
                &self.source,
                format!("expected {} parameter(s), found {}", expected, self.arity()),
            ))
        }
    }

    /// `|x| ...` as a condition over the current message
    pub fn to_predicate(&self) -> Result<Predicate, WorkflowError> {
        self.expect_arity(1)?;
        let callable = self.clone();
        Ok(Arc::new(move |msg: Option<&Msg>| {
            truthy(&callable.call(&[msg_value(msg)]))
        }))
    }

    /// `|i, x| ...` as a loop condition over iteration count and message
    pub fn to_loop_condition(&self) -> Result<LoopCondition, WorkflowError> {
        self.expect_arity(2)?;
        let callable = self.clone();
        Ok(Arc::new(move |iteration: usize, msg: Option<&Msg>| {
            truthy(&callable.call(&[Value::from(iteration), msg_value(msg)]))
        }))
    }

    /// `|x| ...` producing a switch case label
    pub fn to_selector(&self) -> Result<Selector, WorkflowError> {
        self.expect_arity(1)?;
        let callable = self.clone();
        Ok(Arc::new(move |msg: Option<&Msg>| {
            match callable.call(&[msg_value(msg)]) {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            }
        }))
    }
}

fn msg_value(msg: Option<&Msg>) -> Value {
    msg.and_then(|m| serde_json::to_value(m).ok())
        .unwrap_or(Value::Null)
}
