// SPDX-License-Identifier: MIT

//! Workflow-specific errors

use crate::adk::error::AdkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Node kind name not present in the variant registry
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    /// Bad arity, missing parameter, dangling reference, name collision
    #[error("Configuration error in node {node}: {message}")]
    Configuration { node: String, message: String },

    /// A dependency lacks a capability its container requires
    #[error("Type mismatch in node {node}: {message}")]
    TypeMismatch { node: String, message: String },

    /// Flow edges among scheduled nodes form a cycle
    #[error("Workflow contains a cycle through nodes: {0:?}")]
    CyclicWorkflow(Vec<String>),

    /// More than one scheduled node flows into a node
    #[error("Node {node} has {count} flow predecessors; at most one is supported")]
    TooManyPredecessors { node: String, count: usize },

    /// A callable expression that does not parse or does not fit its slot
    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    /// Failures propagated unchanged from the agent library
    #[error(transparent)]
    External(#[from] AdkError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parsing errors while loading a workflow
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors while loading a workflow
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl WorkflowError {
    /// Create a configuration error
    pub fn config(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn invalid_expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            message: message.into(),
        }
    }
}
