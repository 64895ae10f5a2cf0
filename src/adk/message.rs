// SPDX-License-Identifier: MIT

//! Msg - the unit of data flowing between agents, pipelines and services

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_role() -> String {
    "assistant".to_string()
}

/// A message exchanged in a workflow.
///
/// `content` is usually a string, but structured agents and services put
/// JSON objects here as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    pub name: String,
    pub content: Value,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Msg {
    pub fn new(name: impl Into<String>, content: impl Into<Value>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            role: role.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Content rendered as plain text. Strings are returned as-is, anything
    /// else is serialized as compact JSON.
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
