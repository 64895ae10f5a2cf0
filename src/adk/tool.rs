// SPDX-License-Identifier: MIT

//! Tools - callable capabilities agents can use
//!
//! Besides the [`Tool`] trait this module carries the pieces the workflow
//! layer needs to treat services uniformly: [`PartialTool`] binds arguments
//! up front, [`ServiceToolkit`] groups tools for a reasoning agent, and
//! [`invoke`] calls a tool with a flow message.

use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Trait for tools that can be called by agents.
///
/// # Optimization Notes
/// - `name()` and `description()` return `&str` to avoid allocation on every call
/// - `schema()` returns `&Value` to avoid cloning the schema on every access
/// - Implementations should store these values in struct fields
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within an agent's tool set)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// The argument a plain-text flow message is bound to, if any
    fn primary_input(&self) -> Option<&str> {
        None
    }

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value, AdkError>;
}

/// A tool with some of its arguments fixed at construction.
///
/// Bound keys disappear from the advertised schema so a model never sees
/// (or overrides) values like API keys or result counts.
pub struct PartialTool {
    inner: Arc<dyn Tool>,
    bound: Map<String, Value>,
    schema: Value,
}

impl PartialTool {
    pub fn new(inner: Arc<dyn Tool>, bound: Map<String, Value>) -> Self {
        let mut schema = inner.schema().clone();
        if let Some(props) = schema.get_mut("properties").and_then(Value::as_object_mut) {
            for key in bound.keys() {
                props.remove(key);
            }
        }
        if let Some(required) = schema.get_mut("required").and_then(Value::as_array_mut) {
            required.retain(|r| r.as_str().map(|k| !bound.contains_key(k)).unwrap_or(true));
        }
        Self {
            inner,
            bound,
            schema,
        }
    }

    pub fn bound(&self) -> &Map<String, Value> {
        &self.bound
    }
}

#[async_trait]
impl Tool for PartialTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    fn primary_input(&self) -> Option<&str> {
        self.inner.primary_input()
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let mut args = self.bound.clone();
        match input {
            Value::Object(map) => args.extend(map),
            Value::Null => {}
            other => {
                return Err(AdkError::tool(
                    self.name(),
                    format!("expected an object of arguments, got {}", other),
                ))
            }
        }
        self.inner.execute(Value::Object(args)).await
    }
}

/// An ordered set of tools handed to a reasoning agent.
#[derive(Clone, Default)]
pub struct ServiceToolkit {
    tools: Vec<Arc<dyn Tool>>,
}

impl ServiceToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.add(tool);
        self
    }

    /// Adds a tool, replacing an existing one with the same name
    pub fn add(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Call a tool with a flow message.
///
/// Object content is merged into the arguments; text content is bound to the
/// tool's primary input. The result comes back as a system message named
/// after the tool.
pub async fn invoke(tool: &Arc<dyn Tool>, input: Option<Msg>) -> Result<Msg, AdkError> {
    let mut args = Map::new();
    if let Some(msg) = input {
        match msg.content {
            Value::Object(map) => args.extend(map),
            Value::Null => {}
            Value::String(text) if text.is_empty() => {}
            other => {
                if let Some(key) = tool.primary_input() {
                    let value = match other {
                        Value::String(s) => Value::String(s),
                        v => Value::String(v.to_string()),
                    };
                    args.insert(key.to_string(), value);
                }
            }
        }
    }

    log::debug!("Invoking tool {} with {}", tool.name(), Value::Object(args.clone()));
    let result = tool.execute(Value::Object(args)).await?;
    Ok(Msg::new(tool.name(), result, "system"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static ECHO_SCHEMA: Lazy<Value> = Lazy::new(|| {
        json!({
            "type": "object",
            "properties": {
                "question": {"type": "string"},
                "api_key": {"type": "string"},
                "num_results": {"type": "integer"}
            },
            "required": ["question", "api_key"]
        })
    });

    /// Returns its arguments unchanged
    struct EchoArgsTool;

    #[async_trait]
    impl Tool for EchoArgsTool {
        fn name(&self) -> &str {
            "echo_args"
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn schema(&self) -> &Value {
            &ECHO_SCHEMA
        }

        fn primary_input(&self) -> Option<&str> {
            Some("question")
        }

        async fn execute(&self, input: Value) -> Result<Value, AdkError> {
            Ok(input)
        }
    }

    fn bound(pairs: Value) -> Map<String, Value> {
        pairs.as_object().cloned().unwrap()
    }

    #[test]
    fn test_partial_tool_hides_bound_keys() {
        let tool = PartialTool::new(
            Arc::new(EchoArgsTool),
            bound(json!({"api_key": "k", "num_results": 3})),
        );
        let props = tool.schema()["properties"].as_object().unwrap();
        assert!(props.contains_key("question"));
        assert!(!props.contains_key("api_key"));
        assert_eq!(tool.schema()["required"], json!(["question"]));
        assert_eq!(tool.name(), "echo_args");
    }

    #[tokio::test]
    async fn test_partial_tool_merges_arguments() {
        let tool = PartialTool::new(Arc::new(EchoArgsTool), bound(json!({"api_key": "k"})));
        let out = tool.execute(json!({"question": "why"})).await.unwrap();
        assert_eq!(out, json!({"api_key": "k", "question": "why"}));
    }

    #[tokio::test]
    async fn test_partial_tool_rejects_non_object() {
        let tool = PartialTool::new(Arc::new(EchoArgsTool), Map::new());
        assert!(tool.execute(json!("text")).await.is_err());
    }

    #[tokio::test]
    async fn test_invoke_binds_text_to_primary_input() {
        let tool: Arc<dyn Tool> = Arc::new(EchoArgsTool);
        let msg = Msg::new("user", "what is rust", "user");
        let out = invoke(&tool, Some(msg)).await.unwrap();
        assert_eq!(out.name, "echo_args");
        assert_eq!(out.role, "system");
        assert_eq!(out.content, json!({"question": "what is rust"}));
    }

    #[tokio::test]
    async fn test_invoke_merges_object_content() {
        let tool: Arc<dyn Tool> = Arc::new(EchoArgsTool);
        let msg = Msg::new("user", json!({"question": "q", "num_results": 2}), "user");
        let out = invoke(&tool, Some(msg)).await.unwrap();
        assert_eq!(out.content, json!({"question": "q", "num_results": 2}));
    }

    #[tokio::test]
    async fn test_invoke_without_input() {
        let tool: Arc<dyn Tool> = Arc::new(EchoArgsTool);
        let out = invoke(&tool, None).await.unwrap();
        assert_eq!(out.content, json!({}));
    }

    #[test]
    fn test_toolkit_replaces_same_name() {
        let mut toolkit = ServiceToolkit::new().with(Arc::new(EchoArgsTool));
        toolkit.add(Arc::new(EchoArgsTool));
        assert_eq!(toolkit.len(), 1);
        assert!(toolkit.get("echo_args").is_some());
        assert!(toolkit.get("missing").is_none());
    }
}
