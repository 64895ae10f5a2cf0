// SPDX-License-Identifier: MIT

//! Helpers for rendering values as Rust source

use serde_json::{Map, Value};

pub(crate) const USE_AGENT: &str = "use workstation_rs::adk::agent::Agent;";
pub(crate) const USE_OPERATOR: &str = "use workstation_rs::adk::pipeline::Operator;";
pub(crate) const USE_CALLABLE: &str = "use workstation_rs::workstation::workflow::condition::Callable;";
pub(crate) const USE_TOOL: &str = "use workstation_rs::adk::tool::Tool;";

/// A string literal
pub(crate) fn str_lit(text: &str) -> String {
    format!("{:?}", text)
}

/// A `json!(...)` expression building `value`
pub(crate) fn json_expr(value: &Value) -> String {
    format!("json!({})", json_tokens(value))
}

/// Deserialize a typed configuration from a JSON object, inside a `?` context
pub(crate) fn from_json(map: &Map<String, Value>) -> String {
    format!(
        "serde_json::from_value({})?",
        json_expr(&Value::Object(map.clone()))
    )
}

/// `Callable::parse("...")?.<method>()?`
pub(crate) fn callable_expr(source: &str, method: &str) -> String {
    format!("Callable::parse({})?.{}()?", str_lit(source), method)
}

fn json_tokens(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => str_lit(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(json_tokens).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", str_lit(k), json_tokens(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
