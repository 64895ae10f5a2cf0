// SPDX-License-Identifier: MIT

//! Parameter sanitization
//!
//! Empty placeholders (`""`) left behind by the editor are dropped, and
//! callable-valued keys written as callables are compiled into
//! [`Callable`]s. Other strings, prompts included, stay plain text. The
//! original text is kept alongside for code generation.

use super::condition::Callable;
use super::error::WorkflowError;
use super::types::NodeDescriptor;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parameter keys read as callables by pipeline nodes
pub const CALLABLE_KEYS: [&str; 2] = ["condition_func", "break_func"];

/// Operative parameters of a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Map<String, Value>,
    callables: BTreeMap<String, Callable>,
}

impl Parameters {
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn callable(&self, key: &str) -> Option<&Callable> {
        self.callables.get(key)
    }

    pub fn callables(&self) -> &BTreeMap<String, Callable> {
        &self.callables
    }

    /// Plain values with some keys removed
    pub fn values_without(&self, keys: &[&str]) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Result of sanitizing one descriptor
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub parameters: Parameters,
    /// Parameters as written, minus empty placeholders
    pub source: Map<String, Value>,
}

pub fn sanitize(descriptor: &NodeDescriptor) -> Result<Sanitized, WorkflowError> {
    let mut parameters = Parameters::default();
    let mut source = Map::new();

    for (key, value) in &descriptor.parameters {
        if value.as_str() == Some("") {
            continue;
        }
        source.insert(key.clone(), value.clone());

        match value.as_str() {
            Some(text) if CALLABLE_KEYS.contains(&key.as_str()) && Callable::looks_callable(text) => {
                let callable = Callable::parse(text).map_err(|e| {
                    WorkflowError::config(&descriptor.id, format!("parameter '{}': {}", key, e))
                })?;
                parameters.callables.insert(key.clone(), callable);
            }
            _ => {
                parameters.values.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(Sanitized { parameters, source })
}
