// SPDX-License-Identifier: MIT

//! Workflow configuration types
//!
//! The on-disk format is the visual editor's export: a mapping from node id
//! to node, optionally wrapped in `{"drawflow": {"Home": {"data": ...}}}`.
//! Each node looks like:
//!
//! ```json
//! {
//!   "name": "DialogAgent",
//!   "data": {"args": {"name": "assistant"}, "elements": ["3", "4"]},
//!   "outputs": {"output_1": {"connections": [{"node": "5", "output": "input_1"}]}}
//! }
//! ```

use super::error::WorkflowError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node ids appear both as strings and as integers in exported files
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum IdRef {
    Text(String),
    Number(i64),
}

impl From<IdRef> for String {
    fn from(id: IdRef) -> Self {
        match id {
            IdRef::Text(s) => s,
            IdRef::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawData {
    #[serde(default)]
    args: Map<String, Value>,
    #[serde(default)]
    elements: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
struct RawConnection {
    node: IdRef,
    #[serde(default)]
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPort {
    #[serde(default)]
    connections: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    data: RawData,
    #[serde(default)]
    outputs: Map<String, Value>,
}

/// One outgoing flow connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub target: String,
    /// Input port on the target side, informational only
    pub input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputPort {
    pub name: String,
    pub connections: Vec<Connection>,
}

/// A node as described by the workflow file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub kind: String,
    pub parameters: Map<String, Value>,
    /// Ids this node is composed of, in order
    pub contained: Vec<String>,
    pub outputs: Vec<OutputPort>,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            parameters: Map::new(),
            contained: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        if let Value::Object(map) = parameters {
            self.parameters = map;
        }
        self
    }

    pub fn with_contained<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contained = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Add a flow connection from `port` to `target`
    pub fn connect(mut self, port: &str, target: impl Into<String>) -> Self {
        let connection = Connection {
            target: target.into(),
            input: None,
        };
        match self.outputs.iter_mut().find(|p| p.name == port) {
            Some(existing) => existing.connections.push(connection),
            None => self.outputs.push(OutputPort {
                name: port.to_string(),
                connections: vec![connection],
            }),
        }
        self
    }

    /// Flow targets in declaration order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.outputs
            .iter()
            .flat_map(|p| p.connections.iter().map(|c| c.target.as_str()))
    }
}

/// The normalized workflow: node descriptors in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowConfig {
    pub nodes: Vec<NodeDescriptor>,
}

impl WorkflowConfig {
    pub fn new(nodes: Vec<NodeDescriptor>) -> Self {
        Self { nodes }
    }

    /// Normalize an exported workflow document.
    ///
    /// Unwraps the editor envelope and drops its `welcome` banner node.
    pub fn from_value(value: Value) -> Result<Self, WorkflowError> {
        let document = match value.pointer("/drawflow/Home/data") {
            Some(inner) => inner.clone(),
            None => value,
        };

        let Value::Object(entries) = document else {
            return Err(WorkflowError::config(
                "<workflow>",
                "expected a mapping from node id to node",
            ));
        };

        let mut nodes = Vec::with_capacity(entries.len());
        for (id, raw) in entries {
            let raw: RawNode = serde_json::from_value(raw)?;
            if raw.class.as_deref() == Some("welcome") {
                continue;
            }

            let mut outputs = Vec::with_capacity(raw.outputs.len());
            for (name, port) in raw.outputs {
                let port: RawPort = serde_json::from_value(port)?;
                outputs.push(OutputPort {
                    name,
                    connections: port
                        .connections
                        .into_iter()
                        .map(|c| Connection {
                            target: c.node.into(),
                            input: c.output,
                        })
                        .collect(),
                });
            }

            nodes.push(NodeDescriptor {
                id,
                kind: raw.name,
                parameters: raw.data.args,
                contained: raw.data.elements.into_iter().map(Into::into).collect(),
                outputs,
            });
        }

        Ok(Self { nodes })
    }

    pub fn get(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
