// SPDX-License-Identifier: MIT

//! Workflow nodes
//!
//! A [`WorkflowNode`] is one live element of a workflow graph. Every node
//! can do two things:
//! - [`Executable::execute`] - act on the flow message in-process
//! - [`Emittable::emit`] - produce the source fragments that reproduce
//!   itself in a standalone program
//!
//! Construction is variant specific and happens once, when the builder
//! first reaches the node, with its contained elements already built.

mod agent;
mod codegen;
mod copy;
mod message;
mod model;
mod pipeline;
mod service;

pub use agent::AgentNode;
pub use copy::CopyNode;
pub use message::MessageNode;
pub use model::ModelNode;
pub use pipeline::{Composition, PipelineNode};
pub use service::ServiceNode;

use super::error::WorkflowError;
use super::sanitize::Parameters;
use crate::adk::agent::Agent;
use crate::adk::message::Msg;
use crate::adk::model::ModelRegistry;
use crate::adk::pipeline::Operator;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Coarse node category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Model,
    Agent,
    Pipeline,
    Service,
    Message,
    Copy,
}

impl NodeKind {
    /// Prefix of generated variable names
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeKind::Model => "model",
            NodeKind::Agent => "agent",
            NodeKind::Pipeline => "pipeline",
            NodeKind::Service => "service",
            NodeKind::Message => "message",
            NodeKind::Copy => "copy",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Concrete node variant a kind name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Model,
    Message,
    DialogAgent,
    UserAgent,
    DictDialogAgent,
    ReActAgent,
    Placeholder,
    MsgHub,
    Sequential,
    ForLoop,
    WhileLoop,
    IfElse,
    Switch,
    Copy,
    BingSearch,
    GoogleSearch,
    Python,
    ReadText,
    WriteText,
}

impl Variant {
    pub fn kind(&self) -> NodeKind {
        match self {
            Variant::Model => NodeKind::Model,
            Variant::Message => NodeKind::Message,
            Variant::DialogAgent
            | Variant::UserAgent
            | Variant::DictDialogAgent
            | Variant::ReActAgent => NodeKind::Agent,
            Variant::Placeholder
            | Variant::MsgHub
            | Variant::Sequential
            | Variant::ForLoop
            | Variant::WhileLoop
            | Variant::IfElse
            | Variant::Switch => NodeKind::Pipeline,
            Variant::Copy => NodeKind::Copy,
            Variant::BingSearch
            | Variant::GoogleSearch
            | Variant::Python
            | Variant::ReadText
            | Variant::WriteText => NodeKind::Service,
        }
    }
}

/// Generated variable name: `<kind prefix>_<id>` with every character that
/// is not valid in an identifier replaced by `_`
pub fn var_name(kind: NodeKind, id: &str) -> String {
    let id: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{}", kind.prefix(), id)
}

/// Everything a variant is constructed from
pub struct NodeHeader {
    pub id: String,
    /// Kind name as written in the workflow file
    pub kind_name: String,
    pub variant: Variant,
    pub var_name: String,
    pub parameters: Parameters,
    /// Parameters as written, used for code generation
    pub source: Map<String, Value>,
    /// Contained elements, already built, in declaration order
    pub dependencies: Vec<Arc<WorkflowNode>>,
}

impl NodeHeader {
    pub fn config_error(&self, message: impl Into<String>) -> WorkflowError {
        WorkflowError::config(&self.id, message)
    }

    pub fn type_mismatch(&self, message: impl Into<String>) -> WorkflowError {
        WorkflowError::type_mismatch(&self.id, message)
    }

    /// Fail unless exactly `expected` elements are contained
    pub fn expect_dependencies(&self, expected: usize) -> Result<(), WorkflowError> {
        if self.dependencies.len() == expected {
            Ok(())
        } else {
            Err(self.config_error(format!(
                "{} takes exactly {} contained element(s), found {}",
                self.kind_name,
                expected,
                self.dependencies.len()
            )))
        }
    }

    /// Operative values as one JSON object
    pub fn values(&self) -> Value {
        Value::Object(self.parameters.values().clone())
    }
}

/// Source fragments produced by one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emission {
    /// One `use` line each
    pub imports: Vec<String>,
    /// Statements run once before the flow starts
    pub init: Vec<String>,
    /// Statement acting on `flow`, if the node does anything when scheduled
    pub exec: Option<String>,
}

/// In-process behaviour of a node
#[async_trait]
pub trait Executable: Send + Sync {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError>;
}

/// Code generation for a node
pub trait Emittable {
    fn emit(&self, header: &NodeHeader) -> Emission;
}

/// Variant payloads
pub enum NodeBody {
    Model(ModelNode),
    Message(MessageNode),
    Agent(AgentNode),
    Pipeline(PipelineNode),
    Copy(CopyNode),
    Service(ServiceNode),
}

/// A constructed workflow node
pub struct WorkflowNode {
    header: NodeHeader,
    body: NodeBody,
}

/// Build the variant behind `header`.
///
/// Model nodes load their configuration into `models` here; agents resolve
/// their model from it.
pub async fn construct(header: NodeHeader, models: &ModelRegistry) -> Result<WorkflowNode, WorkflowError> {
    let body = match header.variant.kind() {
        NodeKind::Model => NodeBody::Model(ModelNode::construct(&header, models).await?),
        NodeKind::Message => NodeBody::Message(MessageNode::construct(&header)?),
        NodeKind::Agent => NodeBody::Agent(AgentNode::construct(&header, models).await?),
        NodeKind::Pipeline => NodeBody::Pipeline(PipelineNode::construct(&header)?),
        NodeKind::Copy => NodeBody::Copy(CopyNode::construct(&header)?),
        NodeKind::Service => NodeBody::Service(ServiceNode::construct(&header)?),
    };
    log::debug!("Constructed node {} as {}", header.id, header.var_name);
    Ok(WorkflowNode { header, body })
}

impl WorkflowNode {
    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn kind(&self) -> NodeKind {
        self.header.variant.kind()
    }

    pub fn kind_name(&self) -> &str {
        &self.header.kind_name
    }

    pub fn variant(&self) -> Variant {
        self.header.variant
    }

    pub fn var_name(&self) -> &str {
        &self.header.var_name
    }

    pub fn header(&self) -> &NodeHeader {
        &self.header
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn parameters(&self) -> &Parameters {
        &self.header.parameters
    }

    pub fn source_parameters(&self) -> &Map<String, Value> {
        &self.header.source
    }

    pub fn dependencies(&self) -> &[Arc<WorkflowNode>] {
        &self.header.dependencies
    }

    /// The node as something a pipeline can call
    pub fn operator(&self) -> Option<Operator> {
        match &self.body {
            NodeBody::Agent(agent) => Some(Operator::Agent(agent.agent())),
            NodeBody::Pipeline(pipeline) => Some(pipeline.operator()),
            NodeBody::Copy(copy) => copy.target().operator(),
            _ => None,
        }
    }

    /// The node as an agent, for broadcast participation
    pub fn agent(&self) -> Option<Arc<dyn Agent>> {
        match &self.body {
            NodeBody::Agent(agent) => Some(agent.agent()),
            NodeBody::Copy(copy) => copy.target().agent(),
            _ => None,
        }
    }

    /// The node as a callable tool
    pub fn tool(&self) -> Option<Arc<dyn Tool>> {
        match &self.body {
            NodeBody::Service(service) => Some(service.tool()),
            NodeBody::Copy(copy) => copy.target().tool(),
            _ => None,
        }
    }

    /// Generated-code counterpart of [`operator`](Self::operator)
    pub(crate) fn operator_expr(&self) -> Option<String> {
        match &self.body {
            NodeBody::Agent(_) => Some(format!("Operator::Agent({}.clone())", self.var_name())),
            NodeBody::Pipeline(_) => Some(format!("{}.clone()", self.var_name())),
            NodeBody::Copy(copy) => copy.target().operator_expr(),
            _ => None,
        }
    }

    /// Generated-code counterpart of [`agent`](Self::agent)
    pub(crate) fn agent_expr(&self) -> Option<String> {
        match &self.body {
            NodeBody::Agent(_) => Some(format!("{}.clone()", self.var_name())),
            NodeBody::Copy(copy) => copy.target().agent_expr(),
            _ => None,
        }
    }

    /// Generated-code counterpart of [`tool`](Self::tool)
    pub(crate) fn tool_expr(&self) -> Option<String> {
        match &self.body {
            NodeBody::Service(_) => Some(format!("{}.clone()", self.var_name())),
            NodeBody::Copy(copy) => copy.target().tool_expr(),
            _ => None,
        }
    }

    /// Source fragments reproducing this node
    pub fn emit(&self) -> Emission {
        match &self.body {
            NodeBody::Model(node) => node.emit(&self.header),
            NodeBody::Message(node) => node.emit(&self.header),
            NodeBody::Agent(node) => node.emit(&self.header),
            NodeBody::Pipeline(node) => node.emit(&self.header),
            NodeBody::Copy(node) => node.emit(&self.header),
            NodeBody::Service(node) => node.emit(&self.header),
        }
    }
}

#[async_trait]
impl Executable for WorkflowNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        match &self.body {
            NodeBody::Model(node) => node.execute(input).await,
            NodeBody::Message(node) => node.execute(input).await,
            NodeBody::Agent(node) => node.execute(input).await,
            NodeBody::Pipeline(node) => node.execute(input).await,
            NodeBody::Copy(node) => node.execute(input).await,
            NodeBody::Service(node) => node.execute(input).await,
        }
    }
}

impl fmt::Debug for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowNode")
            .field("id", &self.header.id)
            .field("kind_name", &self.header.kind_name)
            .field("var_name", &self.header.var_name)
            .field(
                "dependencies",
                &self
                    .header
                    .dependencies
                    .iter()
                    .map(|d| d.id())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
