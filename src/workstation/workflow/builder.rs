// SPDX-License-Identifier: MIT

//! Graph builder - turns a workflow configuration into live nodes
//!
//! Everything that can be rejected from the configuration alone (unknown
//! kinds, dangling references, malformed callables, name collisions,
//! containment and flow cycles) is rejected before the first node is
//! constructed. Per-variant checks (arity, capabilities) need the built
//! elements and run during construction, after model nodes have loaded.
//! Construction runs model nodes first and resolves containment
//! depth-first, building each id once.

use super::error::WorkflowError;
use super::graph::{excluded_ids, FlowEdge, FlowPlan, WorkflowGraph};
use super::node::{self, NodeHeader, NodeKind, Variant, WorkflowNode};
use super::registry;
use super::sanitize::{sanitize, Sanitized};
use super::types::{NodeDescriptor, WorkflowConfig};
use crate::adk::model::ModelRegistry;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Builds [`WorkflowGraph`]s against one model registry
pub struct GraphBuilder {
    models: ModelRegistry,
}

/// A descriptor that passed the up-front checks
struct Prepared<'a> {
    descriptor: &'a NodeDescriptor,
    variant: Variant,
    sanitized: Sanitized,
    var_name: String,
}

/// State of one build: prepared descriptors in, built nodes out
struct Session<'a> {
    models: &'a ModelRegistry,
    prepared: HashMap<&'a str, Prepared<'a>>,
    built: HashMap<String, Arc<WorkflowNode>>,
    /// Built nodes in construction order
    arena: Vec<Arc<WorkflowNode>>,
}

impl GraphBuilder {
    pub fn new(models: ModelRegistry) -> Self {
        Self { models }
    }

    /// The registry model nodes load into
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Build the graph for a workflow configuration
    pub async fn build(&self, config: &WorkflowConfig) -> Result<WorkflowGraph, WorkflowError> {
        let prepared = prepare(config)?;

        let excluded = excluded_ids(config.nodes.iter().map(|d| {
            let kind = prepared[d.id.as_str()].variant.kind();
            let elements = d
                .contained
                .iter()
                .map(|c| (c.as_str(), prepared[c.as_str()].variant.kind()))
                .collect();
            (kind, elements)
        }));
        let edges = flow_edges(config);
        let plan = FlowPlan::new(config.nodes.iter().map(|d| d.id.as_str()), excluded, &edges)?;

        let mut session = Session {
            models: &self.models,
            prepared,
            built: HashMap::new(),
            arena: Vec::with_capacity(config.nodes.len()),
        };

        let (models, others): (Vec<&NodeDescriptor>, Vec<&NodeDescriptor>) = config
            .nodes
            .iter()
            .partition(|d| session.prepared[d.id.as_str()].variant.kind() == NodeKind::Model);
        for descriptor in models.into_iter().chain(others) {
            session.build_node(&descriptor.id).await?;
        }

        let graph = WorkflowGraph::from_plan(session.arena, plan);
        log::info!(
            "Built workflow graph: {} nodes, {} scheduled",
            graph.len(),
            graph.order().len()
        );
        Ok(graph)
    }
}

/// Resolve kinds, sanitize parameters and check references and names
fn prepare(config: &WorkflowConfig) -> Result<HashMap<&str, Prepared<'_>>, WorkflowError> {
    let mut prepared = HashMap::with_capacity(config.nodes.len());
    let mut var_names: HashMap<String, &str> = HashMap::new();

    for descriptor in &config.nodes {
        let variant = registry::lookup(&descriptor.kind)?;
        let sanitized = sanitize(descriptor)?;
        let var_name = node::var_name(variant.kind(), &descriptor.id);

        if let Some(other) = var_names.insert(var_name.clone(), &descriptor.id) {
            return Err(WorkflowError::config(
                &descriptor.id,
                format!("generated name {} collides with node {}", var_name, other),
            ));
        }

        let entry = Prepared {
            descriptor,
            variant,
            sanitized,
            var_name,
        };
        if prepared.insert(descriptor.id.as_str(), entry).is_some() {
            return Err(WorkflowError::config(&descriptor.id, "duplicate node id"));
        }
    }

    for descriptor in &config.nodes {
        let references = descriptor
            .contained
            .iter()
            .map(String::as_str)
            .chain(descriptor.targets());
        for id in references {
            if !prepared.contains_key(id) {
                return Err(WorkflowError::config(
                    &descriptor.id,
                    format!("references unknown node {}", id),
                ));
            }
        }
    }

    check_containment(config)?;
    Ok(prepared)
}

/// Containment must bottom out; a node may not (transitively) contain itself
fn check_containment(config: &WorkflowConfig) -> Result<(), WorkflowError> {
    let mut containment: DiGraph<&str, ()> = DiGraph::new();
    let index: HashMap<&str, _> = config
        .nodes
        .iter()
        .map(|d| (d.id.as_str(), containment.add_node(d.id.as_str())))
        .collect();
    for descriptor in &config.nodes {
        for element in &descriptor.contained {
            if let (Some(&from), Some(&to)) = (index.get(descriptor.id.as_str()), index.get(element.as_str())) {
                containment.add_edge(from, to, ());
            }
        }
    }
    toposort(&containment, None)
        .map(|_| ())
        .map_err(|cycle| WorkflowError::config(containment[cycle.node_id()], "containment cycle"))
}

fn flow_edges(config: &WorkflowConfig) -> Vec<FlowEdge> {
    config
        .nodes
        .iter()
        .flat_map(|d| {
            d.outputs.iter().flat_map(move |port| {
                port.connections.iter().map(move |c| FlowEdge {
                    source: d.id.clone(),
                    target: c.target.clone(),
                    port: port.name.clone(),
                })
            })
        })
        .collect()
}

impl<'a> Session<'a> {
    /// Build a node after its contained elements, once per id
    #[allow(clippy::type_complexity)]
    fn build_node<'s>(
        &'s mut self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<WorkflowNode>, WorkflowError>> + Send + 's>>
    where
        'a: 's,
    {
        Box::pin(async move {
            if let Some(node) = self.built.get(id) {
                return Ok(node.clone());
            }
            let (descriptor, variant, sanitized, var_name) = match self.prepared.get(id) {
                Some(p) => (p.descriptor, p.variant, p.sanitized.clone(), p.var_name.clone()),
                None => return Err(WorkflowError::config(id, "unknown node")),
            };

            let mut dependencies = Vec::with_capacity(descriptor.contained.len());
            for element in &descriptor.contained {
                dependencies.push(self.build_node(element).await?);
            }

            let header = NodeHeader {
                id: descriptor.id.clone(),
                kind_name: descriptor.kind.clone(),
                variant,
                var_name,
                parameters: sanitized.parameters,
                source: sanitized.source,
                dependencies,
            };
            let node = Arc::new(node::construct(header, self.models).await?);

            self.built.insert(id.to_string(), node.clone());
            self.arena.push(node.clone());
            Ok(node)
        })
    }
}
