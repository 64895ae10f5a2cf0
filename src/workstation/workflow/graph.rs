// SPDX-License-Identifier: MIT

//! Workflow graph: one arena of nodes, two relations over it
//!
//! Containment lives on the nodes themselves (each node holds its built
//! elements). Flow is a petgraph `DiGraph` over node ids, kept in a
//! [`FlowPlan`]. A node contained by anything other than a copy node is
//! excluded from top-level scheduling; copy nodes are never excluded.

use super::error::WorkflowError;
use super::node::{NodeKind, WorkflowNode};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A flow connection between two node ids, through a named output port
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub port: String,
}

/// Flow relation over a set of node ids, checked for cycles.
///
/// Edges touching excluded nodes are dropped with a warning; the scheduled
/// nodes are put in topological order.
pub struct FlowPlan {
    flow: DiGraph<String, String>,
    index: HashMap<String, NodeIndex>,
    excluded: HashSet<String>,
    order: Vec<String>,
}

impl FlowPlan {
    pub fn new<'a, I>(ids: I, excluded: HashSet<String>, edges: &[FlowEdge]) -> Result<Self, WorkflowError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flow = DiGraph::new();
        let mut index = HashMap::new();
        for id in ids {
            let ix = flow.add_node(id.to_string());
            index.insert(id.to_string(), ix);
        }

        for edge in edges {
            let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) else {
                return Err(WorkflowError::config(
                    &edge.source,
                    format!("flow edge to unknown node {}", edge.target),
                ));
            };
            if excluded.contains(&edge.source) || excluded.contains(&edge.target) {
                log::warn!(
                    "Ignoring flow edge {} -> {}: contained nodes are run by their container",
                    edge.source,
                    edge.target
                );
                continue;
            }
            // one upstream node is one predecessor, however many ports join them
            if flow.contains_edge(from, to) {
                log::debug!(
                    "Merging flow edge {} -> {} through {}",
                    edge.source,
                    edge.target,
                    edge.port
                );
                continue;
            }
            flow.add_edge(from, to, edge.port.clone());
        }

        let sorted = toposort(&flow, None).map_err(|_| cycle_error(&flow))?;
        let order = sorted
            .into_iter()
            .map(|ix| flow[ix].clone())
            .filter(|id| !excluded.contains(id))
            .collect();

        Ok(Self {
            flow,
            index,
            excluded,
            order,
        })
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&ix) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .flow
            .neighbors_directed(ix, direction)
            .map(|n| self.flow[n].as_str())
            .collect();
        // petgraph walks edges newest first
        ids.reverse();
        ids
    }
}

/// Ids of nodes contained by a non-copy container, unless they are copies
pub fn excluded_ids<'a, I>(containment: I) -> HashSet<String>
where
    I: IntoIterator<Item = (NodeKind, Vec<(&'a str, NodeKind)>)>,
{
    let mut excluded = HashSet::new();
    for (container, elements) in containment {
        if container == NodeKind::Copy {
            continue;
        }
        for (id, kind) in elements {
            if kind != NodeKind::Copy {
                excluded.insert(id.to_string());
            }
        }
    }
    excluded
}

pub struct WorkflowGraph {
    /// Nodes in construction order
    nodes: Vec<Arc<WorkflowNode>>,
    positions: HashMap<String, usize>,
    plan: FlowPlan,
}

impl WorkflowGraph {
    /// Assemble a graph from built nodes and declared flow edges.
    ///
    /// Fails with [`WorkflowError::CyclicWorkflow`] when the scheduled nodes
    /// do not form a DAG.
    pub fn new(nodes: Vec<Arc<WorkflowNode>>, edges: Vec<FlowEdge>) -> Result<Self, WorkflowError> {
        let excluded = excluded_ids(nodes.iter().map(|n| {
            (
                n.kind(),
                n.dependencies().iter().map(|d| (d.id(), d.kind())).collect(),
            )
        }));
        let plan = FlowPlan::new(nodes.iter().map(|n| n.id()), excluded, &edges)?;
        Ok(Self::from_plan(nodes, plan))
    }

    /// Pair built nodes with a flow plan computed over the same ids
    pub fn from_plan(nodes: Vec<Arc<WorkflowNode>>, plan: FlowPlan) -> Self {
        for (id, &ix) in &plan.index {
            let incoming = plan.flow.neighbors_directed(ix, Direction::Incoming).count();
            if incoming > 1 {
                log::warn!("Node {} has {} flow predecessors", id, incoming);
            }
        }

        let positions = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id().to_string(), i))
            .collect();
        Self {
            nodes,
            positions,
            plan,
        }
    }

    /// Nodes in construction order; contained elements precede containers
    pub fn nodes(&self) -> &[Arc<WorkflowNode>] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Arc<WorkflowNode>> {
        self.positions.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.plan.excluded.contains(id)
    }

    /// Scheduled node ids in topological order
    pub fn order(&self) -> &[String] {
        &self.plan.order
    }

    pub fn flow(&self) -> &DiGraph<String, String> {
        &self.plan.flow
    }

    /// Upstream flow neighbours of a node
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.plan.neighbors(id, Direction::Incoming)
    }

    /// Downstream flow neighbours of a node
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.plan.neighbors(id, Direction::Outgoing)
    }

    /// A service node outside the flow: scheduled but does nothing
    pub fn is_inert(&self, id: &str) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        node.kind() == NodeKind::Service
            && self.predecessors(id).is_empty()
            && self.successors(id).is_empty()
    }
}

fn cycle_error(flow: &DiGraph<String, String>) -> WorkflowError {
    let mut ids: Vec<String> = tarjan_scc(flow)
        .into_iter()
        .filter(|scc| scc.len() > 1 || flow.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|ix| flow[ix].clone())
        .collect();
    ids.sort();
    WorkflowError::CyclicWorkflow(ids)
}

impl fmt::Debug for WorkflowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("nodes", &self.nodes)
            .field("order", &self.plan.order)
            .field("excluded", &self.plan.excluded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::ModelRegistry;
    use crate::workstation::workflow::node::tests::{build, echo_models};
    use serde_json::json;

    fn edge(source: &str, target: &str) -> FlowEdge {
        FlowEdge {
            source: source.to_string(),
            target: target.to_string(),
            port: "output_1".to_string(),
        }
    }

    async fn message(id: &str) -> Arc<WorkflowNode> {
        build(id, "Message", json!({"name": "n", "content": id}), vec![], &ModelRegistry::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_order_follows_flow() {
        let nodes = vec![message("a").await, message("b").await, message("c").await];
        let graph = WorkflowGraph::new(nodes, vec![edge("c", "b"), edge("b", "a")]).unwrap();
        assert_eq!(graph.order(), ["c", "b", "a"]);
        assert_eq!(graph.predecessors("a"), vec!["b"]);
        assert_eq!(graph.successors("c"), vec!["b"]);
    }

    #[tokio::test]
    async fn test_parallel_ports_count_as_one_predecessor() {
        let nodes = vec![message("a").await, message("b").await];
        let mut second = edge("a", "b");
        second.port = "output_2".to_string();
        let graph = WorkflowGraph::new(nodes, vec![edge("a", "b"), second, edge("a", "b")]).unwrap();
        assert_eq!(graph.predecessors("b"), vec!["a"]);
        assert_eq!(graph.successors("a"), vec!["b"]);
        assert_eq!(graph.flow().edge_count(), 1);
    }

    #[tokio::test]
    async fn test_cycle_reports_members() {
        let nodes = vec![message("a").await, message("b").await, message("c").await];
        let err = WorkflowGraph::new(nodes, vec![edge("a", "b"), edge("b", "a"), edge("b", "c")])
            .err()
            .unwrap();
        assert!(matches!(err, WorkflowError::CyclicWorkflow(ref ids) if ids == &["a", "b"]));
    }

    #[tokio::test]
    async fn test_self_loop_is_a_cycle() {
        let err = WorkflowGraph::new(vec![message("a").await], vec![edge("a", "a")])
            .err()
            .unwrap();
        assert!(matches!(err, WorkflowError::CyclicWorkflow(ref ids) if ids == &["a"]));
    }

    #[tokio::test]
    async fn test_contained_nodes_excluded_unless_copy() {
        let models = echo_models().await;
        let agent = build(
            "1",
            "DialogAgent",
            json!({"name": "a", "model_config_name": "echo"}),
            vec![],
            &models,
        )
        .await
        .unwrap();
        let copy = build("2", "CopyNode", json!({}), vec![agent.clone()], &models)
            .await
            .unwrap();
        let pipeline = build("3", "SequentialPipeline", json!({}), vec![copy.clone()], &models)
            .await
            .unwrap();

        let graph = WorkflowGraph::new(vec![agent, copy, pipeline], vec![]).unwrap();
        assert!(!graph.is_excluded("1"));
        assert!(!graph.is_excluded("2"));
        assert_eq!(graph.order().len(), 3);
    }

    #[tokio::test]
    async fn test_edges_into_contained_nodes_ignored() {
        let models = echo_models().await;
        let agent = build(
            "1",
            "DialogAgent",
            json!({"name": "a", "model_config_name": "echo"}),
            vec![],
            &models,
        )
        .await
        .unwrap();
        let pipeline = build("2", "SequentialPipeline", json!({}), vec![agent.clone()], &models)
            .await
            .unwrap();
        let start = message("0").await;

        let graph =
            WorkflowGraph::new(vec![start, agent, pipeline], vec![edge("0", "1"), edge("0", "2")])
                .unwrap();
        assert!(graph.is_excluded("1"));
        assert_eq!(graph.order(), ["0", "2"]);
        assert_eq!(graph.predecessors("1"), Vec::<&str>::new());
    }

    #[tokio::test]
    async fn test_unwired_service_is_inert() {
        let models = ModelRegistry::new();
        let service = build("s", "ReadTextService", json!({}), vec![], &models)
            .await
            .unwrap();
        let graph = WorkflowGraph::new(vec![service], vec![]).unwrap();
        assert!(graph.is_inert("s"));
    }
}
