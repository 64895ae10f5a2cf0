// SPDX-License-Identifier: MIT

//! In-process execution of a workflow graph
//!
//! Scheduled nodes run one at a time in topological order. Each node gets
//! the output of its single flow predecessor, or nothing when it has none.

use super::error::WorkflowError;
use super::graph::WorkflowGraph;
use super::node::Executable;
use crate::adk::message::Msg;
use std::collections::HashMap;

/// What a run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Node ids in the order they ran
    pub order: Vec<String>,
    /// Final output of every node without scheduled successors
    pub outputs: Vec<(String, Option<Msg>)>,
}

impl RunSummary {
    /// Output of a terminal node
    pub fn output(&self, id: &str) -> Option<&Msg> {
        self.outputs
            .iter()
            .find(|(node, _)| node == id)
            .and_then(|(_, msg)| msg.as_ref())
    }
}

/// Run every scheduled node once.
///
/// Fails up front with [`WorkflowError::TooManyPredecessors`] when a node
/// has more than one flow predecessor; node failures abort the run.
pub async fn run(graph: &WorkflowGraph) -> Result<RunSummary, WorkflowError> {
    for id in graph.order() {
        let count = graph.predecessors(id).len();
        if count > 1 {
            return Err(WorkflowError::TooManyPredecessors {
                node: id.clone(),
                count,
            });
        }
    }

    log::info!("Running workflow: {} scheduled nodes", graph.order().len());
    let mut cache: HashMap<&str, Option<Msg>> = HashMap::new();
    let mut summary = RunSummary::default();

    for id in graph.order() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        if graph.is_inert(id) {
            log::debug!("Skipping service node {}: not wired into the flow", id);
            continue;
        }

        let input = graph
            .predecessors(id)
            .first()
            .and_then(|p| cache.get(p).cloned())
            .flatten();
        log::debug!("Node {} input: {:?}", id, input);

        let output = node.execute(input).await?;
        log::debug!("Node {} output: {:?}", id, output);

        summary.order.push(id.clone());
        cache.insert(id.as_str(), output);
    }

    for id in &summary.order {
        if graph.successors(id).is_empty() {
            let output = cache.remove(id.as_str()).flatten();
            summary.outputs.push((id.clone(), output));
        }
    }

    Ok(summary)
}
