// SPDX-License-Identifier: MIT

//! Code generation for a workflow graph
//!
//! The program declares a model registry, loads every model configuration,
//! constructs every node (elements before their containers) and then runs
//! the scheduled nodes in topological order, threading one `flow` variable.

use super::error::WorkflowError;
use super::graph::WorkflowGraph;
use super::node::NodeKind;
use super::program::GeneratedProgram;
use std::path::PathBuf;

const ROOT_IMPORTS: [&str; 4] = [
    "use std::sync::Arc;",
    "use serde_json::json;",
    "use workstation_rs::adk::model::ModelRegistry;",
    "use workstation_rs::adk::Msg;",
];

const ROOT_INIT: &str = "let models = ModelRegistry::new();";
const FLOW_INIT: &str = "let mut flow: Option<Msg> = None;";

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Run the output through rustfmt
    pub format: bool,
    /// Where to write the program, if anywhere
    pub destination: Option<PathBuf>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self {
            format: true,
            destination: None,
        }
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }
}

/// Generate the standalone program equivalent to running `graph`
pub async fn compile(graph: &WorkflowGraph, options: &CompileOptions) -> Result<GeneratedProgram, WorkflowError> {
    let mut imports: Vec<String> = ROOT_IMPORTS.iter().map(|s| s.to_string()).collect();
    let mut model_inits = Vec::new();
    let mut other_inits = Vec::new();

    for node in graph.nodes() {
        let emission = node.emit();
        imports.extend(emission.imports);
        if node.kind() == NodeKind::Model {
            model_inits.extend(emission.init);
        } else {
            other_inits.extend(emission.init);
        }
    }

    let mut inits = vec![ROOT_INIT.to_string()];
    inits.extend(model_inits);
    inits.push(FLOW_INIT.to_string());
    inits.extend(other_inits);

    let mut execs = Vec::new();
    for id in graph.order() {
        if graph.is_inert(id) {
            continue;
        }
        if let Some(exec) = graph.node(id).and_then(|n| n.emit().exec) {
            execs.push(exec);
        }
    }

    let mut program = GeneratedProgram::new(imports, inits, execs);
    if options.format {
        program = program.format().await;
    }
    if let Some(path) = &options.destination {
        program.write(path).await?;
    }

    log::info!(
        "Compiled workflow: {} init statements, {} exec statements",
        program.inits().len(),
        program.execs().len()
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::ModelRegistry;
    use crate::workstation::workflow::builder::GraphBuilder;
    use crate::workstation::workflow::types::{NodeDescriptor, WorkflowConfig};
    use serde_json::json;

    fn unformatted() -> CompileOptions {
        CompileOptions::new().with_format(false)
    }

    async fn graph(nodes: Vec<NodeDescriptor>) -> WorkflowGraph {
        GraphBuilder::new(ModelRegistry::new())
            .build(&WorkflowConfig::new(nodes))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_model_inits_follow_root_init() {
        let graph = graph(vec![
            NodeDescriptor::new("1", "Message")
                .with_parameters(json!({"name": "user", "content": "hi"}))
                .connect("output_1", "3"),
            NodeDescriptor::new("2", "echo_chat").with_parameters(json!({"config_name": "echo"})),
            NodeDescriptor::new("3", "DialogAgent")
                .with_parameters(json!({"name": "bot", "model_config_name": "echo"})),
        ])
        .await;

        let program = compile(&graph, &unformatted()).await.unwrap();
        let inits = program.inits();
        assert_eq!(inits[0], ROOT_INIT);
        assert!(inits[1].starts_with("models.load("));
        assert_eq!(inits[2], FLOW_INIT);
        assert!(inits[3].starts_with("let message_1: Msg"));
        assert!(inits[4].starts_with("let agent_3: Arc<dyn Agent>"));
        assert_eq!(
            program.execs(),
            ["flow = Some(message_1.clone());", "flow = Some(agent_3.call(flow).await?);"]
        );
    }

    #[tokio::test]
    async fn test_contained_elements_have_inits_but_no_execs() {
        let graph = graph(vec![
            NodeDescriptor::new("m", "echo_chat").with_parameters(json!({"config_name": "echo"})),
            NodeDescriptor::new("p", "SequentialPipeline").with_contained(["a"]),
            NodeDescriptor::new("a", "DialogAgent")
                .with_parameters(json!({"name": "a", "model_config_name": "echo"})),
        ])
        .await;

        let program = compile(&graph, &unformatted()).await.unwrap();
        let agent_init = program.inits().iter().position(|l| l.starts_with("let agent_a")).unwrap();
        let pipeline_init = program.inits().iter().position(|l| l.starts_with("let pipeline_p")).unwrap();
        assert!(agent_init < pipeline_init);
        assert_eq!(program.execs(), ["flow = pipeline_p.call(flow).await?;"]);
    }

    #[tokio::test]
    async fn test_compile_is_repeatable() {
        let graph = graph(vec![
            NodeDescriptor::new("1", "Placeholder").connect("output_1", "2"),
            NodeDescriptor::new("2", "Placeholder"),
            NodeDescriptor::new("s", "BingSearchService").with_parameters(json!({"num_results": 2})),
        ])
        .await;

        let first = compile(&graph, &unformatted()).await.unwrap();
        let second = compile(&graph, &unformatted()).await.unwrap();
        assert_eq!(first.text(), second.text());
        // the unwired service is constructed but never run
        assert!(first.text().contains("let service_s: Arc<dyn Tool>"));
        assert!(!first.text().contains("invoke(&service_s"));
    }

    #[tokio::test]
    async fn test_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.rs");
        let graph = graph(vec![NodeDescriptor::new("1", "Placeholder")]).await;

        let program = compile(&graph, &unformatted().with_destination(&path))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), program.text());
    }
}
