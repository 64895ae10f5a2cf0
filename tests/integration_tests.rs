// SPDX-License-Identifier: MIT

//! Integration tests for workflow loading, execution and code generation
//!
//! These tests drive whole workflows through the public API, using the
//! offline echo model and mock agents in place of real providers.

use async_trait::async_trait;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use workstation_rs::adk::agent::{Agent, AgentMemory};
use workstation_rs::adk::model::ModelRegistry;
use workstation_rs::adk::pipeline::{ForLoopPipeline, Operator, Pipeline};
use workstation_rs::adk::{AdkError, Msg};
use workstation_rs::workstation::workflow::condition::Callable;
use workstation_rs::workstation::workflow::{
    compile, run, CompileOptions, GraphBuilder, WorkflowConfig, WorkflowError, WorkflowGraph,
    WorkflowLoader,
};

// ============================================================================
// Mock Components
// ============================================================================

/// Mock agent that counts its replies
struct CountingAgent {
    name: String,
    calls: AtomicUsize,
    memory: AgentMemory,
}

impl CountingAgent {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            memory: AgentMemory::new(),
        }
    }
}

#[async_trait]
impl Agent for CountingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    async fn reply(&self, _input: Option<Msg>) -> Result<Msg, AdkError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Msg::new(&self.name, json!({"count": n}), "assistant"))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// An editor export: message "hello" feeding an echo dialog agent
const EDITOR_EXPORT: &str = r#"{
  "drawflow": {
    "Home": {
      "data": {
        "0": {"name": "welcome", "class": "welcome", "data": {}, "outputs": {}},
        "1": {
          "name": "echo_chat",
          "data": {"args": {"config_name": "echo", "model_name": ""}},
          "outputs": {}
        },
        "2": {
          "name": "Message",
          "data": {"args": {"name": "user", "content": "hello", "role": "user"}},
          "outputs": {"output_1": {"connections": [{"node": 3, "output": "input_1"}]}}
        },
        "3": {
          "name": "DialogAgent",
          "data": {"args": {"name": "assistant", "sys_prompt": "", "model_config_name": "echo"}},
          "outputs": {"output_1": {"connections": []}}
        }
      }
    }
  }
}"#;

async fn build(config: &WorkflowConfig) -> Result<WorkflowGraph, WorkflowError> {
    GraphBuilder::new(ModelRegistry::new()).build(config).await
}

fn parse(value: serde_json::Value) -> WorkflowConfig {
    WorkflowConfig::from_value(value).unwrap()
}

fn unformatted() -> CompileOptions {
    CompileOptions::new().with_format(false)
}

// ============================================================================
// Loading and running
// ============================================================================

#[tokio::test]
async fn test_run_editor_export() {
    let config = WorkflowLoader::parse_json(EDITOR_EXPORT).unwrap();
    assert_eq!(config.len(), 3);

    let graph = build(&config).await.unwrap();
    let summary = run(&graph).await.unwrap();

    let reply = summary.output("3").unwrap();
    assert_eq!(reply.name, "assistant");
    assert_eq!(reply.content_text(), "hello");
}

#[tokio::test]
async fn test_load_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
"1":
  name: Message
  data:
    args: {{name: user, content: "from yaml"}}
  outputs:
    output_1:
      connections: [{{node: "2", output: input_1}}]
"2":
  name: Placeholder
"#
    )
    .unwrap();

    let config = WorkflowLoader::new().load_workflow(file.path()).unwrap();
    let graph = build(&config).await.unwrap();
    let summary = run(&graph).await.unwrap();
    assert_eq!(summary.output("2").unwrap().content_text(), "from yaml");
}

#[tokio::test]
async fn test_pipeline_runs_its_elements() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "start": {
            "name": "Message",
            "data": {"args": {"name": "user", "content": "relay"}},
            "outputs": {"output_1": {"connections": [{"node": "seq", "output": "input_1"}]}}
        },
        "seq": {"name": "SequentialPipeline", "data": {"elements": ["a", "b"]}},
        "a": {"name": "DialogAgent", "data": {"args": {"name": "alice", "model_config_name": "echo"}}},
        "b": {"name": "DialogAgent", "data": {"args": {"name": "bob", "model_config_name": "echo"}}}
    }));

    let graph = build(&config).await.unwrap();
    assert!(graph.is_excluded("a"));
    assert!(graph.is_excluded("b"));

    let summary = run(&graph).await.unwrap();
    assert!(!summary.order.contains(&"a".to_string()));
    assert!(!summary.order.contains(&"b".to_string()));
    let out = summary.output("seq").unwrap();
    assert_eq!(out.name, "bob");
    assert_eq!(out.content_text(), "relay");
}

#[tokio::test]
async fn test_switch_routes_on_content() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "q": {
            "name": "Message",
            "data": {"args": {"name": "user", "content": "math"}},
            "outputs": {"output_1": {"connections": [{"node": "sw", "output": "input_1"}]}}
        },
        "sw": {
            "name": "SwitchPipeline",
            "data": {
                "args": {"cases": ["chat", "math"], "condition_func": "|x| x.content"},
                "elements": ["chat", "math"]
            }
        },
        "chat": {"name": "DialogAgent", "data": {"args": {"name": "chatter", "model_config_name": "echo"}}},
        "math": {"name": "DialogAgent", "data": {"args": {"name": "solver", "model_config_name": "echo"}}}
    }));

    let graph = build(&config).await.unwrap();
    let summary = run(&graph).await.unwrap();
    assert_eq!(summary.output("sw").unwrap().name, "solver");
}

#[tokio::test]
async fn test_msghub_broadcasts_between_participants() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "topic": {
            "name": "Message",
            "data": {"args": {"name": "user", "content": "debate"}},
            "outputs": {"output_1": {"connections": [{"node": "hub", "output": "input_1"}]}}
        },
        "hub": {
            "name": "MsgHub",
            "data": {"args": {"announcement": {"name": "Moderator", "content": "Begin"}}, "elements": ["round"]}
        },
        "round": {"name": "SequentialPipeline", "data": {"elements": ["a", "b", "a"]}},
        "a": {"name": "DialogAgent", "data": {"args": {"name": "alice", "model_config_name": "echo"}}},
        "b": {"name": "DialogAgent", "data": {"args": {"name": "bob", "model_config_name": "echo"}}}
    }));

    let graph = build(&config).await.unwrap();
    run(&graph).await.unwrap();

    let bob = graph.node("b").unwrap().agent().unwrap();
    let heard: Vec<String> = bob.memory().history().iter().map(|m| m.name.clone()).collect();
    // announcement, alice's turn, own input + reply, alice again
    assert_eq!(heard.first().map(String::as_str), Some("Moderator"));
    assert!(heard.iter().filter(|n| *n == "alice").count() >= 2);
    assert!(bob.memory().audience().is_empty());
}

#[tokio::test]
async fn test_react_agent_uses_service_elements() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "ask": {
            "name": "Message",
            "data": {"args": {"name": "user", "content": "Final Answer: 42"}},
            "outputs": {"output_1": {"connections": [{"node": "r", "output": "input_1"}]}}
        },
        "r": {
            "name": "ReActAgent",
            "data": {"args": {"name": "solver", "model_config_name": "echo", "max_iters": 1}, "elements": ["read"]}
        },
        "read": {"name": "ReadTextService", "data": {"args": {}}}
    }));

    let graph = build(&config).await.unwrap();
    assert!(graph.is_excluded("read"));
    let summary = run(&graph).await.unwrap();
    assert_eq!(summary.output("r").unwrap().content_text(), "42");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_react_agent_rejects_non_tool_elements() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "r": {
            "name": "ReActAgent",
            "data": {"args": {"name": "solver", "model_config_name": "echo"}, "elements": ["a"]}
        },
        "a": {"name": "DialogAgent", "data": {"args": {"name": "alice", "model_config_name": "echo"}}}
    }));

    let err = build(&config).await.err().unwrap();
    assert!(matches!(err, WorkflowError::TypeMismatch { ref node, .. } if node == "r"));
}

#[tokio::test]
async fn test_flow_cycle_rejected_without_loading_models() {
    let models = ModelRegistry::new();
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "1": {"name": "Placeholder", "outputs": {"o": {"connections": [{"node": "2"}]}}},
        "2": {"name": "Placeholder", "outputs": {"o": {"connections": [{"node": "3"}]}}},
        "3": {"name": "Placeholder", "outputs": {"o": {"connections": [{"node": "1"}]}}}
    }));

    let err = GraphBuilder::new(models.clone()).build(&config).await.err().unwrap();
    assert!(matches!(err, WorkflowError::CyclicWorkflow(ref ids) if ids.len() == 3));
    assert!(models.is_empty().await);
}

#[tokio::test]
async fn test_fan_in_rejected_at_run() {
    let config = parse(json!({
        "1": {"name": "Message", "data": {"args": {"name": "a", "content": "x"}},
              "outputs": {"o": {"connections": [{"node": "3"}]}}},
        "2": {"name": "Message", "data": {"args": {"name": "b", "content": "y"}},
              "outputs": {"o": {"connections": [{"node": "3"}]}}},
        "3": {"name": "Placeholder"}
    }));

    let graph = build(&config).await.unwrap();
    let err = run(&graph).await.err().unwrap();
    assert!(matches!(err, WorkflowError::TooManyPredecessors { ref node, count: 2 } if node == "3"));
}

#[tokio::test]
async fn test_unknown_kind() {
    let config = parse(json!({"1": {"name": "TeleportAgent"}}));
    let err = build(&config).await.err().unwrap();
    assert!(matches!(err, WorkflowError::UnknownKind(ref kind) if kind == "TeleportAgent"));
}

// ============================================================================
// Code generation
// ============================================================================

#[tokio::test]
async fn test_compile_editor_export() {
    let config = WorkflowLoader::parse_json(EDITOR_EXPORT).unwrap();
    let graph = build(&config).await.unwrap();
    let program = compile(&graph, &unformatted()).await.unwrap();
    let text = program.text();

    assert!(text.contains("#[tokio::main]"));
    assert!(text.contains("use workstation_rs::adk::agent::DialogAgent;"));
    let models = text.find("let models = ModelRegistry::new();").unwrap();
    let load = text.find("models.load(").unwrap();
    let flow = text.find("let mut flow: Option<Msg> = None;").unwrap();
    let message = text.find("flow = Some(message_2.clone());").unwrap();
    let agent = text.find("flow = Some(agent_3.call(flow).await?);").unwrap();
    assert!(models < load && load < flow && flow < message && message < agent);
}

#[tokio::test]
async fn test_compile_is_deterministic_across_builds() {
    let config = WorkflowLoader::parse_json(EDITOR_EXPORT).unwrap();
    let first = compile(&build(&config).await.unwrap(), &unformatted()).await.unwrap();
    let second = compile(&build(&config).await.unwrap(), &unformatted()).await.unwrap();
    assert_eq!(first.text(), second.text());
}

#[tokio::test]
async fn test_compile_emits_callables_as_source() {
    let config = parse(json!({
        "m": {"name": "echo_chat", "data": {"args": {"config_name": "echo"}}},
        "loop": {
            "name": "WhileLoopPipeline",
            "data": {"args": {"condition_func": "lambda i, x: i < 3"}, "elements": ["a"]}
        },
        "a": {"name": "DialogAgent", "data": {"args": {"name": "alice", "model_config_name": "echo"}}}
    }));

    let graph = build(&config).await.unwrap();
    let program = compile(&graph, &unformatted()).await.unwrap();
    assert!(program
        .text()
        .contains(r#"Callable::parse("lambda i, x: i < 3")?.to_loop_condition()?"#));
    assert!(program
        .imports()
        .contains(&"use workstation_rs::workstation::workflow::condition::Callable;".to_string()));
}

// ============================================================================
// Pipelines with callables
// ============================================================================

#[tokio::test]
async fn test_for_loop_break_on_callable() {
    let agent = Arc::new(CountingAgent::new("counter"));
    let as_agent: Arc<dyn Agent> = agent.clone();
    let break_func = Callable::parse("|x| x.content.count >= 3")
        .unwrap()
        .to_predicate()
        .unwrap();
    let pipeline = ForLoopPipeline::new(Operator::from(as_agent), 10, Some(break_func));

    let out = pipeline.call(None).await.unwrap().unwrap();
    assert_eq!(out.content, json!({"count": 3}));
    assert_eq!(agent.calls.load(Ordering::SeqCst), 3);
}
