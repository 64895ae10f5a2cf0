// SPDX-License-Identifier: MIT

//! Pipeline nodes compose their contained elements
//!
//! | Kind                 | Elements            | Parameters                         |
//! |----------------------|---------------------|------------------------------------|
//! | `Placeholder`        | 0                   |                                    |
//! | `SequentialPipeline` | any                 |                                    |
//! | `ForLoopPipeline`    | 1                   | `max_loop`, `break_func: \|x\|`     |
//! | `WhileLoopPipeline`  | 1                   | `condition_func: \|i, x\|`          |
//! | `IfElsePipeline`     | 1 or 2              | `condition_func: \|x\|`             |
//! | `SwitchPipeline`     | cases, or cases + 1 | `cases`, `condition_func: \|x\|`    |
//! | `MsgHub`             | 1 pipeline          | `announcement: {name, content}`    |

use super::codegen::{callable_expr, json_expr, str_lit, USE_CALLABLE, USE_OPERATOR};
use super::{Emission, Emittable, Executable, NodeHeader, NodeKind, Variant, WorkflowNode};
use crate::adk::agent::Agent;
use crate::adk::message::Msg;
use crate::adk::pipeline::{
    ForLoopPipeline, IfElsePipeline, MsgHubPipeline, Operator, SequentialPipeline, SwitchPipeline,
    WhileLoopPipeline,
};
use crate::workstation::workflow::condition::Callable;
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const WHILE_DEFAULT: &str = "|i, x| false";
const IF_ELSE_DEFAULT: &str = "|x| true";

/// What a pipeline node does with its elements
pub enum Composition {
    Placeholder,
    Sequential,
    ForLoop {
        max_loop: usize,
        break_func: Option<Callable>,
    },
    WhileLoop {
        condition: Callable,
    },
    IfElse {
        condition: Callable,
    },
    Switch {
        selector: Callable,
        cases: Vec<String>,
        /// Whether the trailing element is the default branch
        has_default: bool,
    },
    MsgHub {
        participants: Vec<Arc<WorkflowNode>>,
        announcement: Msg,
    },
}

pub struct PipelineNode {
    operator: Operator,
    composition: Composition,
}

fn operand(header: &NodeHeader, dep: &WorkflowNode) -> Result<Operator, WorkflowError> {
    dep.operator().ok_or_else(|| {
        header.type_mismatch(format!(
            "element {} ({}) is neither an agent nor a pipeline",
            dep.id(),
            dep.kind_name()
        ))
    })
}

/// A callable parameter, falling back to `default` when absent
fn callable(header: &NodeHeader, key: &str, default: Option<&str>) -> Result<Option<Callable>, WorkflowError> {
    if let Some(callable) = header.parameters.callable(key) {
        return Ok(Some(callable.clone()));
    }
    if header.parameters.get(key).is_some() {
        return Err(header.config_error(format!(
            "'{}' must be a callable expression such as '|x| x.content == \"done\"'",
            key
        )));
    }
    default
        .map(Callable::parse)
        .transpose()
        .map_err(|e| header.config_error(e.to_string()))
}

fn required_callable(header: &NodeHeader, key: &str) -> Result<Callable, WorkflowError> {
    callable(header, key, None)?
        .ok_or_else(|| header.config_error(format!("{} requires '{}'", header.kind_name, key)))
}

/// Attach the node id to an arity error
fn in_node<T>(header: &NodeHeader, result: Result<T, WorkflowError>) -> Result<T, WorkflowError> {
    result.map_err(|e| header.config_error(e.to_string()))
}

fn max_loop(header: &NodeHeader) -> Result<usize, WorkflowError> {
    let parsed = match header.parameters.get("max_loop") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        None => {
            return Err(header.config_error("ForLoopPipeline requires 'max_loop'"));
        }
        _ => None,
    };
    parsed.ok_or_else(|| header.config_error("'max_loop' must be a non-negative integer"))
}

fn case_labels(header: &NodeHeader) -> Vec<String> {
    match header.parameters.get("cases") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Agents reachable through nested pipelines, first occurrence wins
fn collect_participants(
    header: &NodeHeader,
    node: &Arc<WorkflowNode>,
    participants: &mut Vec<Arc<WorkflowNode>>,
) -> Result<(), WorkflowError> {
    match node.kind() {
        NodeKind::Agent => {
            if !participants.iter().any(|p| Arc::ptr_eq(p, node)) {
                participants.push(node.clone());
            }
            Ok(())
        }
        NodeKind::Pipeline | NodeKind::Copy => {
            for dep in node.dependencies() {
                collect_participants(header, dep, participants)?;
            }
            Ok(())
        }
        other => Err(header.type_mismatch(format!(
            "hub member {} is a {} node, expected agents or pipelines",
            node.id(),
            other
        ))),
    }
}

fn announcement(header: &NodeHeader) -> Msg {
    let configured = header.parameters.get("announcement");
    let name = configured
        .and_then(|a| a.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Host");
    let content = configured
        .and_then(|a| a.get("content"))
        .filter(|c| c.as_str() != Some(""))
        .cloned()
        .unwrap_or_else(|| Value::String("Welcome!".to_string()));
    Msg::new(name, content, "system")
}

impl PipelineNode {
    pub(super) fn construct(header: &NodeHeader) -> Result<Self, WorkflowError> {
        let deps = &header.dependencies;

        let (operator, composition) = match header.variant {
            Variant::Placeholder => {
                header.expect_dependencies(0)?;
                (Operator::Placeholder, Composition::Placeholder)
            }
            Variant::Sequential => {
                let operators = deps
                    .iter()
                    .map(|d| operand(header, d))
                    .collect::<Result<Vec<_>, _>>()?;
                (
                    Operator::pipeline(SequentialPipeline::new(operators)),
                    Composition::Sequential,
                )
            }
            Variant::ForLoop => {
                header.expect_dependencies(1)?;
                let body = operand(header, &deps[0])?;
                let max_loop = max_loop(header)?;
                let break_func = callable(header, "break_func", None)?;
                let predicate = break_func
                    .as_ref()
                    .map(|c| in_node(header, c.to_predicate()))
                    .transpose()?;
                (
                    Operator::pipeline(ForLoopPipeline::new(body, max_loop, predicate)),
                    Composition::ForLoop {
                        max_loop,
                        break_func,
                    },
                )
            }
            Variant::WhileLoop => {
                header.expect_dependencies(1)?;
                let body = operand(header, &deps[0])?;
                let condition = callable(header, "condition_func", Some(WHILE_DEFAULT))?
                    .ok_or_else(|| header.config_error("missing loop condition"))?;
                let loop_condition = in_node(header, condition.to_loop_condition())?;
                (
                    Operator::pipeline(WhileLoopPipeline::new(body, loop_condition)),
                    Composition::WhileLoop { condition },
                )
            }
            Variant::IfElse => {
                if deps.is_empty() || deps.len() > 2 {
                    return Err(header.config_error(format!(
                        "IfElsePipeline takes 1 or 2 contained elements, found {}",
                        deps.len()
                    )));
                }
                let if_body = operand(header, &deps[0])?;
                let else_body = match deps.get(1) {
                    Some(dep) => operand(header, dep)?,
                    None => Operator::Placeholder,
                };
                let condition = callable(header, "condition_func", Some(IF_ELSE_DEFAULT))?
                    .ok_or_else(|| header.config_error("missing branch condition"))?;
                let predicate = in_node(header, condition.to_predicate())?;
                (
                    Operator::pipeline(IfElsePipeline::new(predicate, if_body, else_body)),
                    Composition::IfElse { condition },
                )
            }
            Variant::Switch => {
                let cases = case_labels(header);
                let has_default = if deps.is_empty() {
                    return Err(header.config_error("SwitchPipeline needs at least one contained element"));
                } else if deps.len() == cases.len() {
                    false
                } else if deps.len() == cases.len() + 1 {
                    true
                } else {
                    return Err(header.config_error(format!(
                        "SwitchPipeline has {} case(s) but {} contained element(s)",
                        cases.len(),
                        deps.len()
                    )));
                };

                let selector = required_callable(header, "condition_func")?;
                let select = in_node(header, selector.to_selector())?;
                let branches = cases
                    .iter()
                    .zip(deps.iter())
                    .map(|(label, dep)| operand(header, dep).map(|op| (label.clone(), op)))
                    .collect::<Result<Vec<_>, _>>()?;
                let default = match (has_default, deps.last()) {
                    (true, Some(dep)) => operand(header, dep)?,
                    _ => Operator::Placeholder,
                };
                (
                    Operator::pipeline(SwitchPipeline::new(select, branches, default)),
                    Composition::Switch {
                        selector,
                        cases,
                        has_default,
                    },
                )
            }
            Variant::MsgHub => {
                header.expect_dependencies(1)?;
                let body = &deps[0];
                if body.kind() != NodeKind::Pipeline {
                    return Err(header.type_mismatch(format!(
                        "MsgHub wraps a pipeline, element {} is a {} node",
                        body.id(),
                        body.kind()
                    )));
                }
                let mut participants = Vec::new();
                for dep in body.dependencies() {
                    collect_participants(header, dep, &mut participants)?;
                }
                let agents: Vec<Arc<dyn Agent>> =
                    participants.iter().filter_map(|p| p.agent()).collect();
                let announcement = announcement(header);
                (
                    Operator::pipeline(MsgHubPipeline::new(
                        operand(header, body)?,
                        agents,
                        Some(announcement.clone()),
                    )),
                    Composition::MsgHub {
                        participants,
                        announcement,
                    },
                )
            }
            other => return Err(header.config_error(format!("{:?} is not a pipeline", other))),
        };

        Ok(Self {
            operator,
            composition,
        })
    }

    pub fn operator(&self) -> Operator {
        self.operator.clone()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }
}

#[async_trait]
impl Executable for PipelineNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        Ok(self.operator.call(input).await?)
    }
}

fn operand_expr(node: &WorkflowNode) -> String {
    node.operator_expr()
        .unwrap_or_else(|| "Operator::Placeholder".to_string())
}

impl Emittable for PipelineNode {
    fn emit(&self, header: &NodeHeader) -> Emission {
        let deps = &header.dependencies;
        let mut imports = vec![USE_OPERATOR.to_string()];
        let mut pipeline_import = |name: &str| {
            imports.push(format!("use workstation_rs::adk::pipeline::{};", name));
        };

        let value = match &self.composition {
            Composition::Placeholder => "Operator::Placeholder".to_string(),
            Composition::Sequential => {
                pipeline_import("SequentialPipeline");
                let operators: Vec<String> = deps.iter().map(|d| operand_expr(d)).collect();
                format!(
                    "Operator::pipeline(SequentialPipeline::new(vec![{}]))",
                    operators.join(", ")
                )
            }
            Composition::ForLoop {
                max_loop,
                break_func,
            } => {
                pipeline_import("ForLoopPipeline");
                let break_func = match break_func {
                    Some(c) => format!("Some({})", callable_expr(c.source(), "to_predicate")),
                    None => "None".to_string(),
                };
                format!(
                    "Operator::pipeline(ForLoopPipeline::new({}, {}, {}))",
                    operand_expr(&deps[0]),
                    max_loop,
                    break_func
                )
            }
            Composition::WhileLoop { condition } => {
                pipeline_import("WhileLoopPipeline");
                format!(
                    "Operator::pipeline(WhileLoopPipeline::new({}, {}))",
                    operand_expr(&deps[0]),
                    callable_expr(condition.source(), "to_loop_condition")
                )
            }
            Composition::IfElse { condition } => {
                pipeline_import("IfElsePipeline");
                let else_body = deps
                    .get(1)
                    .map(|d| operand_expr(d))
                    .unwrap_or_else(|| "Operator::Placeholder".to_string());
                format!(
                    "Operator::pipeline(IfElsePipeline::new({}, {}, {}))",
                    callable_expr(condition.source(), "to_predicate"),
                    operand_expr(&deps[0]),
                    else_body
                )
            }
            Composition::Switch {
                selector,
                cases,
                has_default,
            } => {
                pipeline_import("SwitchPipeline");
                let branches: Vec<String> = cases
                    .iter()
                    .zip(deps.iter())
                    .map(|(label, dep)| format!("({}.to_string(), {})", str_lit(label), operand_expr(dep)))
                    .collect();
                let default = match (has_default, deps.last()) {
                    (true, Some(dep)) => operand_expr(dep),
                    _ => "Operator::Placeholder".to_string(),
                };
                format!(
                    "Operator::pipeline(SwitchPipeline::new({}, vec![{}], {}))",
                    callable_expr(selector.source(), "to_selector"),
                    branches.join(", "),
                    default
                )
            }
            Composition::MsgHub {
                participants,
                announcement,
            } => {
                pipeline_import("MsgHubPipeline");
                let agents: Vec<String> = participants.iter().filter_map(|p| p.agent_expr()).collect();
                format!(
                    "Operator::pipeline(MsgHubPipeline::new({}, vec![{}], Some(Msg::new({}, {}, {}))))",
                    operand_expr(&deps[0]),
                    agents.join(", "),
                    str_lit(&announcement.name),
                    json_expr(&announcement.content),
                    str_lit(&announcement.role)
                )
            }
        };

        let uses_callable = matches!(
            self.composition,
            Composition::ForLoop { break_func: Some(_), .. }
                | Composition::WhileLoop { .. }
                | Composition::IfElse { .. }
                | Composition::Switch { .. }
        );
        if uses_callable {
            imports.push(USE_CALLABLE.to_string());
        }

        Emission {
            imports,
            init: vec![format!("let {} = {};", header.var_name, value)],
            exec: Some(format!("flow = {}.call(flow).await?;", header.var_name)),
        }
    }
}
