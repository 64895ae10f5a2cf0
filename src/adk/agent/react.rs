// SPDX-License-Identifier: MIT

//! ReAct Agent - Reasoning + Acting pattern
//!
//! The agent reasons about what to do, calls one of its service tools, and
//! observes the result, in a Thought → Action → Observation loop that ends
//! with a final answer or after `max_iters` rounds.

use super::{Agent, AgentMemory};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use crate::adk::model::{Content, Model, ModelRegistry, Part};
use crate::adk::tool::ServiceToolkit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

fn default_max_iters() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReActAgentConfig {
    pub name: String,
    #[serde(default)]
    pub sys_prompt: String,
    pub model_config_name: String,
    #[serde(default = "default_max_iters")]
    pub max_iters: u32,
}

pub struct ReActAgent {
    config: ReActAgentConfig,
    model: Arc<dyn Model>,
    toolkit: ServiceToolkit,
    memory: AgentMemory,
}

/// ReAct step types
#[derive(Debug)]
enum ReActStep {
    /// Model is thinking/reasoning
    Thought(String),
    /// Model wants to call a tool
    Action { tool: String, args: Value },
    /// Model has a final answer
    FinalAnswer(String),
}

impl ReActAgent {
    pub async fn new(
        config: ReActAgentConfig,
        models: &ModelRegistry,
        toolkit: ServiceToolkit,
    ) -> Result<Self, AdkError> {
        let model = models.get_model(&config.model_config_name).await?;
        Ok(Self::with_model(config, model, toolkit))
    }

    pub fn with_model(config: ReActAgentConfig, model: Arc<dyn Model>, toolkit: ServiceToolkit) -> Self {
        Self {
            config,
            model,
            toolkit,
            memory: AgentMemory::new(),
        }
    }

    pub fn toolkit(&self) -> &ServiceToolkit {
        &self.toolkit
    }

    /// Build the ReAct system prompt with tool descriptions
    fn build_react_system_prompt(&self) -> String {
        let tool_section = if self.toolkit.is_empty() {
            "No tools are available. You must answer based on your knowledge.".to_string()
        } else {
            let tool_descriptions: Vec<String> = self
                .toolkit
                .tools()
                .iter()
                .map(|t| format!("- {}: {}", t.name(), t.description()))
                .collect();
            format!("Available tools:\n{}", tool_descriptions.join("\n"))
        };

        format!(
            r#"{}

For each step, first reason about what you know and what you still need (Thought), then either call a tool or give the final answer (Action).

{}

To use a tool, respond with a function call. To finish, respond with text starting with "Final Answer:" followed by your answer."#,
            self.config.sys_prompt, tool_section
        )
    }

    /// Build the current prompt including scratchpad history
    fn build_prompt_with_scratchpad(&self, input: &str, scratchpad: &[String]) -> String {
        if scratchpad.is_empty() {
            input.to_string()
        } else {
            format!(
                "{}\n\n--- Previous Steps ---\n{}\n\nContinue from where you left off.",
                input,
                scratchpad.join("\n")
            )
        }
    }

    /// Parse the model response to determine the ReAct step type
    fn parse_response(&self, response: &Content) -> ReActStep {
        for part in &response.parts {
            match part {
                Part::FunctionCall { name, args } => {
                    return ReActStep::Action {
                        tool: name.clone(),
                        args: args.clone(),
                    };
                }
                Part::Text(text) => {
                    let text_trimmed = text.trim();
                    if text_trimmed.to_lowercase().starts_with("final answer:") {
                        let answer = text_trimmed
                            .get("final answer:".len()..)
                            .unwrap_or_default()
                            .trim()
                            .to_string();
                        return ReActStep::FinalAnswer(answer);
                    }
                    if !text_trimmed.is_empty() {
                        return ReActStep::Thought(text_trimmed.to_string());
                    }
                }
                Part::FunctionResponse { .. } => {}
            }
        }
        ReActStep::Thought(String::new())
    }

    /// Execute a tool; failures become observations rather than errors
    async fn execute_tool(&self, tool_name: &str, args: Value) -> String {
        match self.toolkit.get(tool_name) {
            Some(tool) => match tool.execute(args).await {
                Ok(result) => serde_json::to_string_pretty(&result).unwrap_or_default(),
                Err(e) => format!("Error: {}", e),
            },
            None => format!("Error: Tool '{}' not found", tool_name),
        }
    }
}

#[async_trait]
impl Agent for ReActAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    async fn reply(&self, input: Option<Msg>) -> Result<Msg, AdkError> {
        let task = input.as_ref().map(Msg::content_text).unwrap_or_default();
        if let Some(msg) = input {
            self.memory.add(msg);
        }

        let system_prompt = self.build_react_system_prompt();
        let mut scratchpad: Vec<String> = Vec::new();

        for iteration in 0..self.config.max_iters {
            log::info!(
                "ReActAgent {} iteration {}/{}",
                self.name(),
                iteration + 1,
                self.config.max_iters
            );

            let history = vec![
                Content::text("system", system_prompt.clone()),
                Content::text("user", self.build_prompt_with_scratchpad(&task, &scratchpad)),
            ];

            let response = self
                .model
                .generate_content(&history, None, Some(self.toolkit.tools()))
                .await?;

            let step = self.parse_response(&response);
            log::debug!("ReActAgent step: {:?}", step);

            match step {
                ReActStep::Thought(thought) => {
                    if !thought.is_empty() {
                        scratchpad.push(format!("Thought: {}", thought));
                    }
                }
                ReActStep::Action { tool, args } => {
                    scratchpad.push(format!("Action: {}({})", tool, args));
                    let observation = self.execute_tool(&tool, args).await;
                    log::info!("Observation from {}: {}", tool, observation);
                    scratchpad.push(format!("Observation: {}", observation));
                }
                ReActStep::FinalAnswer(answer) => {
                    let output = Msg::new(self.name(), answer, "assistant");
                    self.memory.add(output.clone());
                    return Ok(output);
                }
            }
        }

        log::warn!(
            "ReActAgent {} reached max iterations ({})",
            self.name(),
            self.config.max_iters
        );

        let output = Msg::new(
            self.name(),
            format!(
                "Reached maximum iterations. Here's what I found:\n\n{}",
                scratchpad.join("\n")
            ),
            "assistant",
        );
        self.memory.add(output.clone());
        Ok(output)
    }
}
