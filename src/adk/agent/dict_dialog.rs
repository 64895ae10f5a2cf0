// SPDX-License-Identifier: MIT

//! Dict Dialog Agent - answers with a JSON object
//!
//! The model is asked for a JSON object. If the object has a `speak` key its
//! value becomes the message content, otherwise the whole object does; the
//! parsed object is always kept as message metadata.

use super::{prompt_history, Agent, AgentMemory};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use crate::adk::model::{Content, Model, ModelRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictDialogAgentConfig {
    pub name: String,
    #[serde(default)]
    pub sys_prompt: String,
    pub model_config_name: String,
    #[serde(default = "super::default_true")]
    pub use_memory: bool,
    /// Keys the reply object must contain
    #[serde(default)]
    pub required_keys: Vec<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

pub struct DictDialogAgent {
    config: DictDialogAgentConfig,
    model: Arc<dyn Model>,
    memory: AgentMemory,
}

impl DictDialogAgent {
    pub async fn new(
        config: DictDialogAgentConfig,
        models: &ModelRegistry,
    ) -> Result<Self, AdkError> {
        let model = models.get_model(&config.model_config_name).await?;
        Ok(Self::with_model(config, model))
    }

    pub fn with_model(config: DictDialogAgentConfig, model: Arc<dyn Model>) -> Self {
        Self {
            config,
            model,
            memory: AgentMemory::new(),
        }
    }

    fn format_instruction(&self) -> String {
        let mut instruction =
            String::from("Respond with a single JSON object and nothing else.");
        if !self.config.required_keys.is_empty() {
            instruction.push_str(&format!(
                " The object must contain the keys: {}.",
                self.config.required_keys.join(", ")
            ));
        }
        instruction
    }

    /// Parse a model reply into a JSON object, tolerating markdown fences
    fn parse_reply(&self, text: &str) -> Result<Map<String, Value>, AdkError> {
        let trimmed = strip_code_fence(text);
        let value: Value = serde_json::from_str(trimmed)?;
        let Value::Object(object) = value else {
            return Err(AdkError::InvalidResponse(format!(
                "expected a JSON object, got: {}",
                trimmed
            )));
        };

        let missing: Vec<&str> = self
            .config
            .required_keys
            .iter()
            .filter(|k| !object.contains_key(k.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(AdkError::InvalidResponse(format!(
                "reply is missing keys: {}",
                missing.join(", ")
            )));
        }

        Ok(object)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl Agent for DictDialogAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    async fn reply(&self, input: Option<Msg>) -> Result<Msg, AdkError> {
        let messages = if self.config.use_memory {
            if let Some(msg) = input {
                self.memory.add(msg);
            }
            self.memory.history()
        } else {
            input.into_iter().collect()
        };

        let mut history = prompt_history(&self.config.sys_prompt, self.name(), &messages);
        history.push(Content::text("system", self.format_instruction()));

        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            let response = self.model.generate_content(&history, None, None).await?;
            match self.parse_reply(&response.joined_text()) {
                Ok(object) => {
                    let content = object
                        .get("speak")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(object.clone()));
                    let output = Msg::new(self.name(), content, "assistant")
                        .with_metadata(Value::Object(object));
                    if self.config.use_memory {
                        self.memory.add(output.clone());
                    }
                    return Ok(output);
                }
                Err(e) => {
                    log::warn!(
                        "DictDialogAgent {} attempt {}/{} failed to parse reply: {}",
                        self.name(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AdkError::InvalidResponse("no reply from model".to_string())))
    }
}
