// SPDX-License-Identifier: MIT

//! Dialog Agent - a plain conversational agent backed by one model

use super::{prompt_history, Agent, AgentMemory};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use crate::adk::model::{Model, ModelRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogAgentConfig {
    pub name: String,
    #[serde(default)]
    pub sys_prompt: String,
    pub model_config_name: String,
    #[serde(default = "super::default_true")]
    pub use_memory: bool,
}

pub struct DialogAgent {
    config: DialogAgentConfig,
    model: Arc<dyn Model>,
    memory: AgentMemory,
}

impl DialogAgent {
    /// Create an agent whose model is resolved from the registry
    pub async fn new(config: DialogAgentConfig, models: &ModelRegistry) -> Result<Self, AdkError> {
        let model = models.get_model(&config.model_config_name).await?;
        Ok(Self::with_model(config, model))
    }

    pub fn with_model(config: DialogAgentConfig, model: Arc<dyn Model>) -> Self {
        Self {
            config,
            model,
            memory: AgentMemory::new(),
        }
    }
}

#[async_trait]
impl Agent for DialogAgent {
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

        let history = prompt_history(&self.config.sys_prompt, self.name(), &messages);
        let response = self.model.generate_content(&history, None, None).await?;

        let output = Msg::new(self.name(), response.joined_text(), "assistant");
        log::debug!("{}: {}", self.name(), output.content_text());

        if self.config.use_memory {
            self.memory.add(output.clone());
        }
        Ok(output)
    }
}
