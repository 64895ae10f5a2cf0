// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for AI workflows
//!
//! This module provides the core Agent trait and implementations:
//! - `DialogAgent` - plain conversational agent
//! - `DictDialogAgent` - agent answering with a JSON object
//! - `UserAgent` - human proxy reading from an input stream
//! - `ReActAgent` - Reasoning + Acting pattern agent with tools

mod dialog;
mod dict_dialog;
mod react;
mod user;

pub use dialog::{DialogAgent, DialogAgentConfig};
pub use dict_dialog::{DictDialogAgent, DictDialogAgentConfig};
pub use react::{ReActAgent, ReActAgentConfig};
pub use user::{UserAgent, UserAgentConfig};

use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use crate::adk::model::Content;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Weak};

/// Core agent trait for all agent types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// The agent's conversation memory and broadcast audience
    fn memory(&self) -> &AgentMemory;

    /// Produce a reply to the given input
    async fn reply(&self, input: Option<Msg>) -> Result<Msg, AdkError>;

    /// Record a message without replying
    fn observe(&self, msg: Msg) {
        self.memory().add(msg);
    }

    /// Reply, then broadcast the reply to the current audience
    async fn call(&self, input: Option<Msg>) -> Result<Msg, AdkError> {
        let output = self.reply(input).await?;
        for listener in self.memory().audience() {
            listener.observe(output.clone());
        }
        Ok(output)
    }
}

/// Conversation history plus the agents that hear this agent's replies.
///
/// The audience holds weak handles so agents that listen to each other do
/// not keep each other alive.
#[derive(Default)]
pub struct AgentMemory {
    history: Mutex<Vec<Msg>>,
    audience: Mutex<Vec<Weak<dyn Agent>>>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, msg: Msg) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(msg);
    }

    pub fn history(&self) -> Vec<Msg> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn set_audience(&self, audience: Vec<Weak<dyn Agent>>) {
        *self.audience.lock().unwrap_or_else(|e| e.into_inner()) = audience;
    }

    pub fn clear_audience(&self) {
        self.audience
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Listeners that are still alive
    pub fn audience(&self) -> Vec<Arc<dyn Agent>> {
        self.audience
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

fn default_true() -> bool {
    true
}

/// Model-facing view of a message from `speaker`'s point of view
pub(crate) fn msg_to_content(msg: &Msg, speaker: &str) -> Content {
    let role = if msg.role == "system" {
        "system"
    } else if msg.name == speaker {
        "model"
    } else {
        "user"
    };
    Content::text(role, msg.content_text())
}

/// System prompt followed by the conversation so far
pub(crate) fn prompt_history(sys_prompt: &str, speaker: &str, messages: &[Msg]) -> Vec<Content> {
    let mut history = Vec::with_capacity(messages.len() + 1);
    if !sys_prompt.is_empty() {
        history.push(Content::text("system", sys_prompt));
    }
    history.extend(messages.iter().map(|m| msg_to_content(m, speaker)));
    history
}
