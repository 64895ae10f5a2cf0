// SPDX-License-Identifier: MIT

//! Offline model that answers with the last non-system turn it was given.
//! Useful for dry runs of a workflow and in tests.

use super::{Content, GenerationConfig, Model};
use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct EchoModel;

impl EchoModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Model for EchoModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError> {
        let text = history
            .iter()
            .rev()
            .find(|c| c.role != "system")
            .map(Content::joined_text)
            .unwrap_or_default();
        Ok(Content::text("model", text))
    }
}
