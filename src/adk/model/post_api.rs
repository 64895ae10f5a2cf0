// SPDX-License-Identifier: MIT

//! Generic POST API models
//!
//! `post_api_chat` sends the conversation as an OpenAI-style `messages`
//! array; `post_api_dall_e` sends the last user turn as a `prompt`. Both
//! merge `generate_args` into the JSON body and send the configured headers.

use super::{Content, GenerationConfig, Model, ModelConfig, Part};
use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Chat,
    Image,
}

pub struct PostApiModel {
    client: Client,
    mode: Mode,
    api_url: String,
    model_name: Option<String>,
    headers: Map<String, Value>,
    generate_args: Map<String, Value>,
}

impl PostApiModel {
    pub fn chat(config: &ModelConfig) -> Result<Self, AdkError> {
        Self::build(config, Mode::Chat)
    }

    pub fn dall_e(config: &ModelConfig) -> Result<Self, AdkError> {
        Self::build(config, Mode::Image)
    }

    fn build(config: &ModelConfig, mode: Mode) -> Result<Self, AdkError> {
        let api_url = config.base_url.clone().ok_or_else(|| {
            AdkError::config(format!(
                "model config '{}' needs an api_url",
                config.config_name
            ))
        })?;

        let mut headers = config.headers.clone();
        if let Some(key) = &config.api_key {
            headers
                .entry("Authorization")
                .or_insert_with(|| json!(format!("Bearer {}", key)));
        }

        Ok(Self {
            client: Client::new(),
            mode,
            api_url,
            model_name: config.model_name.clone(),
            headers,
            generate_args: config.generate_args.clone(),
        })
    }

    fn request_body(&self, history: &[Content]) -> Value {
        let mut body = Map::new();
        if let Some(name) = &self.model_name {
            body.insert("model".to_string(), json!(name));
        }
        body.extend(self.generate_args.clone());

        match self.mode {
            Mode::Chat => {
                let messages: Vec<Value> = history
                    .iter()
                    .map(|c| {
                        let role = if c.role == "model" { "assistant" } else { c.role.as_str() };
                        json!({"role": role, "content": c.joined_text()})
                    })
                    .collect();
                body.insert("messages".to_string(), json!(messages));
            }
            Mode::Image => {
                let prompt = history
                    .iter()
                    .rev()
                    .find(|c| c.role != "system")
                    .map(Content::joined_text)
                    .unwrap_or_default();
                body.insert("prompt".to_string(), json!(prompt));
            }
        }

        Value::Object(body)
    }

    /// Pull the generated text (or image url) out of a response body
    fn extract_text(response: &Value) -> Result<String, AdkError> {
        let candidates = [
            response.pointer("/choices/0/message/content"),
            response.pointer("/data/0/url"),
            response.pointer("/output/text"),
            response.get("text"),
        ];

        candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| {
                AdkError::InvalidResponse(format!("no text in POST API response: {}", response))
            })
    }
}

#[async_trait]
impl Model for PostApiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError> {
        let body = self.request_body(history);
        log::debug!("POST {} body: {}", self.api_url, body);

        let mut request = self.client.post(&self.api_url).json(&body);
        for (key, value) in &self.headers {
            if let Some(v) = value.as_str() {
                request = request.header(key.as_str(), v);
            }
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(AdkError::api("post_api", text));
        }

        let resp_json: Value = resp.json().await?;
        let text = Self::extract_text(&resp_json)?;

        Ok(Content {
            role: "model".to_string(),
            parts: vec![Part::Text(text)],
        })
    }
}
