// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat completions
//!
//! Serves both `openai_chat` and `dashscope_chat`; DashScope exposes the same
//! wire format on its compatible-mode endpoint.

use super::{Content, GenerationConfig, Model, ModelConfig, Part};
use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::env;
use std::sync::Arc;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Chat model speaking the OpenAI chat completions protocol
pub struct OpenAIChatModel {
    client: Client,
    provider: &'static str,
    api_key: String,
    model_name: String,
    base_url: String,
    headers: Map<String, Value>,
    generate_args: Map<String, Value>,
}

impl OpenAIChatModel {
    /// Create an OpenAI model from a configuration.
    ///
    /// Falls back to `OPENAI_API_KEY` and `OPENAI_BASE_URL` when the
    /// configuration leaves them out.
    pub fn openai(config: &ModelConfig) -> Result<Self, AdkError> {
        let base_url = config
            .base_url
            .clone()
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        Self::build("openai", config, "OPENAI_API_KEY", base_url, "gpt-4o-mini")
    }

    /// Create a DashScope model from a configuration (`DASHSCOPE_API_KEY`)
    pub fn dashscope(config: &ModelConfig) -> Result<Self, AdkError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DASHSCOPE_BASE_URL.to_string());
        Self::build("dashscope", config, "DASHSCOPE_API_KEY", base_url, "qwen-max")
    }

    fn build(
        provider: &'static str,
        config: &ModelConfig,
        key_var: &str,
        base_url: String,
        default_model: &str,
    ) -> Result<Self, AdkError> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => env::var(key_var)
                .map_err(|_| AdkError::config(format!("{} must be set", key_var)))?,
        };

        Ok(Self {
            client: Client::new(),
            provider,
            api_key,
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: config.headers.clone(),
            generate_args: config.generate_args.clone(),
        })
    }

    /// Convert internal Content to OpenAI message format
    fn content_to_openai_message(content: &Content) -> Value {
        let role = match content.role.as_str() {
            "model" => "assistant",
            other => other,
        };

        for part in &content.parts {
            if let Part::FunctionResponse { name, response } = part {
                return json!({
                    "role": "tool",
                    "tool_call_id": name,
                    "content": serde_json::to_string(response).unwrap_or_default()
                });
            }
        }

        let mut tool_calls = Vec::new();
        let mut text_content = String::new();

        for part in &content.parts {
            match part {
                Part::Text(t) => text_content.push_str(t),
                Part::FunctionCall { name, args } => {
                    tool_calls.push(json!({
                        "id": name,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": serde_json::to_string(args).unwrap_or_default()
                        }
                    }));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        if !tool_calls.is_empty() {
            json!({
                "role": role,
                "content": if text_content.is_empty() { Value::Null } else { json!(text_content) },
                "tool_calls": tool_calls
            })
        } else {
            json!({
                "role": role,
                "content": text_content
            })
        }
    }

    /// Convert tools to OpenAI function format
    fn tools_to_openai_format(tools: &[Arc<dyn Tool>]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    }
                })
            })
            .collect()
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &Value) -> Result<Content, AdkError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| AdkError::InvalidResponse("no choices in response".to_string()))?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for tc in tool_calls {
                let name = tc["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                let args: Value = serde_json::from_str(args_str).unwrap_or(json!({}));
                parts.push(Part::FunctionCall { name, args });
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }

    fn request_body(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Value {
        let messages: Vec<Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        for (key, value) in &self.generate_args {
            body[key.as_str()] = value.clone();
        }

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::tools_to_openai_format(tools));
                body["tool_choice"] = json!("auto");
            }
        }

        body
    }
}

#[async_trait]
impl Model for OpenAIChatModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(history, config, tools);

        log::debug!(
            "{} request body: {}",
            self.provider,
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let mut request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        for (key, value) in &self.headers {
            if let Some(v) = value.as_str() {
                request = request.header(key.as_str(), v);
            }
        }

        let resp = request.json(&body).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(AdkError::api(self.provider, text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("{} response: {}", self.provider, resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(value: Value) -> ModelConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_content_to_openai_user_message() {
        let msg = OpenAIChatModel::content_to_openai_message(&Content::text("user", "Hello"));
        assert_eq!(msg["role"], "user");
        assert_eq!(msg["content"], "Hello");
    }

    #[test]
    fn test_content_to_openai_assistant_message() {
        let msg = OpenAIChatModel::content_to_openai_message(&Content::text("model", "I can help"));
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["content"], "I can help");
    }

    #[test]
    fn test_content_to_openai_with_function_call() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                name: "bing_search".to_string(),
                args: json!({"question": "rust"}),
            }],
        };

        let msg = OpenAIChatModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "assistant");
        assert_eq!(msg["tool_calls"][0]["function"]["name"], "bing_search");
        assert!(msg["content"].is_null());
    }

    #[test]
    fn test_content_to_openai_tool_response() {
        let content = Content {
            role: "user".to_string(),
            parts: vec![Part::FunctionResponse {
                name: "bing_search".to_string(),
                response: json!({"ok": true}),
            }],
        };
        let msg = OpenAIChatModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "tool");
        assert_eq!(msg["tool_call_id"], "bing_search");
    }

    #[test]
    fn test_parse_openai_text_response() {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello, how can I help?"}
            }]
        });

        let content = OpenAIChatModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.role, "model");
        assert_eq!(content.joined_text(), "Hello, how can I help?");
    }

    #[test]
    fn test_parse_openai_function_call_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "read_text_file",
                            "arguments": "{\"file_path\": \"notes.txt\"}"
                        }
                    }]
                }
            }]
        });

        let content = OpenAIChatModel::parse_openai_response(&response).unwrap();
        match &content.parts[0] {
            Part::FunctionCall { name, args } => {
                assert_eq!(name, "read_text_file");
                assert_eq!(args["file_path"], "notes.txt");
            }
            _ => panic!("Expected FunctionCall part"),
        }
    }

    #[test]
    fn test_parse_empty_choices_is_error() {
        let err = OpenAIChatModel::parse_openai_response(&json!({"choices": []}));
        assert!(matches!(err, Err(AdkError::InvalidResponse(_))));
    }

    #[test]
    fn test_dashscope_uses_compatible_endpoint() {
        let model = OpenAIChatModel::dashscope(&config(json!({
            "config_name": "qwen",
            "model_type": "dashscope_chat",
            "model_name": "qwen-plus",
            "api_key": "sk-test"
        })))
        .unwrap();
        assert_eq!(model.base_url, DASHSCOPE_BASE_URL);
        assert_eq!(model.model_name, "qwen-plus");
    }

    #[test]
    fn test_generate_args_reach_request_body() {
        let model = OpenAIChatModel::openai(&config(json!({
            "config_name": "gpt",
            "model_type": "openai_chat",
            "api_key": "sk-test",
            "base_url": "http://localhost:8080/v1/",
            "generate_args": {"temperature": 0.2}
        })))
        .unwrap();
        assert_eq!(model.base_url, "http://localhost:8080/v1");

        let body = model.request_body(&[Content::text("user", "hi")], None, None);
        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["messages"][0]["content"], "hi");
    }
}
