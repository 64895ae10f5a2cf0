// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait, model configurations and
//! the registry agents resolve their models from
//!
//! Model implementations are in their own submodules:
//! - [openai] - OpenAI-compatible chat completions (OpenAI, DashScope)
//! - [post_api] - generic HTTP POST endpoints (chat and image generation)
//! - [echo] - offline model that repeats the conversation's last turn

pub mod echo;
pub mod openai;
pub mod post_api;

use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// All text parts joined together
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Parts of a message - text, function calls, etc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Function/tool call requested by the model
    FunctionCall { name: String, args: Value },
    /// Response from executing a function/tool
    FunctionResponse { name: String, response: Value },
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError>;
}

/// A named model configuration, as written in a workflow's model node.
///
/// Keys the typed fields do not cover are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub config_name: String,
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, alias = "api_url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub generate_args: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build a live model from its configuration
pub fn create_model(config: &ModelConfig) -> Result<Arc<dyn Model>, AdkError> {
    match config.model_type.as_str() {
        "openai_chat" => Ok(Arc::new(openai::OpenAIChatModel::openai(config)?)),
        "dashscope_chat" => Ok(Arc::new(openai::OpenAIChatModel::dashscope(config)?)),
        "post_api_chat" => Ok(Arc::new(post_api::PostApiModel::chat(config)?)),
        "post_api_dall_e" => Ok(Arc::new(post_api::PostApiModel::dall_e(config)?)),
        "echo_chat" => Ok(Arc::new(echo::EchoModel::new())),
        other => Err(AdkError::UnsupportedModelType(other.to_string())),
    }
}

/// Shared store of model configurations, keyed by configuration name.
///
/// Cloning is cheap and every clone sees the same configurations, so one
/// handle is passed to every constructor that needs a model.
#[derive(Clone)]
pub struct ModelRegistry {
    configs: Arc<RwLock<HashMap<String, ModelConfig>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            configs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load a configuration, replacing any previous one with the same name
    pub async fn load(&self, config: ModelConfig) {
        let mut configs = self.configs.write().await;
        log::info!(
            "Loaded model config '{}' ({})",
            config.config_name,
            config.model_type
        );
        configs.insert(config.config_name.clone(), config);
    }

    pub async fn config(&self, name: &str) -> Option<ModelConfig> {
        let configs = self.configs.read().await;
        configs.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.configs.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }

    /// Instantiate the model behind a configuration name
    pub async fn get_model(&self, name: &str) -> Result<Arc<dyn Model>, AdkError> {
        let config = self
            .config(name)
            .await
            .ok_or_else(|| AdkError::ModelNotFound(name.to_string()))?;
        create_model(&config)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_config(name: &str) -> ModelConfig {
        serde_json::from_value(json!({"config_name": name, "model_type": "echo_chat"})).unwrap()
    }

    #[test]
    fn test_model_config_collects_extra_keys() {
        let config: ModelConfig = serde_json::from_value(json!({
            "config_name": "qwen",
            "model_type": "dashscope_chat",
            "model_name": "qwen-max",
            "api_url": "https://example.com",
            "seed": 42
        }))
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(config.extra.get("seed"), Some(&json!(42)));
        assert!(config.headers.is_empty());
    }

    #[tokio::test]
    async fn test_load_and_get_model() {
        let registry = ModelRegistry::new();
        registry.load(echo_config("echo")).await;

        assert!(registry.contains("echo").await);
        assert!(registry.get_model("echo").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_model() {
        let registry = ModelRegistry::new();
        let err = registry.get_model("nope").await.err().unwrap();
        assert!(matches!(err, AdkError::ModelNotFound(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn test_unsupported_model_type() {
        let registry = ModelRegistry::new();
        let mut config = echo_config("weird");
        config.model_type = "carrier_pigeon".to_string();
        registry.load(config).await;

        let err = registry.get_model("weird").await.err().unwrap();
        assert!(matches!(err, AdkError::UnsupportedModelType(_)));
    }

    #[tokio::test]
    async fn test_registry_is_clone() {
        let registry = ModelRegistry::new();
        let cloned = registry.clone();
        cloned.load(echo_config("shared")).await;

        assert!(registry.contains("shared").await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_overwrites_existing() {
        let registry = ModelRegistry::new();
        registry.load(echo_config("same")).await;
        let mut second = echo_config("same");
        second.model_name = Some("v2".to_string());
        registry.load(second).await;

        assert_eq!(registry.len().await, 1);
        let config = registry.config("same").await.unwrap();
        assert_eq!(config.model_name.as_deref(), Some("v2"));
    }
}
