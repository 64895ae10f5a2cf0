// SPDX-License-Identifier: MIT

//! Model nodes register a model configuration and otherwise pass flow through

use super::codegen::from_json;
use super::{Emission, Emittable, Executable, NodeHeader};
use crate::adk::message::Msg;
use crate::adk::model::{ModelConfig, ModelRegistry};
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub struct ModelNode {
    config: ModelConfig,
    /// Configuration as written, with `model_type` filled in
    source: Map<String, Value>,
}

impl ModelNode {
    pub(super) async fn construct(header: &NodeHeader, models: &ModelRegistry) -> Result<Self, WorkflowError> {
        if !header.dependencies.is_empty() {
            log::warn!("Model node {} ignores its contained elements", header.id);
        }

        let mut values = header.parameters.values().clone();
        values
            .entry("model_type")
            .or_insert_with(|| Value::String(header.kind_name.clone()));
        let mut source = header.source.clone();
        source
            .entry("model_type")
            .or_insert_with(|| Value::String(header.kind_name.clone()));

        let config: ModelConfig = serde_json::from_value(Value::Object(values))
            .map_err(|e| header.config_error(format!("invalid model configuration: {}", e)))?;
        models.load(config.clone()).await;

        Ok(Self { config, source })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[async_trait]
impl Executable for ModelNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        Ok(input)
    }
}

impl Emittable for ModelNode {
    fn emit(&self, _header: &NodeHeader) -> Emission {
        Emission {
            imports: Vec::new(),
            init: vec![format!("models.load({}).await;", from_json(&self.source))],
            exec: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::build;
    use super::super::NodeBody;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_loads_configuration_with_kind_as_type() {
        let models = ModelRegistry::new();
        let node = build(
            "1",
            "post_api_chat",
            json!({"config_name": "local", "api_url": "http://localhost:8000/chat"}),
            vec![],
            &models,
        )
        .await
        .unwrap();

        let loaded = models.config("local").await.unwrap();
        assert_eq!(loaded.model_type, "post_api_chat");
        assert_eq!(loaded.base_url.as_deref(), Some("http://localhost:8000/chat"));
        assert!(matches!(node.body(), NodeBody::Model(m) if m.config().config_name == "local"));
    }

    #[tokio::test]
    async fn test_execute_passes_through() {
        let models = ModelRegistry::new();
        let node = build("1", "echo_chat", json!({"config_name": "e"}), vec![], &models)
            .await
            .unwrap();
        let input = Some(Msg::new("user", "hi", "user"));
        assert_eq!(node.execute(input.clone()).await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_missing_config_name_is_configuration_error() {
        let models = ModelRegistry::new();
        let err = build("9", "openai_chat", json!({"model_name": "gpt-4o"}), vec![], &models)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WorkflowError::Configuration { ref node, .. } if node == "9"));
        assert!(models.is_empty().await);
    }

    #[tokio::test]
    async fn test_emits_load_statement_only() {
        let models = ModelRegistry::new();
        let node = build("1", "echo_chat", json!({"config_name": "e"}), vec![], &models)
            .await
            .unwrap();
        let emission = node.emit();
        assert_eq!(
            emission.init,
            vec![r#"models.load(serde_json::from_value(json!({"config_name": "e", "model_type": "echo_chat"}))?).await;"#]
        );
        assert!(emission.exec.is_none());
    }
}
