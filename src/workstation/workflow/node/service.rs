// SPDX-License-Identifier: MIT

//! Service nodes bind their parameters to a built-in tool.
//!
//! They are consumed as tools by reasoning agents. When wired into the flow
//! directly they call the bound tool with the flow message.

use super::codegen::{from_json, USE_TOOL};
use super::{Emission, Emittable, Executable, NodeHeader, Variant};
use crate::adk::message::Msg;
use crate::adk::service::{BingSearch, ExecutePythonCode, GoogleSearch, ReadTextFile, WriteTextFile};
use crate::adk::tool::{invoke, PartialTool, Tool};
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use std::sync::Arc;

pub struct ServiceNode {
    tool: Arc<dyn Tool>,
}

/// Tool constructor expression and its import
fn service_source(variant: Variant) -> (&'static str, &'static str) {
    match variant {
        Variant::BingSearch => (
            "BingSearch::new()",
            "use workstation_rs::adk::service::BingSearch;",
        ),
        Variant::GoogleSearch => (
            "GoogleSearch::new()",
            "use workstation_rs::adk::service::GoogleSearch;",
        ),
        Variant::Python => (
            "ExecutePythonCode",
            "use workstation_rs::adk::service::ExecutePythonCode;",
        ),
        Variant::ReadText => (
            "ReadTextFile",
            "use workstation_rs::adk::service::ReadTextFile;",
        ),
        _ => (
            "WriteTextFile",
            "use workstation_rs::adk::service::WriteTextFile;",
        ),
    }
}

impl ServiceNode {
    pub(super) fn construct(header: &NodeHeader) -> Result<Self, WorkflowError> {
        let inner: Arc<dyn Tool> = match header.variant {
            Variant::BingSearch => Arc::new(BingSearch::new()),
            Variant::GoogleSearch => Arc::new(GoogleSearch::new()),
            Variant::Python => Arc::new(ExecutePythonCode),
            Variant::ReadText => Arc::new(ReadTextFile),
            Variant::WriteText => Arc::new(WriteTextFile),
            other => return Err(header.config_error(format!("{:?} is not a service", other))),
        };

        let bound = header.parameters.values().clone();
        Ok(Self {
            tool: Arc::new(PartialTool::new(inner, bound)),
        })
    }

    pub fn tool(&self) -> Arc<dyn Tool> {
        self.tool.clone()
    }
}

#[async_trait]
impl Executable for ServiceNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        Ok(Some(invoke(&self.tool, input).await?))
    }
}

impl Emittable for ServiceNode {
    fn emit(&self, header: &NodeHeader) -> Emission {
        let (constructor, import) = service_source(header.variant);
        let bound = if header.parameters.values().is_empty() {
            "serde_json::Map::new()".to_string()
        } else {
            from_json(header.parameters.values())
        };

        Emission {
            imports: vec![
                USE_TOOL.to_string(),
                "use workstation_rs::adk::tool::PartialTool;".to_string(),
                "use workstation_rs::adk::tool::invoke;".to_string(),
                import.to_string(),
            ],
            init: vec![format!(
                "let {}: Arc<dyn Tool> = Arc::new(PartialTool::new(Arc::new({}), {}));",
                header.var_name, constructor, bound
            )],
            exec: Some(format!(
                "flow = Some(invoke(&{}, flow).await?);",
                header.var_name
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::build;
    use super::*;
    use crate::adk::model::ModelRegistry;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_wired_read_service_reads_flow_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "notes").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let node = build("3", "ReadTextService", json!({}), vec![], &ModelRegistry::new())
            .await
            .unwrap();
        let out = node
            .execute(Some(Msg::new("user", path, "user")))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(out.name, "read_text_file");
        assert_eq!(out.role, "system");
        assert_eq!(out.content, json!("notes"));
    }

    #[tokio::test]
    async fn test_bound_parameters_hidden_from_schema() {
        let node = build(
            "3",
            "BingSearchService",
            json!({"api_key": "k", "num_results": 3}),
            vec![],
            &ModelRegistry::new(),
        )
        .await
        .unwrap();

        let tool = node.tool().unwrap();
        assert_eq!(tool.name(), "bing_search");
        let properties = tool.schema()["properties"].as_object().unwrap();
        assert!(properties.contains_key("question"));
        assert!(!properties.contains_key("api_key"));
    }

    #[tokio::test]
    async fn test_emission_binds_parameters() {
        let node = build(
            "3",
            "BingSearchService",
            json!({"num_results": 3}),
            vec![],
            &ModelRegistry::new(),
        )
        .await
        .unwrap();

        let emission = node.emit();
        assert_eq!(
            emission.init,
            vec![r#"let service_3: Arc<dyn Tool> = Arc::new(PartialTool::new(Arc::new(BingSearch::new()), serde_json::from_value(json!({"num_results": 3}))?));"#]
        );
        assert!(emission
            .imports
            .contains(&"use workstation_rs::adk::service::BingSearch;".to_string()));
    }
}
