// SPDX-License-Identifier: MIT

//! Copy nodes re-run another node at a second place in the flow

use super::{Emission, Emittable, Executable, NodeHeader, WorkflowNode};
use crate::adk::message::Msg;
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CopyNode {
    target: Arc<WorkflowNode>,
}

impl CopyNode {
    pub(super) fn construct(header: &NodeHeader) -> Result<Self, WorkflowError> {
        header.expect_dependencies(1)?;
        Ok(Self {
            target: header.dependencies[0].clone(),
        })
    }

    pub fn target(&self) -> &Arc<WorkflowNode> {
        &self.target
    }
}

#[async_trait]
impl Executable for CopyNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        self.target.execute(input).await
    }
}

impl Emittable for CopyNode {
    /// The copied node's statement, repeated; no state of its own
    fn emit(&self, _header: &NodeHeader) -> Emission {
        Emission {
            imports: Vec::new(),
            init: Vec::new(),
            exec: self.target.emit().exec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, echo_models};
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_delegates_to_target() {
        let models = echo_models().await;
        let agent = build(
            "1",
            "DialogAgent",
            json!({"name": "a", "model_config_name": "echo", "use_memory": false}),
            vec![],
            &models,
        )
        .await
        .unwrap();
        let copy = build("2", "CopyNode", json!({}), vec![agent], &models)
            .await
            .unwrap();

        let out = copy
            .execute(Some(Msg::new("user", "again", "user")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.name, "a");
        assert_eq!(out.content_text(), "again");

        let emission = copy.emit();
        assert!(emission.init.is_empty());
        assert_eq!(emission.exec.as_deref(), Some("flow = Some(agent_1.call(flow).await?);"));
    }

    #[tokio::test]
    async fn test_requires_exactly_one_element() {
        let err = build("2", "CopyNode", json!({}), vec![], &echo_models().await)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WorkflowError::Configuration { .. }));
    }
}
