// SPDX-License-Identifier: MIT

//! Message nodes inject a literal message into the flow

use super::codegen::{json_expr, str_lit};
use super::{Emission, Emittable, Executable, NodeHeader};
use crate::adk::message::Msg;
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use serde_json::Value;

pub struct MessageNode {
    msg: Msg,
}

impl MessageNode {
    pub(super) fn construct(header: &NodeHeader) -> Result<Self, WorkflowError> {
        let name = header
            .parameters
            .get_str("name")
            .ok_or_else(|| header.config_error("message requires a 'name'"))?;
        let content = header
            .parameters
            .get("content")
            .cloned()
            .unwrap_or(Value::Null);
        let role = header.parameters.get_str("role").unwrap_or("assistant");

        Ok(Self {
            msg: Msg::new(name, content, role),
        })
    }

    pub fn msg(&self) -> &Msg {
        &self.msg
    }
}

#[async_trait]
impl Executable for MessageNode {
    async fn execute(&self, _input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        Ok(Some(self.msg.clone()))
    }
}

impl Emittable for MessageNode {
    fn emit(&self, header: &NodeHeader) -> Emission {
        Emission {
            imports: Vec::new(),
            init: vec![format!(
                "let {}: Msg = Msg::new({}, {}, {});",
                header.var_name,
                str_lit(&self.msg.name),
                json_expr(&self.msg.content),
                str_lit(&self.msg.role)
            )],
            exec: Some(format!("flow = Some({}.clone());", header.var_name)),
        }
    }
}
