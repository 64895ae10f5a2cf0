// SPDX-License-Identifier: MIT

//! Agent nodes wrap one agent of the agent library

use super::codegen::{from_json, USE_AGENT};
use super::{Emission, Emittable, Executable, NodeHeader, Variant};
use crate::adk::agent::{
    Agent, DialogAgent, DialogAgentConfig, DictDialogAgent, DictDialogAgentConfig, ReActAgent,
    ReActAgentConfig, UserAgent, UserAgentConfig,
};
use crate::adk::message::Msg;
use crate::adk::model::ModelRegistry;
use crate::adk::tool::ServiceToolkit;
use crate::workstation::workflow::error::WorkflowError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub struct AgentNode {
    agent: Arc<dyn Agent>,
}

fn agent_config<T: DeserializeOwned>(header: &NodeHeader) -> Result<T, WorkflowError> {
    serde_json::from_value(header.values()).map_err(|e| {
        header.config_error(format!("invalid {} parameters: {}", header.kind_name, e))
    })
}

impl AgentNode {
    pub(super) async fn construct(header: &NodeHeader, models: &ModelRegistry) -> Result<Self, WorkflowError> {
        if header.variant != Variant::ReActAgent && !header.dependencies.is_empty() {
            log::warn!("Agent node {} ignores its contained elements", header.id);
        }

        let agent: Arc<dyn Agent> = match header.variant {
            Variant::DialogAgent => {
                let config: DialogAgentConfig = agent_config(header)?;
                Arc::new(DialogAgent::new(config, models).await?)
            }
            Variant::DictDialogAgent => {
                let config: DictDialogAgentConfig = agent_config(header)?;
                Arc::new(DictDialogAgent::new(config, models).await?)
            }
            Variant::UserAgent => {
                let config: UserAgentConfig = agent_config(header)?;
                Arc::new(UserAgent::new(config))
            }
            Variant::ReActAgent => {
                let config: ReActAgentConfig = agent_config(header)?;
                let mut toolkit = ServiceToolkit::new();
                for dep in &header.dependencies {
                    let tool = dep.tool().ok_or_else(|| {
                        header.type_mismatch(format!(
                            "element {} ({}) is not a tool",
                            dep.id(),
                            dep.kind_name()
                        ))
                    })?;
                    toolkit.add(tool);
                }
                Arc::new(ReActAgent::new(config, models, toolkit).await?)
            }
            other => {
                return Err(header.config_error(format!("{:?} is not an agent", other)));
            }
        };

        Ok(Self { agent })
    }

    pub fn agent(&self) -> Arc<dyn Agent> {
        self.agent.clone()
    }
}

#[async_trait]
impl Executable for AgentNode {
    async fn execute(&self, input: Option<Msg>) -> Result<Option<Msg>, WorkflowError> {
        Ok(Some(self.agent.call(input).await?))
    }
}

impl Emittable for AgentNode {
    fn emit(&self, header: &NodeHeader) -> Emission {
        let var = &header.var_name;
        let config = from_json(&header.source);
        let mut imports = vec![USE_AGENT.to_string()];
        let mut init = Vec::new();

        let construct = match header.variant {
            Variant::UserAgent => {
                imports.push("use workstation_rs::adk::agent::UserAgent;".to_string());
                format!("UserAgent::new({})", config)
            }
            Variant::ReActAgent => {
                imports.push("use workstation_rs::adk::agent::ReActAgent;".to_string());
                imports.push("use workstation_rs::adk::tool::ServiceToolkit;".to_string());
                init.push(format!("let mut {}_toolkit = ServiceToolkit::new();", var));
                for tool in header.dependencies.iter().filter_map(|d| d.tool_expr()) {
                    init.push(format!("{}_toolkit.add({});", var, tool));
                }
                format!("ReActAgent::new({}, &models, {}_toolkit).await?", config, var)
            }
            Variant::DictDialogAgent => {
                imports.push("use workstation_rs::adk::agent::DictDialogAgent;".to_string());
                format!("DictDialogAgent::new({}, &models).await?", config)
            }
            _ => {
                imports.push("use workstation_rs::adk::agent::DialogAgent;".to_string());
                format!("DialogAgent::new({}, &models).await?", config)
            }
        };
        init.push(format!("let {}: Arc<dyn Agent> = Arc::new({});", var, construct));

        Emission {
            imports,
            init,
            exec: Some(format!("flow = Some({}.call(flow).await?);", var)),
        }
    }
}
