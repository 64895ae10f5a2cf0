// SPDX-License-Identifier: MIT

//! Pipelines - control flow over agents
//!
//! Everything a pipeline composes is an [`Operator`]: an agent, another
//! pipeline, or a placeholder that passes its input through.
//!
//! - [`SequentialPipeline`] - run operators in order, chaining output
//! - [`ForLoopPipeline`] / [`WhileLoopPipeline`] - repeat a body
//! - [`IfElsePipeline`] / [`SwitchPipeline`] - pick a branch
//! - [`MsgHubPipeline`] - run a body with participants hearing each other

mod branch;
mod loops;
mod msghub;
mod sequential;

pub use branch::{IfElsePipeline, SwitchPipeline};
pub use loops::{ForLoopPipeline, WhileLoopPipeline};
pub use msghub::{msghub, MsgHubGuard, MsgHubPipeline};
pub use sequential::SequentialPipeline;

use crate::adk::agent::Agent;
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;
use std::sync::Arc;

/// Loop condition, called with the iteration count and the current message
pub type LoopCondition = Arc<dyn Fn(usize, Option<&Msg>) -> bool + Send + Sync>;

/// Branch or break condition over the current message
pub type Predicate = Arc<dyn Fn(Option<&Msg>) -> bool + Send + Sync>;

/// Picks a switch case label from the current message
pub type Selector = Arc<dyn Fn(Option<&Msg>) -> String + Send + Sync>;

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError>;
}

/// Something a pipeline can call
#[derive(Clone)]
pub enum Operator {
    Agent(Arc<dyn Agent>),
    Pipeline(Arc<dyn Pipeline>),
    /// Identity: returns its input unchanged
    Placeholder,
}

impl Operator {
    pub fn pipeline(pipeline: impl Pipeline + 'static) -> Self {
        Self::Pipeline(Arc::new(pipeline))
    }

    pub async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        match self {
            Operator::Agent(agent) => agent.call(input).await.map(Some),
            Operator::Pipeline(pipeline) => pipeline.call(input).await,
            Operator::Placeholder => Ok(input),
        }
    }
}

impl From<Arc<dyn Agent>> for Operator {
    fn from(agent: Arc<dyn Agent>) -> Self {
        Self::Agent(agent)
    }
}

impl From<Arc<dyn Pipeline>> for Operator {
    fn from(pipeline: Arc<dyn Pipeline>) -> Self {
        Self::Pipeline(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::tests::MockAgent;

    #[tokio::test]
    async fn test_placeholder_is_identity() {
        let input = Some(Msg::new("user", "same", "user"));
        let out = Operator::Placeholder.call(input.clone()).await.unwrap();
        assert_eq!(out, input);

        assert_eq!(Operator::Placeholder.call(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_agent_operator_always_replies() {
        let agent: Arc<dyn Agent> = Arc::new(MockAgent::new("a", |s| format!("[{}]", s)));
        let out = Operator::from(agent).call(None).await.unwrap();
        assert_eq!(out.unwrap().content_text(), "[]");
    }
}
