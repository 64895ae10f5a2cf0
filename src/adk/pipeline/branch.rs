// SPDX-License-Identifier: MIT

//! Branching pipelines

use super::{Operator, Pipeline, Predicate, Selector};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;

pub struct IfElsePipeline {
    condition: Predicate,
    if_body: Operator,
    else_body: Operator,
}

impl IfElsePipeline {
    pub fn new(condition: Predicate, if_body: Operator, else_body: Operator) -> Self {
        Self {
            condition,
            if_body,
            else_body,
        }
    }
}

#[async_trait]
impl Pipeline for IfElsePipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        if (self.condition)(input.as_ref()) {
            self.if_body.call(input).await
        } else {
            self.else_body.call(input).await
        }
    }
}

/// Calls the case whose label the selector returns, or the default
pub struct SwitchPipeline {
    selector: Selector,
    cases: Vec<(String, Operator)>,
    default: Operator,
}

impl SwitchPipeline {
    pub fn new(selector: Selector, cases: Vec<(String, Operator)>, default: Operator) -> Self {
        Self {
            selector,
            cases,
            default,
        }
    }
}

#[async_trait]
impl Pipeline for SwitchPipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        let label = (self.selector)(input.as_ref());
        match self.cases.iter().find(|(case, _)| *case == label) {
            Some((_, operator)) => operator.call(input).await,
            None => {
                log::debug!("SwitchPipeline: no case '{}', using default", label);
                self.default.call(input).await
            }
        }
    }
}
