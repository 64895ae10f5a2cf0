// SPDX-License-Identifier: MIT

//! Loop pipelines

use super::{LoopCondition, Operator, Pipeline, Predicate};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;

/// Runs the body up to `max_loop` times, stopping early once `break_func`
/// holds for the body's latest output.
pub struct ForLoopPipeline {
    body: Operator,
    max_loop: usize,
    break_func: Option<Predicate>,
}

impl ForLoopPipeline {
    pub fn new(body: Operator, max_loop: usize, break_func: Option<Predicate>) -> Self {
        Self {
            body,
            max_loop,
            break_func,
        }
    }
}

#[async_trait]
impl Pipeline for ForLoopPipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        let mut current = input;
        for iteration in 0..self.max_loop {
            current = self.body.call(current).await?;
            if let Some(break_func) = &self.break_func {
                if break_func(current.as_ref()) {
                    log::debug!("ForLoopPipeline broke after {} iterations", iteration + 1);
                    break;
                }
            }
        }
        Ok(current)
    }
}

/// Runs the body while `condition(i, x)` holds, where `i` counts completed
/// iterations and `x` is the latest message.
pub struct WhileLoopPipeline {
    body: Operator,
    condition: LoopCondition,
}

impl WhileLoopPipeline {
    pub fn new(body: Operator, condition: LoopCondition) -> Self {
        Self { body, condition }
    }
}

#[async_trait]
impl Pipeline for WhileLoopPipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        let mut current = input;
        let mut iteration = 0;
        while (self.condition)(iteration, current.as_ref()) {
            current = self.body.call(current).await?;
            iteration += 1;
        }
        Ok(current)
    }
}
