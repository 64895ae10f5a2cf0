// SPDX-License-Identifier: MIT

use super::{Operator, Pipeline};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;

/// Runs its operators in order, feeding each one the previous output
pub struct SequentialPipeline {
    operators: Vec<Operator>,
}

impl SequentialPipeline {
    pub fn new(operators: Vec<Operator>) -> Self {
        Self { operators }
    }
}

#[async_trait]
impl Pipeline for SequentialPipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        let mut current = input;
        for operator in &self.operators {
            current = operator.call(current).await?;
        }
        Ok(current)
    }
}
