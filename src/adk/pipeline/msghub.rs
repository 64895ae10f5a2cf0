// SPDX-License-Identifier: MIT

//! Message hub - participants hear every reply made inside it
//!
//! [`msghub`] returns a guard: while it lives each participant's replies are
//! broadcast to all other participants, and dropping it tears the wiring
//! down again, whether the wrapped call succeeded or not.

use super::{Operator, Pipeline};
use crate::adk::agent::Agent;
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;
use std::sync::Arc;

/// Active broadcast context; audiences are cleared on drop
pub struct MsgHubGuard {
    participants: Vec<Arc<dyn Agent>>,
}

/// Open a broadcast context over `participants`.
///
/// Every participant observes `announcement` before the guard is returned.
pub fn msghub(participants: &[Arc<dyn Agent>], announcement: Option<Msg>) -> MsgHubGuard {
    for (index, agent) in participants.iter().enumerate() {
        let others = participants
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, a)| Arc::downgrade(a))
            .collect();
        agent.memory().set_audience(others);
    }

    if let Some(msg) = announcement {
        for agent in participants {
            agent.observe(msg.clone());
        }
    }

    MsgHubGuard {
        participants: participants.to_vec(),
    }
}

impl Drop for MsgHubGuard {
    fn drop(&mut self) {
        for agent in &self.participants {
            agent.memory().clear_audience();
        }
    }
}

/// Runs a body pipeline inside a message hub
pub struct MsgHubPipeline {
    body: Operator,
    participants: Vec<Arc<dyn Agent>>,
    announcement: Option<Msg>,
}

impl MsgHubPipeline {
    pub fn new(body: Operator, participants: Vec<Arc<dyn Agent>>, announcement: Option<Msg>) -> Self {
        Self {
            body,
            participants,
            announcement,
        }
    }

    pub fn participants(&self) -> &[Arc<dyn Agent>] {
        &self.participants
    }
}

#[async_trait]
impl Pipeline for MsgHubPipeline {
    async fn call(&self, input: Option<Msg>) -> Result<Option<Msg>, AdkError> {
        let _hub = msghub(&self.participants, self.announcement.clone());
        self.body.call(input).await
    }
}
