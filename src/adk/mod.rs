// SPDX-License-Identifier: MIT

//! Agent development kit: messages, models, agents, pipelines and services.

pub mod agent;
pub mod error;
pub mod message;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod tool;

pub use error::AdkError;
pub use message::Msg;
