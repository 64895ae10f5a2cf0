// SPDX-License-Identifier: MIT

//! Built-in services exposed as [`Tool`](crate::adk::tool::Tool)s

mod code;
mod file;
mod search;

pub use code::ExecutePythonCode;
pub use file::{ReadTextFile, WriteTextFile};
pub use search::{BingSearch, GoogleSearch, SearchResult};
