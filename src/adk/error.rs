// SPDX-License-Identifier: MIT

//! Typed error handling for the agent development kit
//!
//! Every fallible operation in `adk` (model calls, tool calls, agent replies)
//! returns [`AdkError`]. The workflow layer wraps it unchanged.

use thiserror::Error;

/// Top-level error type for the agent development kit
#[derive(Debug, Error)]
pub enum AdkError {
    /// API errors from external services (OpenAI, DashScope, Bing, etc.)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// A model configuration name that was never loaded into the registry
    #[error("Model configuration '{0}' not found")]
    ModelNotFound(String),

    /// A model configuration with a `model_type` no implementation serves
    #[error("Unsupported model type: {0}")]
    UnsupportedModelType(String),

    /// Configuration errors (missing env vars, invalid arguments)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid response from a model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Tool execution errors
    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

impl AdkError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a tool error
    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for AdkError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for AdkError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
