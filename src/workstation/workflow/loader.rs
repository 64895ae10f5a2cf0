// SPDX-License-Identifier: MIT

//! Workflow loader - JSON/YAML file loading and parsing
//!
//! This module reads exported workflow files into a [`WorkflowConfig`].

use super::error::WorkflowError;
use super::types::WorkflowConfig;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads workflow definitions from JSON or YAML files
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow from a file; `.yaml`/`.yml` are read as YAML,
    /// everything else as JSON
    pub fn load_workflow<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowConfig, WorkflowError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::info!("Loading workflow from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Parse a workflow from a JSON string
    pub fn parse_json(content: &str) -> Result<WorkflowConfig, WorkflowError> {
        let value: Value = serde_json::from_str(content)?;
        WorkflowConfig::from_value(value)
    }

    /// Parse a workflow from a YAML string
    pub fn parse_yaml(content: &str) -> Result<WorkflowConfig, WorkflowError> {
        let value: Value = serde_yaml::from_str(content)?;
        WorkflowConfig::from_value(value)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}
