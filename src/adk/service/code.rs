// SPDX-License-Identifier: MIT

//! Python code execution service
//!
//! Runs a snippet with the local interpreter (`PYTHON`, default `python3`)
//! and reports its exit status and output. The snippet runs with the
//! caller's privileges; only wire it into trusted workflows.

use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::process::Command;

static EXECUTE_PYTHON_CODE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "code": {"type": "string", "description": "Python source to run"},
            "timeout": {"type": "integer", "description": "Seconds before the run is killed (default 300)"}
        },
        "required": ["code"]
    })
});

fn default_timeout() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
struct CodeArgs {
    code: String,
    #[serde(default = "default_timeout")]
    timeout: u64,
}

#[derive(Debug, Default)]
pub struct ExecutePythonCode;

#[async_trait]
impl Tool for ExecutePythonCode {
    fn name(&self) -> &str {
        "execute_python_code"
    }

    fn description(&self) -> &str {
        "Executes a Python snippet and returns its exit status, stdout and stderr."
    }

    fn schema(&self) -> &Value {
        &EXECUTE_PYTHON_CODE_SCHEMA
    }

    fn primary_input(&self) -> Option<&str> {
        Some("code")
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let args: CodeArgs = serde_json::from_value(input)?;
        let interpreter = std::env::var("PYTHON").unwrap_or_else(|_| "python3".to_string());

        let run = Command::new(&interpreter)
            .arg("-c")
            .arg(&args.code)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(args.timeout), run)
            .await
            .map_err(|_| {
                AdkError::tool(self.name(), format!("timed out after {}s", args.timeout))
            })??;

        Ok(json!({
            "success": output.status.success(),
            "exit_code": output.status.code(),
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
        }))
    }
}
