// SPDX-License-Identifier: MIT

//! Text file services

use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};

static READ_TEXT_FILE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "file_path": {"type": "string", "description": "Path of the file to read"}
        },
        "required": ["file_path"]
    })
});

static WRITE_TEXT_FILE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "file_path": {"type": "string", "description": "Path of the file to write"},
            "content": {"type": "string", "description": "Text to write"},
            "overwrite": {"type": "boolean", "description": "Replace an existing file (default false)"}
        },
        "required": ["file_path", "content"]
    })
});

#[derive(Debug, Deserialize)]
struct ReadArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    file_path: String,
    content: String,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Debug, Default)]
pub struct ReadTextFile;

#[async_trait]
impl Tool for ReadTextFile {
    fn name(&self) -> &str {
        "read_text_file"
    }

    fn description(&self) -> &str {
        "Reads a text file and returns its content."
    }

    fn schema(&self) -> &Value {
        &READ_TEXT_FILE_SCHEMA
    }

    fn primary_input(&self) -> Option<&str> {
        Some("file_path")
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let args: ReadArgs = serde_json::from_value(input)?;
        let content = tokio::fs::read_to_string(&args.file_path).await?;
        Ok(Value::String(content))
    }
}

#[derive(Debug, Default)]
pub struct WriteTextFile;

#[async_trait]
impl Tool for WriteTextFile {
    fn name(&self) -> &str {
        "write_text_file"
    }

    fn description(&self) -> &str {
        "Writes text to a file, refusing to replace an existing file unless overwrite is set."
    }

    fn schema(&self) -> &Value {
        &WRITE_TEXT_FILE_SCHEMA
    }

    fn primary_input(&self) -> Option<&str> {
        Some("content")
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let args: WriteArgs = serde_json::from_value(input)?;

        if !args.overwrite && tokio::fs::try_exists(&args.file_path).await? {
            return Err(AdkError::tool(
                self.name(),
                format!("{} already exists", args.file_path),
            ));
        }

        tokio::fs::write(&args.file_path, args.content.as_bytes()).await?;
        Ok(Value::String(format!("Wrote {}", args.file_path)))
    }
}
