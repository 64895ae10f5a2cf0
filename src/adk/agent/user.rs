// SPDX-License-Identifier: MIT

//! User Agent - a human in the loop
//!
//! Reads one line per reply from an input stream (stdin by default). The
//! incoming flow message, if any, is shown to the user and remembered.

use super::{Agent, AgentMemory};
use crate::adk::error::AdkError;
use crate::adk::message::Msg;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

fn default_user_name() -> String {
    "User".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_user_name")]
    pub name: String,
}

type InputSource = Box<dyn AsyncBufRead + Send + Unpin>;

pub struct UserAgent {
    config: UserAgentConfig,
    input: Mutex<InputSource>,
    interactive: bool,
    memory: AgentMemory,
}

impl UserAgent {
    /// A user agent reading from stdin
    pub fn new(config: UserAgentConfig) -> Self {
        Self {
            config,
            input: Mutex::new(Box::new(BufReader::new(tokio::io::stdin()))),
            interactive: true,
            memory: AgentMemory::new(),
        }
    }

    /// A user agent reading from an arbitrary source, without prompting
    pub fn with_reader(config: UserAgentConfig, reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self {
            config,
            input: Mutex::new(Box::new(reader)),
            interactive: false,
            memory: AgentMemory::new(),
        }
    }

    async fn prompt(&self, shown: Option<&Msg>) -> Result<(), AdkError> {
        let mut stdout = tokio::io::stdout();
        if let Some(msg) = shown {
            stdout
                .write_all(format!("{}: {}\n", msg.name, msg.content_text()).as_bytes())
                .await?;
        }
        stdout
            .write_all(format!("{} input: ", self.config.name).as_bytes())
            .await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for UserAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    async fn reply(&self, input: Option<Msg>) -> Result<Msg, AdkError> {
        if self.interactive {
            self.prompt(input.as_ref()).await?;
        }
        if let Some(msg) = input {
            self.memory.add(msg);
        }

        let mut line = String::new();
        self.input.lock().await.read_line(&mut line).await?;
        let text = line.trim_end_matches(['\r', '\n']).to_string();

        let output = Msg::new(self.name(), text, "user");
        self.memory.add(output.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UserAgentConfig {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    #[tokio::test]
    async fn test_reads_one_line_per_reply() {
        let agent = UserAgent::with_reader(config(), &b"first\nsecond\n"[..]);
        assert_eq!(agent.name(), "User");

        let a = agent.reply(None).await.unwrap();
        let b = agent.reply(None).await.unwrap();
        assert_eq!(a.content_text(), "first");
        assert_eq!(b.content_text(), "second");
        assert_eq!(b.role, "user");
    }

    #[tokio::test]
    async fn test_eof_gives_empty_reply() {
        let agent = UserAgent::with_reader(config(), &b""[..]);
        let out = agent
            .reply(Some(Msg::new("bot", "question?", "assistant")))
            .await
            .unwrap();
        assert_eq!(out.content_text(), "");
        // flow input and own reply
        assert_eq!(agent.memory().len(), 2);
    }
}
