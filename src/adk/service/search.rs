// SPDX-License-Identifier: MIT

//! Web search services (Bing, Google Custom Search)
//!
//! API keys may be bound as arguments; otherwise they are read from the
//! environment at call time.

use crate::adk::error::AdkError;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;

// --- Static schemas ---

static BING_SEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "question": {
                "type": "string",
                "description": "The search query"
            },
            "api_key": {
                "type": "string",
                "description": "Bing Web Search API key"
            },
            "num_results": {
                "type": "integer",
                "description": "Number of results to return (default 10)"
            }
        },
        "required": ["question"]
    })
});

static GOOGLE_SEARCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "question": {
                "type": "string",
                "description": "The search query"
            },
            "api_key": {
                "type": "string",
                "description": "Google API key"
            },
            "cse_id": {
                "type": "string",
                "description": "Custom Search Engine id"
            },
            "num_results": {
                "type": "integer",
                "description": "Number of results to return (default 10, max 10)"
            }
        },
        "required": ["question"]
    })
});

#[derive(Debug, Deserialize)]
struct SearchArgs {
    question: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    cse_id: Option<String>,
    #[serde(default)]
    num_results: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

fn resolve_key(bound: Option<String>, var: &str) -> Result<String, AdkError> {
    bound
        .or_else(|| env::var(var).ok())
        .ok_or_else(|| AdkError::config(format!("{} must be set", var)))
}

fn collect_results(items: Option<&Value>, title: &str, link: &str) -> Vec<SearchResult> {
    items
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| SearchResult {
                    title: item[title].as_str().unwrap_or_default().to_string(),
                    link: item[link].as_str().unwrap_or_default().to_string(),
                    snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct BingSearch {
    client: Client,
}

impl BingSearch {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for BingSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BingSearch {
    fn name(&self) -> &str {
        "bing_search"
    }

    fn description(&self) -> &str {
        "Searches the web using the Bing Web Search API. Returns titles, links and snippets."
    }

    fn schema(&self) -> &Value {
        &BING_SEARCH_SCHEMA
    }

    fn primary_input(&self) -> Option<&str> {
        Some("question")
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let args: SearchArgs = serde_json::from_value(input)?;
        let api_key = resolve_key(args.api_key, "BING_API_KEY")?;

        let mut url = reqwest::Url::parse("https://api.bing.microsoft.com/v7.0/search")
            .map_err(|e| AdkError::other(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", &args.question)
            .append_pair("count", &args.num_results.unwrap_or(10).to_string());

        let resp = self
            .client
            .get(url)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(AdkError::api("bing", text));
        }

        let body: Value = resp.json().await?;
        let results = collect_results(body.pointer("/webPages/value"), "name", "url");
        Ok(serde_json::to_value(results)?)
    }
}

pub struct GoogleSearch {
    client: Client,
}

impl GoogleSearch {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for GoogleSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GoogleSearch {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Searches the web using Google Custom Search. Returns titles, links and snippets."
    }

    fn schema(&self) -> &Value {
        &GOOGLE_SEARCH_SCHEMA
    }

    fn primary_input(&self) -> Option<&str> {
        Some("question")
    }

    async fn execute(&self, input: Value) -> Result<Value, AdkError> {
        let args: SearchArgs = serde_json::from_value(input)?;
        let api_key = resolve_key(args.api_key, "GOOGLE_API_KEY")?;
        let cse_id = resolve_key(args.cse_id, "GOOGLE_CSE_ID")?;

        let mut url = reqwest::Url::parse("https://www.googleapis.com/customsearch/v1")
            .map_err(|e| AdkError::other(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", &api_key)
            .append_pair("cx", &cse_id)
            .append_pair("q", &args.question)
            .append_pair("num", &args.num_results.unwrap_or(10).min(10).to_string());

        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(AdkError::api("google", text));
        }

        let body: Value = resp.json().await?;
        let results = collect_results(body.get("items"), "title", "link");
        Ok(serde_json::to_value(results)?)
    }
}
