//! Google search via the Serper API (https://serper.dev).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{required_str, TravelTool};
use crate::errors::{Result, WayfarerError};

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
const MAX_RESULTS: usize = 5;

/// Google search for official sites, tourism boards, authoritative sources.
pub struct SerperSearchTool {
    client: Client,
    api_key: String,
}

impl SerperSearchTool {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            WayfarerError::Configuration("SERPER_API_KEY not set".to_string())
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Perform a Google search via the Serper API
    pub async fn search(&self, query: &str, num_results: usize) -> String {
        let payload = json!({
            "q": query,
            "num": num_results,
        });

        let response = match self
            .client
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return format!("Request failed: {e}"),
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return format!("Serper API error: {status}, {text}");
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return format!("Error occurred: {e}"),
        };

        let results: Vec<String> = data
            .get("organic")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(num_results)
                    .map(|item| {
                        format!(
                            "- {} ({})\n  {}",
                            item.get("title").and_then(Value::as_str).unwrap_or("No title"),
                            item.get("link").and_then(Value::as_str).unwrap_or("No link"),
                            item.get("snippet")
                                .and_then(Value::as_str)
                                .unwrap_or("No snippet available"),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        if results.is_empty() {
            "No results found.".to_string()
        } else {
            results.join("\n\n")
        }
    }
}

#[async_trait]
impl TravelTool for SerperSearchTool {
    fn name(&self) -> &'static str {
        "serper_search"
    }

    fn description(&self) -> &'static str {
        "Search Google for official websites, tourism boards, and authoritative sources. \
         Use this tool when looking for official information, popular attractions, or \
         well-established sources."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query string"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: &Value) -> String {
        match required_str(args, "query") {
            Ok(query) => self.search(query, MAX_RESULTS).await,
            Err(e) => e,
        }
    }
}
