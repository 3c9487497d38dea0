//! DuckDuckGo search over the HTML endpoint. No credential required.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

use super::{required_str, TravelTool};

const DDG_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 5;

lazy_static! {
    static ref RESULT_LINK: Regex =
        Regex::new(r#"class="result__a"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)
            .unwrap();
    static ref RESULT_SNIPPET: Regex =
        Regex::new(r#"class="result__snippet"[^>]*>(.*?)</a>"#).unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Web search for hidden gems, blogs, forums and local tips.
pub struct DuckDuckGoSearchTool {
    client: Client,
}

impl DuckDuckGoSearchTool {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Search DuckDuckGo and format the first few results
    pub async fn search(&self, query: &str, max_results: usize) -> String {
        let response = match self
            .client
            .get(DDG_ENDPOINT)
            .query(&[("q", query)])
            .header("User-Agent", "Mozilla/5.0 (compatible; wayfarer)")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return format!("Request failed: {e}"),
        };

        if !response.status().is_success() {
            return format!("DuckDuckGo error: {}", response.status());
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => return format!("Error occurred: {e}"),
        };

        let snippets: Vec<&str> = RESULT_SNIPPET
            .captures_iter(&html)
            .map(|c| c.get(1).map_or("", |m| m.as_str()))
            .collect();

        let results: Vec<String> = RESULT_LINK
            .captures_iter(&html)
            .take(max_results)
            .enumerate()
            .map(|(i, c)| {
                let href = c.get(1).map_or("", |m| m.as_str());
                let title = strip_tags(c.get(2).map_or("", |m| m.as_str()));
                let body = snippets
                    .get(i)
                    .map(|s| strip_tags(s))
                    .unwrap_or_default();
                format!("- {title} ({href})\n  {body}")
            })
            .collect();

        if results.is_empty() {
            "No results found.".to_string()
        } else {
            results.join("\n")
        }
    }
}

impl Default for DuckDuckGoSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").trim().to_string()
}

#[async_trait]
impl TravelTool for DuckDuckGoSearchTool {
    fn name(&self) -> &'static str {
        "duckduckgo_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for hidden gems, blogs, forums, and travel tips. \
         Use this tool when looking for local or lesser-known information."
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
