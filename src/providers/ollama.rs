//! Ollama Provider
//!
//! Local models via Ollama (OpenAI-compatible API). Useful as an offline
//! fallback when no Gemini key is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    ChatOptions, ChatResponse, FunctionDef, Message, MessageContent, OllamaConfig, Provider,
    ProviderError, ToolCall, Usage,
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/v1/chat/completions";

/// Provider for Ollama (local models)
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OllamaProvider {
    /// Create a provider with the default URL
    pub fn new(config: &OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            default_model: config
                .default_model
                .clone()
                .unwrap_or_else(|| "llama3.2".to_string()),
        }
    }

    /// Convert messages to the OpenAI wire format
    fn convert_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<Value> {
        let mut out = Vec::new();

        if let Some(system) = system {
            out.push(json!({"role": "system", "content": system}));
        }

        for msg in messages {
            match &msg.content {
                MessageContent::Text(text) => {
                    out.push(json!({"role": msg.role.as_str(), "content": text}));
                }
                MessageContent::ToolCalls(calls) => {
                    let tool_calls: Vec<Value> = calls
                        .iter()
                        .map(|c| {
                            json!({
                                "id": c.id,
                                "type": "function",
                                "function": {
                                    "name": c.name,
                                    "arguments": c.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    out.push(json!({
                        "role": "assistant",
                        "content": Value::Null,
                        "tool_calls": tool_calls,
                    }));
                }
                MessageContent::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => {
                    out.push(json!({
                        "role": "tool",
                        "tool_call_id": tool_use_id,
                        "content": content,
                    }));
                }
            }
        }

        out
    }

    fn convert_tools(&self, tools: &[FunctionDef]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }

    /// Check whether Ollama is reachable
    pub async fn is_available(&self) -> bool {
        let health_url = self.base_url.replace("/v1/chat/completions", "/api/tags");
        self.client.get(&health_url).send().await.is_ok()
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_model: None,
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn supports_tools(&self) -> bool {
        true // model dependent
    }

    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut body = json!({
            "model": model,
            "messages": self.convert_messages(messages, options.system.as_deref()),
            "stream": false,
        });

        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temp) = options.temperature {
            body["temperature"] = json!(temp);
        }

        if let Some(ref tools) = options.tools {
            if !tools.is_empty() {
                body["tools"] = json!(self.convert_tools(tools));
            }
        }

        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConfigError(
                        "Ollama not running. Start with: ollama serve".to_string(),
                    )
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(ProviderError::ApiError(format!("{status}: {text}")));
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let choice = api_response
            .choices
            .first()
            .ok_or_else(|| ProviderError::ParseError("No choices".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();

        let tool_calls = choice
            .message
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|tc| ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: serde_json::from_str(&tc.function.arguments)
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            tool_calls,
            usage: api_response.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

// OpenAI-compatible wire types

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    choices: Vec<OllamaChoice>,
    usage: Option<OllamaUsage>,
}

#[derive(Debug, Deserialize)]
struct OllamaChoice {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    id: String,
    function: OllamaToolFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaToolFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OllamaUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        let provider = OllamaProvider::new(&config);

        assert_eq!(provider.default_model(), "llama3.2");
        assert!(provider.base_url.contains("localhost:11434"));
    }

    #[test]
    fn test_message_conversion() {
        let config = OllamaConfig::default();
        let provider = OllamaProvider::new(&config);

        let messages = vec![Message::user("Hello"), Message::assistant("Hi!")];
        let converted = provider.convert_messages(&messages, Some("be brief"));

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0]["role"], "system");
        assert_eq!(converted[1]["role"], "user");
        assert_eq!(converted[1]["content"], "Hello");
    }

    #[test]
    fn test_tool_result_conversion() {
        let config = OllamaConfig::default();
        let provider = OllamaProvider::new(&config);

        let call = ToolCall {
            id: "call_9".to_string(),
            name: "currency_convert".to_string(),
            arguments: json!({"amount": 100}),
        };
        let messages = vec![Message::tool_result(&call, "done")];
        let converted = provider.convert_messages(&messages, None);

        assert_eq!(converted[0]["role"], "tool");
        assert_eq!(converted[0]["tool_call_id"], "call_9");
    }
}
