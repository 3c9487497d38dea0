//! Gemini (Google) Provider
//!
//! Calls the generativelanguage `generateContent` endpoint with system
//! instruction and function declarations, and maps `functionCall` parts
//! back into tool calls.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{
    ChatOptions, ChatResponse, FunctionDef, GeminiConfig, Message, MessageContent, Provider,
    ProviderError, Role, ToolCall, Usage,
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::ConfigError("GEMINI_API_KEY not set".to_string()))?;
        Ok(Self::new(&api_key))
    }

    pub fn from_config(config: &GeminiConfig) -> Option<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())?;

        let mut provider = Self::new(&api_key);
        if let Some(ref model) = config.default_model {
            provider.default_model = model.clone();
        }
        Some(provider)
    }

    /// Maps the neutral message list onto Gemini `contents`.
    fn convert_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };

                let parts = match &msg.content {
                    MessageContent::Text(text) => vec![json!({"text": text})],
                    MessageContent::ToolCalls(calls) => calls
                        .iter()
                        .map(|c| {
                            json!({"functionCall": {"name": c.name, "args": c.arguments}})
                        })
                        .collect(),
                    MessageContent::ToolResult {
                        tool_name, content, ..
                    } => vec![json!({
                        "functionResponse": {
                            "name": tool_name,
                            "response": {"content": content},
                        }
                    })],
                };

                json!({"role": role, "parts": parts})
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[FunctionDef]) -> Value {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();

        json!([{"functionDeclarations": declarations}])
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
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

        let url = format!(
            "{GEMINI_API_URL}/{model}:generateContent?key={key}",
            key = self.api_key
        );

        let mut body = Map::new();
        body.insert(
            "contents".to_string(),
            Value::Array(self.convert_messages(messages)),
        );

        if let Some(ref system) = options.system {
            body.insert(
                "systemInstruction".to_string(),
                json!({"parts": [{"text": system}]}),
            );
        }

        if let Some(ref tools) = options.tools {
            if !tools.is_empty() {
                body.insert("tools".to_string(), self.convert_tools(tools));
            }
        }

        let mut generation = Map::new();
        if let Some(temp) = options.temperature {
            generation.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tokens) = options.max_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if !generation.is_empty() {
            body.insert("generationConfig".to_string(), Value::Object(generation));
        }

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::InvalidApiKey);
            }
            return Err(ProviderError::ApiError(format!("{status}: {text}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let parts = payload
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| ProviderError::ParseError("No candidate content".to_string()))?;

        let mut content = Vec::new();
        let mut tool_calls = Vec::new();

        for (idx, part) in parts.iter().enumerate() {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                if !text.trim().is_empty() {
                    content.push(text.trim().to_string());
                }
            }

            if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string();
                let arguments = call.get("args").cloned().unwrap_or_else(|| json!({}));

                tool_calls.push(ToolCall {
                    // Gemini does not assign call ids
                    id: format!("{name}-{idx}"),
                    name,
                    arguments,
                });
            }
        }

        let usage = payload.get("usageMetadata").map(|u| Usage {
            prompt_tokens: u
                .get("promptTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
            completion_tokens: u
                .get("candidatesTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
            total_tokens: u
                .get("totalTokenCount")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
        });

        Ok(ChatResponse {
            content: content.join("\n\n"),
            tool_calls,
            usage,
        })
    }
}
