//! LLM Provider Abstraction Layer
//!
//! Unified interface over the chat backends the agents run on:
//! - Gemini (Google, the default)
//! - Ollama (local)
//!
//! A provider is an opaque, slow, fallible remote call. Agents only see
//! `chat(messages, options) -> ChatResponse`.

mod gemini;
mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.to_string()),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.to_string()),
        }
    }

    /// Assistant turn carrying the tool calls the model requested
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::ToolCalls(calls),
        }
    }

    /// Result of a tool execution, fed back to the model
    pub fn tool_result(call: &ToolCall, content: &str) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::ToolResult {
                tool_use_id: call.id.clone(),
                tool_name: call.name.clone(),
                content: content.to_string(),
            },
        }
    }

    /// Returns content as text (simplified)
    pub fn text(&self) -> &str {
        match &self.content {
            MessageContent::Text(t) => t,
            MessageContent::ToolResult { content, .. } => content,
            MessageContent::ToolCalls(_) => "",
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Message content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    ToolCalls(Vec<ToolCall>),
    ToolResult {
        tool_use_id: String,
        tool_name: String,
        content: String,
    },
}

/// Function/tool definition exposed to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Chat options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub tools: Option<Vec<FunctionDef>>,
    pub system: Option<String>,
}

/// Complete response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
}

/// Tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Token usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Main trait for providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Default model
    fn default_model(&self) -> &str;

    /// Blocking chat completion
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError>;

    /// Supports tools/function calling?
    fn supports_tools(&self) -> bool {
        true
    }
}

/// Provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Global provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: Option<String>,
    pub default_model: Option<String>,
}

/// Provider registry
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    default_provider: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            default_provider: None,
        }
    }

    /// Register a provider
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    /// Set the default provider
    pub fn set_default(&mut self, name: &str) {
        self.default_provider = Some(name.to_string());
    }

    /// Provider by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Default provider, first registered one otherwise
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        if let Some(ref name) = self.default_provider {
            self.get(name)
        } else {
            self.providers.first().cloned()
        }
    }

    /// All registered provider names
    pub fn list(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry from configuration
pub fn create_registry(config: &ProvidersConfig, default_provider: Option<&str>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    // Gemini
    if let Some(ref gemini_config) = config.gemini {
        if let Some(provider) = GeminiProvider::from_config(gemini_config) {
            registry.register(Arc::new(provider));
        }
    } else if let Ok(provider) = GeminiProvider::from_env() {
        registry.register(Arc::new(provider));
    }

    // Ollama (local, always available)
    let ollama_config = config.ollama.clone().unwrap_or_default();
    registry.register(Arc::new(OllamaProvider::new(&ollama_config)));

    if let Some(default) = default_provider {
        registry.set_default(default);
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");

        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_tool_result_message() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "serper_search".to_string(),
            arguments: serde_json::json!({"query": "Manali"}),
        };
        let msg = Message::tool_result(&call, "results here");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "results here");
    }

    #[test]
    fn test_registry_default_falls_back_to_first() {
        let config = ProvidersConfig::default();
        let registry = create_registry(&config, None);

        // Ollama is always registered
        assert!(registry.list().contains(&"ollama"));
        assert!(registry.default().is_some());
    }
}
