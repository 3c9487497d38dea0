//! Tool clients for the agents.
//!
//! Each tool is a thin, stateless HTTP wrapper around a third-party API
//! (web search, routing, weather, currency). Tools are looked up by name
//! through the `ToolRegistry`, and every runtime failure is reported as a
//! readable error string in place of results so an agent turn can carry
//! on. The only hard failure is a missing credential at construction.

pub mod currency;
pub mod duckduckgo;
pub mod route;
pub mod serper;
pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ToolsConfig, WayfarerConfig};
use crate::providers::{FunctionDef, ToolCall};

pub use currency::CurrencyTool;
pub use duckduckgo::DuckDuckGoSearchTool;
pub use route::RouteTool;
pub use serper::SerperSearchTool;
pub use weather::WeatherForecastTool;

/// A callable tool exposed to agents through function calling.
#[async_trait]
pub trait TravelTool: Send + Sync {
    /// Name the model calls the tool by
    fn name(&self) -> &'static str;

    /// Description shown to the model
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments
    fn parameters(&self) -> Value;

    /// Execute the tool. Failures come back as readable text, not errors.
    async fn call(&self, args: &Value) -> String;
}

/// Registry of constructed tools, dispatching calls by name.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn TravelTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build the registry from configuration. A tool whose credential is
    /// missing fails construction and is left out with a warning; the
    /// keyless DuckDuckGo search is always present.
    pub fn from_config(config: &WayfarerConfig) -> Self {
        let mut registry = Self::new();
        let tools = &config.tools;

        registry.register(Arc::new(DuckDuckGoSearchTool::new()));

        match SerperSearchTool::new(credential(tools, Credential::Serper)) {
            Ok(tool) => registry.register(Arc::new(tool)),
            Err(e) => warn!("serper search disabled: {e}"),
        }

        match RouteTool::new(credential(tools, Credential::Ors)) {
            Ok(tool) => registry.register(Arc::new(tool)),
            Err(e) => warn!("route lookup disabled: {e}"),
        }

        match WeatherForecastTool::new(credential(tools, Credential::OpenWeather)) {
            Ok(tool) => registry.register(Arc::new(tool)),
            Err(e) => warn!("weather forecast disabled: {e}"),
        }

        match CurrencyTool::new(credential(tools, Credential::Currency)) {
            Ok(tool) => registry.register(Arc::new(tool)),
            Err(e) => warn!("currency conversion disabled: {e}"),
        }

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn TravelTool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn TravelTool>> {
        self.tools.get(name).cloned()
    }

    /// Function definitions for the subset of `names` that is registered
    pub fn definitions(&self, names: &[&str]) -> Vec<FunctionDef> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| FunctionDef {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Execute a tool call against a whitelist. Unknown or off-whitelist
    /// tools produce an error string like any other tool failure.
    pub async fn dispatch(&self, whitelist: &[&str], call: &ToolCall) -> String {
        if !whitelist.contains(&call.name.as_str()) {
            return format!("Error: tool '{}' is not available for this agent", call.name);
        }

        match self.get(&call.name) {
            Some(tool) => {
                debug!(tool = %call.name, "dispatching tool call");
                tool.call(&call.arguments).await
            }
            None => format!("Error: tool '{}' is not configured", call.name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

enum Credential {
    Serper,
    Ors,
    OpenWeather,
    Currency,
}

fn credential(tools: &ToolsConfig, which: Credential) -> Option<String> {
    match which {
        Credential::Serper => WayfarerConfig::credential(tools.serper_api_key.as_ref(), "SERPER_API_KEY"),
        Credential::Ors => WayfarerConfig::credential(tools.ors_api_key.as_ref(), "ORS_API_KEY"),
        Credential::OpenWeather => {
            WayfarerConfig::credential(tools.openweather_api_key.as_ref(), "OPEN_WEATHER_API_KEY")
        }
        Credential::Currency => {
            WayfarerConfig::credential(tools.currency_api_key.as_ref(), "CURRENCY_API_KEY")
        }
    }
}

/// Read a required string argument from a tool-call payload.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Error: missing required argument '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl TravelTool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echoes the query back"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"query": {"type": "string"}}})
        }

        async fn call(&self, args: &Value) -> String {
            match required_str(args, "query") {
                Ok(q) => q.to_string(),
                Err(e) => e,
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_respects_whitelist() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let call = ToolCall {
            id: "echo-0".to_string(),
            name: "echo".to_string(),
            arguments: json!({"query": "hi"}),
        };

        let allowed = registry.dispatch(&["echo"], &call).await;
        assert_eq!(allowed, "hi");

        let denied = registry.dispatch(&[], &call).await;
        assert!(denied.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "nope-0".to_string(),
            name: "nope".to_string(),
            arguments: json!({}),
        };

        let out = registry.dispatch(&["nope"], &call).await;
        assert!(out.contains("not configured"));
    }

    #[test]
    fn test_definitions_filters_unregistered() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let defs = registry.definitions(&["echo", "missing"]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[test]
    fn test_required_str_rejects_blank() {
        let args = json!({"query": "   "});
        assert!(required_str(&args, "query").is_err());
    }
}
