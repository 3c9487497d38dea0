//! Task Runner
//!
//! The one generic runner behind every agent in the catalog: fill the
//! agent's prompt template from the context map, drive a bounded
//! tool-call loop against the provider, and normalize the final text into
//! an [`AgentOutput`]. Tool failures come back to the model as error
//! strings; the pipeline never aborts on a failed tool.

use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::AgentSpec;
use crate::config::WayfarerConfig;
use crate::errors::{Result, WayfarerError};
use crate::providers::{ChatOptions, Message, Provider};
use crate::tools::ToolRegistry;

/// Tool round cap per agent run
const MAX_TOOL_ROUNDS: usize = 4;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
}

/// Normalized output of one agent run
#[derive(Debug, Clone)]
pub struct AgentOutput {
    /// Raw model text
    pub raw: String,
    /// Best-effort JSON parse of the raw text, when the agent asks for it
    pub structured: Option<Value>,
}

impl AgentOutput {
    /// Value handed to downstream stages: the parsed JSON when available,
    /// the raw text otherwise.
    pub fn context_value(&self) -> String {
        match &self.structured {
            Some(value) => value.to_string(),
            None => self.raw.clone(),
        }
    }
}

/// Executes agents from the catalog against a provider and tool registry.
pub struct AgentRuntime {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &WayfarerConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Run one agent: interpolate, generate, loop on tool calls, parse.
    pub async fn run(
        &self,
        spec: &AgentSpec,
        user_prompt: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<AgentOutput> {
        let mut vars = context.clone();
        vars.insert("user_prompt".to_string(), user_prompt.to_string());

        let prompt = match fill_template(spec.template, &vars) {
            Ok(prompt) => prompt,
            Err(WayfarerError::Template(placeholder)) => {
                if let Some(fallback) = spec.fallback_reply {
                    warn!(
                        agent = spec.name,
                        placeholder = %placeholder,
                        "template interpolation failed, using fallback reply"
                    );
                    return Ok(AgentOutput {
                        raw: fallback.to_string(),
                        structured: None,
                    });
                }
                return Err(WayfarerError::Template(placeholder));
            }
            Err(e) => return Err(e),
        };

        let tool_defs = self.tools.definitions(spec.tools);
        let options = ChatOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: (!tool_defs.is_empty()).then_some(tool_defs),
            system: Some(spec.instructions.to_string()),
        };

        let mut messages = vec![Message::user(&prompt)];
        let mut rounds = 0;

        let raw = loop {
            let response = self
                .provider
                .chat(&messages, &options)
                .await
                .map_err(|e| WayfarerError::agent(spec.name, e.to_string()))?;

            if response.tool_calls.is_empty() {
                break response.content;
            }
            if rounds >= MAX_TOOL_ROUNDS {
                warn!(agent = spec.name, "tool round limit reached");
                break response.content;
            }
            rounds += 1;

            debug!(
                agent = spec.name,
                calls = response.tool_calls.len(),
                round = rounds,
                "executing tool calls"
            );

            messages.push(Message::tool_calls(response.tool_calls.clone()));
            for call in &response.tool_calls {
                let result = self.tools.dispatch(spec.tools, call).await;
                messages.push(Message::tool_result(call, &result));
            }
        };

        let structured = if spec.parse_json {
            parse_structured(&raw)
        } else {
            None
        };

        Ok(AgentOutput { raw, structured })
    }
}

/// Fill `{placeholder}` slots from the variable map. Unknown placeholders
/// are an interpolation error carrying the placeholder name.
pub fn fill_template(template: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let matched = caps.get(0).ok_or_else(|| {
            WayfarerError::Parse("placeholder capture missing".to_string())
        })?;
        let key = &caps[1];

        let value = vars
            .get(key)
            .ok_or_else(|| WayfarerError::Template(key.to_string()))?;

        out.push_str(&template[last..matched.start()]);
        out.push_str(value);
        last = matched.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Best-effort JSON parse: strip markdown fences, then try the whole
/// text, then the widest `{...}` slice. None when nothing parses.
pub fn parse_structured(raw: &str) -> Option<Value> {
    let mut candidate = raw.trim();

    if candidate.starts_with("```") {
        candidate = candidate
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
    }

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        if value.is_object() || value.is_array() {
            return Some(value);
        }
    }

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&candidate[start..=end])
        .ok()
        .filter(Value::is_object)
}
