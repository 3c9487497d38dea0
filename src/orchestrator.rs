//! Session Orchestrator
//!
//! The stateful controller behind a conversation: it owns the session's
//! trip context, the per-agent outputs, and the turn history. Each user
//! input is extracted into the context, classified, dispatched to exactly
//! one agent (or the full six-stage pipeline), and persisted to memory.
//! The whole turn runs under the session lock, so concurrent turns for
//! the same session cannot interleave context reads and writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::agents::{self, AgentOutput, AgentRuntime};
use crate::config::WayfarerConfig;
use crate::context::TripContext;
use crate::errors::{Result, WayfarerError};
use crate::intent::{self, Intent};
use crate::memory::MemoryStore;
use crate::providers;
use crate::tools::ToolRegistry;

/// One exchange in the session history
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user_text: String,
    pub assistant_text: String,
}

/// Outcome of one conversational turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub intent: Intent,
    pub response: String,
    /// Set when the dispatched agent failed; the turn is still recorded
    pub error: Option<String>,
    pub context: TripContext,
}

/// Output of the non-conversational six-stage pipeline
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// (agent name, output) in execution order
    pub stages: Vec<(&'static str, AgentOutput)>,
}

impl PlanResult {
    pub fn get(&self, name: &str) -> Option<&AgentOutput> {
        self.stages
            .iter()
            .find(|(stage, _)| *stage == name)
            .map(|(_, output)| output)
    }
}

#[derive(Default)]
struct SessionState {
    context: TripContext,
    outputs: HashMap<String, AgentOutput>,
    history: Vec<ConversationTurn>,
}

/// Per-session conversation controller.
pub struct Orchestrator {
    session_id: String,
    runtime: AgentRuntime,
    memory: Arc<MemoryStore>,
    top_k: usize,
    default_travelers: u32,
    state: Mutex<SessionState>,
}

impl Orchestrator {
    pub fn new(runtime: AgentRuntime, memory: Arc<MemoryStore>, config: &WayfarerConfig) -> Self {
        Self {
            session_id: generate_session_id(),
            runtime,
            memory,
            top_k: config.memory_top_k,
            default_travelers: config.default_travelers,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Assemble a session from configuration: provider registry, tool
    /// registry, memory store, runtime.
    pub fn from_config(config: &WayfarerConfig) -> Result<Self> {
        let registry =
            providers::create_registry(&config.providers, config.default_provider.as_deref());
        let provider = registry.default().ok_or_else(|| {
            WayfarerError::Configuration("no LLM provider configured".to_string())
        })?;
        info!(provider = provider.name(), "session provider selected");

        let tools = Arc::new(ToolRegistry::from_config(config));
        let runtime = AgentRuntime::new(provider, tools, config);
        let memory = Arc::new(MemoryStore::new(Duration::from_secs(config.memory_ttl_secs)));

        Ok(Self::new(runtime, memory, config))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Process one user turn: recall, extract, classify, dispatch,
    /// persist, respond.
    pub async fn process_user_input(&self, text: &str) -> TurnResult {
        let mut state = self.state.lock().await;

        let past = self.memory.recent(&self.session_id, self.top_k).await;
        let past_context = past
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");

        state.context.merge(&TripContext::extract(text));
        let intent = intent::classify(text);
        info!(intent = %intent, session = %self.session_id, "processing turn");

        let outcome = match intent {
            Intent::FullPlanning => self
                .run_pipeline(&mut state, text, &past_context)
                .await
                .map(|plan| {
                    plan.get("itinerary")
                        .map(|o| o.raw.clone())
                        .unwrap_or_default()
                }),
            _ => self.run_single(&mut state, intent, text, &past_context).await,
        };

        let (response, error) = match outcome {
            Ok(response) => (response, None),
            Err(e) => {
                warn!(intent = %intent, error = %e, "agent turn failed");
                (
                    "I could not complete that request; please try again.".to_string(),
                    Some(e.to_string()),
                )
            }
        };

        // The turn is recorded even when the agent failed
        let memory_text = format!("User: {text}\nAssistant: {response}");
        self.memory
            .put(
                &self.session_id,
                &memory_text,
                json!({"intent": intent.as_str()}),
            )
            .await;

        state.history.push(ConversationTurn {
            user_text: text.to_string(),
            assistant_text: response.clone(),
        });

        TurnResult {
            intent,
            response,
            error,
            context: state.context.clone(),
        }
    }

    /// Non-conversational entry point: run all six stages in dependency
    /// order for a single prompt.
    pub async fn plan_trip(&self, user_prompt: &str) -> Result<PlanResult> {
        let mut state = self.state.lock().await;
        state.context.merge(&TripContext::extract(user_prompt));
        info!(context = %state.context.summary(), "running full planning pipeline");

        self.run_pipeline(&mut state, user_prompt, "").await
    }

    /// Current context summary for the front end
    pub async fn context_summary(&self) -> String {
        self.state.lock().await.context.summary()
    }

    /// Session history snapshot
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.state.lock().await.history.clone()
    }

    /// Forget everything this session accumulated
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::default();
        self.memory.clear(&self.session_id).await;
        info!(session = %self.session_id, "session reset");
    }

    /// Dispatch the single agent answering `intent`.
    async fn run_single(
        &self,
        state: &mut SessionState,
        intent: Intent,
        user_prompt: &str,
        past_context: &str,
    ) -> Result<String> {
        let name = intent.agent_name();
        let spec = agents::find(name)
            .ok_or_else(|| WayfarerError::agent(name, "not in catalog"))?;

        let context = self.stage_context(state, name, past_context);
        let output = self.runtime.run(spec, user_prompt, &context).await?;
        let response = output.raw.clone();
        state.outputs.insert(name.to_string(), output);

        Ok(response)
    }

    /// The fixed six-stage pipeline. Each stage receives the outputs of
    /// its declared dependencies plus the shared trip context.
    async fn run_pipeline(
        &self,
        state: &mut SessionState,
        user_prompt: &str,
        past_context: &str,
    ) -> Result<PlanResult> {
        let mut stages = Vec::with_capacity(agents::CATALOG.len());

        for (index, spec) in agents::CATALOG.iter().enumerate() {
            info!(
                stage = index + 1,
                total = agents::CATALOG.len(),
                agent = spec.name,
                "running pipeline stage"
            );

            let context = self.stage_context(state, spec.name, past_context);
            let output = self.runtime.run(spec, user_prompt, &context).await?;

            state.outputs.insert(spec.name.to_string(), output.clone());
            stages.push((spec.name, output));
        }

        Ok(PlanResult { stages })
    }

    /// Context map for one stage: the slice of the trip context the stage
    /// depends on, plus its upstream outputs when they exist.
    fn stage_context(
        &self,
        state: &SessionState,
        name: &str,
        past_context: &str,
    ) -> BTreeMap<String, String> {
        let ctx = &state.context;
        let travelers = ctx.travelers.unwrap_or(self.default_travelers);
        let unset = || "unknown".to_string();

        let mut pairs: Vec<(&str, String)> = Vec::new();
        match name {
            "weather" => {
                pairs.push(("destination", ctx.destination.clone().unwrap_or_else(unset)));
                pairs.push(("start_date", ctx.start_date.clone().unwrap_or_else(unset)));
                pairs.push(("end_date", ctx.end_date.clone().unwrap_or_else(unset)));
            }
            "transport" => {
                pairs.push(("origin", ctx.origin.clone().unwrap_or_else(unset)));
                pairs.push(("destination", ctx.destination.clone().unwrap_or_else(unset)));
                pairs.push((
                    "travel_mode_preference",
                    ctx.travel_mode_preference.clone().unwrap_or_else(unset),
                ));
                pairs.push(("travelers", travelers.to_string()));
                if let Some(weather) = state.outputs.get("weather") {
                    pairs.push(("weather_summary", weather.raw.clone()));
                }
            }
            "hotels" => {
                pairs.push(("destination", ctx.destination.clone().unwrap_or_else(unset)));
                pairs.push((
                    "budget_total",
                    ctx.budget_total.map_or_else(unset, |b| b.to_string()),
                ));
                pairs.push(("travelers", travelers.to_string()));
                if let Some(research) = state.outputs.get("research") {
                    pairs.push(("attractions_summary", research.raw.clone()));
                }
            }
            "budget" => {
                pairs.push((
                    "budget_total",
                    ctx.budget_total.map_or_else(unset, |b| b.to_string()),
                ));
                pairs.push((
                    "trip_length_days",
                    ctx.trip_length_days().map_or_else(unset, |d| d.to_string()),
                ));
                pairs.push(("travelers", travelers.to_string()));
                if let Some(transport) = state.outputs.get("transport") {
                    pairs.push(("transport_estimates", transport.raw.clone()));
                }
                if let Some(hotels) = state.outputs.get("hotels") {
                    pairs.push(("hotel_options", hotels.raw.clone()));
                }
            }
            // research and itinerary both see the full trip context
            _ => {
                pairs.push(("origin", ctx.origin.clone().unwrap_or_else(unset)));
                pairs.push(("destination", ctx.destination.clone().unwrap_or_else(unset)));
                pairs.push(("start_date", ctx.start_date.clone().unwrap_or_else(unset)));
                pairs.push(("end_date", ctx.end_date.clone().unwrap_or_else(unset)));
                pairs.push((
                    "travel_mode_preference",
                    ctx.travel_mode_preference.clone().unwrap_or_else(unset),
                ));
                pairs.push((
                    "budget_total",
                    ctx.budget_total.map_or_else(unset, |b| b.to_string()),
                ));
                pairs.push(("travelers", travelers.to_string()));
            }
        }

        let mut rendered = pairs
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");

        if !past_context.is_empty() {
            rendered.push_str("\nRecent conversation:\n");
            rendered.push_str(past_context);
        }

        let mut map = BTreeMap::new();
        map.insert("context".to_string(), rendered);

        // The itinerary template names its five upstream stages directly;
        // a stage that never ran stays absent and triggers the fallback.
        if name == "itinerary" {
            for upstream in ["research", "weather", "transport", "hotels", "budget"] {
                if let Some(output) = state.outputs.get(upstream) {
                    map.insert(upstream.to_string(), output.context_value());
                }
            }
        }

        map
    }
}

fn generate_session_id() -> String {
    format!("sess_{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::providers::{ChatOptions, ChatResponse, Message, Provider, ProviderError};
    use crate::tools::ToolRegistry;

    struct ScriptedProvider {
        responses: std::sync::Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: std::sync::Mutex::new(
                    responses.iter().map(|s| (*s).to_string()).collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn default_model(&self) -> &'static str {
            "scripted-model"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _options: &ChatOptions,
        ) -> std::result::Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::ApiError("script exhausted".to_string()))?;

            Ok(ChatResponse {
                content,
                tool_calls: Vec::new(),
                usage: None,
            })
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
        let config = WayfarerConfig::sensible_defaults();
        let runtime = AgentRuntime::new(provider, Arc::new(ToolRegistry::new()), &config);
        let memory = Arc::new(MemoryStore::new(Duration::from_secs(3600)));
        Orchestrator::new(runtime, memory, &config)
    }

    #[tokio::test]
    async fn test_weather_question_dispatches_one_agent() {
        let provider = Arc::new(ScriptedProvider::new(&["cold and clear"]));
        let orch = orchestrator(Arc::clone(&provider));

        let result = orch.process_user_input("What's the weather like?").await;

        assert_eq!(result.intent, Intent::Weather);
        assert_eq!(result.response, "cold and clear");
        assert!(result.error.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plan_everything_runs_six_stages_in_order() {
        let provider = Arc::new(ScriptedProvider::new(&[
            "research notes",
            "weather notes",
            "transport notes",
            "hotel notes",
            "{\"total_estimate\": 18000}",
            "day one, day two",
        ]));
        let orch = orchestrator(Arc::clone(&provider));

        let result = orch
            .process_user_input("from delhi to manali, please plan everything")
            .await;

        assert_eq!(result.intent, Intent::FullPlanning);
        assert_eq!(result.response, "day one, day two");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_failed_agent_turn_is_kept_in_history() {
        // Script exhausted immediately: the weather agent fails
        let provider = Arc::new(ScriptedProvider::new(&[]));
        let orch = orchestrator(provider);

        let result = orch.process_user_input("What's the weather like?").await;

        assert!(result.error.is_some());
        assert!(!result.response.is_empty());

        let history = orch.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_text, "What's the weather like?");
    }

    #[tokio::test]
    async fn test_context_accumulates_across_turns() {
        let provider = Arc::new(ScriptedProvider::new(&["a", "b"]));
        let orch = orchestrator(provider);

        let first = orch.process_user_input("from delhi to manali").await;
        assert_eq!(first.context.destination.as_deref(), Some("Manali"));

        let second = orch.process_user_input("what's the weather?").await;
        assert_eq!(second.context.destination.as_deref(), Some("Manali"));
        assert_eq!(second.context.origin.as_deref(), Some("Delhi"));
    }

    #[tokio::test]
    async fn test_itinerary_without_upstream_falls_back() {
        let provider = Arc::new(ScriptedProvider::new(&["never used"]));
        let orch = orchestrator(Arc::clone(&provider));

        let result = orch.process_user_input("show me the itinerary").await;

        assert_eq!(result.intent, Intent::Itinerary);
        assert!(result.error.is_none());
        assert!(result.response.contains("could not assemble the itinerary"));
        // The fallback reply never reached the provider
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_trip_wires_dependencies() {
        let provider = Arc::new(ScriptedProvider::new(&[
            "research notes",
            "weather notes",
            "transport notes",
            "hotel notes",
            "{\"total_estimate\": 18000}",
            "full itinerary",
        ]));
        let orch = orchestrator(provider);

        let plan = orch
            .plan_trip("from delhi to manali on 01/09/2025 to 03/09/2025")
            .await
            .unwrap();

        let names: Vec<&str> = plan.stages.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["research", "weather", "transport", "hotels", "budget", "itinerary"]
        );
        assert_eq!(plan.get("budget").unwrap().structured.as_ref().unwrap()["total_estimate"], 18000);
        assert_eq!(plan.get("itinerary").unwrap().raw, "full itinerary");
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_memory() {
        let provider = Arc::new(ScriptedProvider::new(&["a"]));
        let orch = orchestrator(provider);

        orch.process_user_input("from delhi to manali").await;
        orch.reset().await;

        assert!(orch.history().await.is_empty());
        assert!(orch.context_summary().await.contains("origin: -"));
    }
}
