//! End-to-end scenarios over a scripted provider: extraction through
//! dispatch through the full pipeline, with no network involved.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use wayfarer::agents::AgentRuntime;
use wayfarer::config::WayfarerConfig;
use wayfarer::memory::MemoryStore;
use wayfarer::orchestrator::Orchestrator;
use wayfarer::providers::{ChatOptions, ChatResponse, Message, Provider, ProviderError};
use wayfarer::tools::ToolRegistry;
use wayfarer::Intent;

/// Replays a fixed list of responses and records every prompt it saw.
struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    seen_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| (*s).to_string()).collect()),
            seen_prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.seen_prompts.lock().unwrap().clone()
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
        messages: &[Message],
        _options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let prompt = messages
            .first()
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        self.seen_prompts.lock().unwrap().push(prompt);

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

const SAMPLE: &str = "I want to travel from Delhi to Manali on 01/09/2025 to 03/09/2025. \
    I want to travel by my car, My budget is something about 20000 and we are travelling 2 person";

#[tokio::test]
async fn sample_request_fills_the_whole_context() {
    let provider = ScriptedProvider::new(&["estimated under budget"]);
    let orch = orchestrator(Arc::clone(&provider));

    let result = orch.process_user_input(SAMPLE).await;

    let ctx = &result.context;
    assert_eq!(ctx.origin.as_deref(), Some("Delhi"));
    assert_eq!(ctx.destination.as_deref(), Some("Manali"));
    assert_eq!(ctx.start_date.as_deref(), Some("2025-09-01"));
    assert_eq!(ctx.end_date.as_deref(), Some("2025-09-03"));
    assert_eq!(ctx.travel_mode_preference.as_deref(), Some("car"));
    assert_eq!(ctx.budget_total, Some(20_000));
    assert_eq!(ctx.travelers, Some(2));
}

#[tokio::test]
async fn weather_question_runs_only_the_weather_agent() {
    let provider = ScriptedProvider::new(&["mild, pack a jacket"]);
    let orch = orchestrator(Arc::clone(&provider));

    let result = orch.process_user_input("What's the weather like?").await;

    assert_eq!(result.intent, Intent::Weather);
    assert_eq!(result.response, "mild, pack a jacket");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("weather forecast"));
}

#[tokio::test]
async fn plan_everything_feeds_every_upstream_into_the_itinerary() {
    let provider = ScriptedProvider::new(&[
        "noted the budget",
        "research notes",
        "weather notes",
        "transport notes",
        "hotel notes",
        "{\"total_estimate\": 18000}",
        "a lovely three days",
    ]);
    let orch = orchestrator(Arc::clone(&provider));

    let first = orch.process_user_input(SAMPLE).await;
    assert!(first.error.is_none());

    let result = orch.process_user_input("now plan everything please").await;
    assert_eq!(result.intent, Intent::FullPlanning);
    assert_eq!(result.response, "a lovely three days");

    let prompts = provider.prompts();
    // 1 budget turn for the sample + 6 pipeline stages
    assert_eq!(prompts.len(), 7);

    // Stage order by template openings
    assert!(prompts[1].starts_with("Research attractions"));
    assert!(prompts[2].starts_with("Provide a weather forecast"));
    assert!(prompts[3].starts_with("Recommend transport options"));
    assert!(prompts[4].starts_with("Recommend hotels"));
    assert!(prompts[5].starts_with("Create a cost-optimized plan"));

    // The itinerary stage received every upstream value, none empty
    let itinerary_prompt = &prompts[6];
    assert!(itinerary_prompt.contains("research notes"));
    assert!(itinerary_prompt.contains("weather notes"));
    assert!(itinerary_prompt.contains("transport notes"));
    assert!(itinerary_prompt.contains("hotel notes"));
    assert!(itinerary_prompt.contains("18000"));
}

#[tokio::test]
async fn dependency_wiring_passes_stage_outputs_downstream() {
    let provider = ScriptedProvider::new(&[
        "research notes",
        "weather notes",
        "transport notes",
        "hotel notes",
        "{\"total_estimate\": 18000}",
        "a lovely three days",
    ]);
    let orch = orchestrator(Arc::clone(&provider));

    let plan = orch.plan_trip(SAMPLE).await.unwrap();
    assert_eq!(plan.stages.len(), 6);

    let prompts = provider.prompts();

    // transport sees the weather summary
    assert!(prompts[2].contains("weather notes"));
    // hotels see the attractions summary
    assert!(prompts[3].contains("research notes"));
    // budget sees transport and hotel output plus the computed trip length
    assert!(prompts[4].contains("transport notes"));
    assert!(prompts[4].contains("hotel notes"));
    assert!(prompts[4].contains("trip_length_days: 3"));
}

#[tokio::test]
async fn failed_pipeline_surfaces_an_error_but_keeps_the_turn() {
    // Only two stages' worth of script: the pipeline dies at transport
    let provider = ScriptedProvider::new(&["research notes", "weather notes"]);
    let orch = orchestrator(provider);

    let result = orch.process_user_input("plan everything").await;

    assert_eq!(result.intent, Intent::FullPlanning);
    assert!(result.error.is_some());

    let history = orch.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user_text, "plan everything");
}

#[tokio::test]
async fn follow_up_turn_remembers_the_destination() {
    let provider = ScriptedProvider::new(&["noted", "sunny all week"]);
    let orch = orchestrator(Arc::clone(&provider));

    orch.process_user_input("we're going from delhi to manali")
        .await;
    let result = orch.process_user_input("what's the weather there?").await;

    assert_eq!(result.intent, Intent::Weather);
    // The weather stage context carries the remembered destination
    let prompts = provider.prompts();
    assert!(prompts[1].contains("destination: Manali"));
    // And the recalled conversation is threaded into the prompt
    assert!(prompts[1].contains("Recent conversation:"));
    assert!(prompts[1].contains("we're going from delhi to manali"));
}
