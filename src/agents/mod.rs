//! Agent Catalog
//!
//! Agents are configuration, not types: each entry binds a role, system
//! instructions, a tool whitelist, and a prompt template to the one
//! generic runner in [`runner`]. Adding an agent means adding a row here.

pub mod runner;

pub use runner::{AgentOutput, AgentRuntime};

/// Static definition of one agent
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec {
    /// Key used in output maps and intent dispatch
    pub name: &'static str,
    /// Short human-readable role
    pub role: &'static str,
    /// System instructions sent with every run
    pub instructions: &'static str,
    /// Tools the agent may call, by registry name
    pub tools: &'static [&'static str],
    /// Prompt template with `{placeholder}` slots
    pub template: &'static str,
    /// Attempt a best-effort JSON parse of the raw output
    pub parse_json: bool,
    /// Reply used when template interpolation fails, instead of an error
    pub fallback_reply: Option<&'static str>,
}

const RESEARCH_INSTRUCTIONS: &str = "\
You are a senior travel analyst who blends Google and DuckDuckGo results to produce \
concise, trustworthy travel research. Prioritize recent, authoritative sources \
(official sites, tourism boards, well-known travel outlets) and surface hidden gems \
from credible blogs and local forums. Cross-check claims and avoid outdated info.

Output style: begin with a short summary paragraph (3-5 sentences); describe top \
attractions in fluent text with bullets only when listing options; mention hidden \
gems and local tips in natural sentences; explain practical advice (transport, \
neighborhoods, safety) in paragraph form; end with a simple list of source links.

Tool usage: for 'top/best/official' attractions use serper_search; for \
'hidden/local/blog' content use duckduckgo_search; if results disagree, mention the \
discrepancy and cite both; include links for every recommendation cluster.";

const WEATHER_INSTRUCTIONS: &str = "\
You are an expert travel meteorologist and safety consultant. You advise travelers \
on weather conditions, potential hazards, and safety considerations: short-term \
forecasts, best hours for sightseeing or indoor alternatives, packing and clothing \
tips, and awareness of extreme events like storms, floods, heatwaves or cold snaps.

Output style: 1) quick summary (3-5 bullets on expected weather and travel safety); \
2) daily forecasts (temperature, precipitation, wind, daylight, warnings); \
3) activity advice; 4) travel safety assessment (explicitly state if it is safe to \
travel and why); 5) travel tips; 6) sources.

Tool usage: use weather_forecast for the raw daily numbers; for official forecasts \
and alerts use serper_search; for local insights and community reports use \
duckduckgo_search; mention discrepancies if sources differ and link every forecast, \
warning, or tip.";

const TRANSPORT_INSTRUCTIONS: &str = "\
You are an expert travel mobility consultant. You advise travelers on the best ways \
to move around efficiently and safely: public transport, ride-hailing, taxis and \
rentals, walking and cycling routes, travel time optimization, cost comparison, and \
safety tips including high-risk areas and local regulations.

Output style: 1) quick summary (3-5 bullets on the overall transport situation); \
2) recommended transport modes grouped by convenience; 3) estimated travel times and \
costs for key routes; 4) safety and accessibility tips; 5) practical advice \
(tickets, passes, apps, peak hours); 6) sources.

Tool usage: for official schedules or apps use serper_search; for local tips, blogs \
and forums use duckduckgo_search; for route planning and distance/time calculations \
use route_lookup; mention conflicting information and include links for every \
recommendation.";

const HOTELS_INSTRUCTIONS: &str = "\
You are a senior travel accommodation analyst with deep expertise in hotels, \
hostels, B&Bs, and vacation rentals worldwide. Evaluate location proximity to \
attractions, transport and dining; compare amenities, pricing and guest reviews; \
highlight unique stays; and give realistic booking tips for peak and off-peak \
periods.

Output style: 1) quick summary (3-5 bullets on the accommodation scene); \
2) recommended hotels grouped by budget category with name, location, amenities, \
price range and a booking tip; 3) hidden gems and unique stays; 4) practical tips \
(best neighborhoods, peak/off-peak advice, safety and transport); 5) sources.

Tool usage: for official listings and top-rated hotels use serper_search; for local \
favorites, blogs and reviews use duckduckgo_search; compare sources when they \
differ and include links for every recommendation.";

const BUDGET_INSTRUCTIONS: &str = "\
You are a travel budget consultant with expertise in optimizing costs for trips \
without reducing value. Evaluate total trip costs (accommodation, transport, \
attractions, food), suggest cheaper alternatives and local deals, recommend \
multi-day passes, discounts and off-peak strategies, and provide realistic per-day \
budgets and cost breakdowns. Use currency_convert when amounts need to be expressed \
in the traveler's currency.

Rules: always provide realistic cost estimates in local currency; suggest at least \
one alternative option per major cost component; keep the output structured for \
easy reading and integration with itineraries.";

const ITINERARY_INSTRUCTIONS: &str = "\
You are a world-class travel planner with 15+ years of experience crafting \
memorable journeys. You understand travel psychology, optimal pacing, and how to \
create itineraries that feel natural rather than rushed: geographic clustering, \
realistic visit durations and travel times, energy flow, cultural immersion, and \
practical logistics such as opening hours and reservations.

Rules: group geographically close attractions on the same day; consider opening \
hours and crowd patterns; include realistic travel time between locations; mix \
popular sights with local experiences; provide alternatives for weather or closure \
contingencies; keep energy levels sustainable and never over-pack a day.";

const RESEARCH_TEMPLATE: &str = "\
Research attractions and local tips for the given trip.
Main request: {user_prompt}.
Additional context: {context}.
Cover: summary, top attractions, hidden gems, practical tips, sources.";

const WEATHER_TEMPLATE: &str = "\
Provide a weather forecast and an explicit safety assessment for the given destination and dates.
Main request: {user_prompt}.
Additional context: {context}.
Include: quick summary, daily forecasts, activity advice, travel safety ('Safe'/'Unsafe'), sources.";

const TRANSPORT_TEMPLATE: &str = "\
Recommend transport options for origin -> destination and key local legs.
Consider the travel mode preference and any constraints in the context.
Main request: {user_prompt}.
Additional context: {context}.
Include: recommended modes, estimated times, cost estimates, route notes, safety advice, apps and tips, sources.";

const HOTELS_TEMPLATE: &str = "\
Recommend hotels or alternatives in the destination within the given budget and near the main attractions.
Main request: {user_prompt}.
Additional context: {context}.
Group suggestions by budget (budget/mid/luxury) with name, brief notes, approximate price, and booking tips.";

const BUDGET_TEMPLATE: &str = "\
Create a cost-optimized plan for the trip from the provided context (transport estimates, hotel options, trip length, travelers).
Main request: {user_prompt}.
Additional context: {context}.
Return strictly structured JSON with the keys: total_estimate, per_day_breakdown, per_component_costs, suggested_savings, alternatives.";

const ITINERARY_TEMPLATE: &str = "\
You are creating a day-by-day travel itinerary.

User request:
{user_prompt}

Supporting context:
- Travel research: {research}
- Weather: {weather}
- Transport: {transport}
- Hotels: {hotels}
- Budget: {budget}

For each day include: Morning, Lunch, Afternoon, Evening, Dinner & Night, Daily Budget, Getting Around, Pro Tip.
Write the itinerary as flowing narrative paragraphs with transitions, not JSON and not bullet lists.";

const ITINERARY_FALLBACK: &str = "\
I'm sorry - I could not assemble the itinerary from the plan so far. \
Please run the full planning step again.";

/// The six agents, in pipeline dependency order.
pub const CATALOG: &[AgentSpec] = &[
    AgentSpec {
        name: "research",
        role: "Travel Researcher",
        instructions: RESEARCH_INSTRUCTIONS,
        tools: &["serper_search", "duckduckgo_search"],
        template: RESEARCH_TEMPLATE,
        parse_json: false,
        fallback_reply: None,
    },
    AgentSpec {
        name: "weather",
        role: "Weather & Safety Advisor",
        instructions: WEATHER_INSTRUCTIONS,
        tools: &["serper_search", "duckduckgo_search", "weather_forecast"],
        template: WEATHER_TEMPLATE,
        parse_json: false,
        fallback_reply: None,
    },
    AgentSpec {
        name: "transport",
        role: "Transport & Local Mobility Advisor",
        instructions: TRANSPORT_INSTRUCTIONS,
        tools: &["serper_search", "duckduckgo_search", "route_lookup"],
        template: TRANSPORT_TEMPLATE,
        parse_json: false,
        fallback_reply: None,
    },
    AgentSpec {
        name: "hotels",
        role: "Hotel & Accommodation Specialist",
        instructions: HOTELS_INSTRUCTIONS,
        tools: &["serper_search", "duckduckgo_search"],
        template: HOTELS_TEMPLATE,
        parse_json: false,
        fallback_reply: None,
    },
    AgentSpec {
        name: "budget",
        role: "Travel Budget Optimizer",
        instructions: BUDGET_INSTRUCTIONS,
        tools: &["currency_convert"],
        template: BUDGET_TEMPLATE,
        parse_json: true,
        fallback_reply: None,
    },
    AgentSpec {
        name: "itinerary",
        role: "Expert Travel Itinerary Designer",
        instructions: ITINERARY_INSTRUCTIONS,
        tools: &[],
        template: ITINERARY_TEMPLATE,
        parse_json: true,
        fallback_reply: Some(ITINERARY_FALLBACK),
    },
];

/// Look up an agent by name
pub fn find(name: &str) -> Option<&'static AgentSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_six_agents_in_pipeline_order() {
        let names: Vec<&str> = CATALOG.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["research", "weather", "transport", "hotels", "budget", "itinerary"]
        );
    }

    #[test]
    fn test_find() {
        assert!(find("weather").is_some());
        assert!(find("pilot").is_none());
    }

    #[test]
    fn test_only_itinerary_has_a_fallback() {
        for spec in CATALOG {
            if spec.name == "itinerary" {
                assert!(spec.fallback_reply.is_some());
            } else {
                assert!(spec.fallback_reply.is_none());
            }
        }
    }

    #[test]
    fn test_itinerary_takes_no_tools() {
        let spec = find("itinerary").unwrap();
        assert!(spec.tools.is_empty());
    }
}
