//! Intent Classification
//!
//! Maps an utterance to one topic from a fixed set by scanning an ordered
//! table of keyword patterns. The first pattern that matches anywhere in
//! the lower-cased text wins, so the table order is the tie-break when a
//! sentence touches several topics. Canonical order: overview, weather,
//! transport, hotels, budget, itinerary, full_planning. The classifier is
//! total: anything unmatched is an overview question.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Topic of a user utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Overview,
    Weather,
    Transport,
    Hotels,
    Budget,
    Itinerary,
    FullPlanning,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Overview => "overview",
            Intent::Weather => "weather",
            Intent::Transport => "transport",
            Intent::Hotels => "hotels",
            Intent::Budget => "budget",
            Intent::Itinerary => "itinerary",
            Intent::FullPlanning => "full_planning",
        }
    }

    /// Name of the agent that answers this intent
    pub fn agent_name(&self) -> &'static str {
        match self {
            Intent::Overview => "research",
            Intent::Weather => "weather",
            Intent::Transport => "transport",
            Intent::Hotels => "hotels",
            Intent::Budget => "budget",
            Intent::Itinerary | Intent::FullPlanning => "itinerary",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref INTENT_TABLE: Vec<(Intent, Vec<Regex>)> = vec![
        (
            Intent::Overview,
            patterns(&[
                r"attraction",
                r"things to do",
                r"sightsee",
                r"places to (visit|see)",
                r"hidden gem",
                r"tell me about",
                r"what is there",
            ]),
        ),
        (
            Intent::Weather,
            patterns(&[
                r"weather",
                r"forecast",
                r"\brain",
                r"temperature",
                r"climate",
                r"\bsnow",
            ]),
        ),
        (
            Intent::Transport,
            patterns(&[
                r"transport",
                r"how (do|can) (i|we) get",
                r"\broute\b",
                r"\bdriv(e|ing)\b",
                r"\btrain\b",
                r"\bflight",
                r"\bbus\b",
                r"getting around",
                r"\bdistance\b",
            ]),
        ),
        (
            Intent::Hotels,
            patterns(&[
                r"hotel",
                r"\bstay\b",
                r"accommodation",
                r"hostel",
                r"resort",
                r"where to sleep",
                r"airbnb",
            ]),
        ),
        (
            Intent::Budget,
            patterns(&[
                r"budget",
                r"\bcost",
                r"\bcheap",
                r"expensive",
                r"\bprice",
                r"afford",
                r"\bspend",
            ]),
        ),
        (
            Intent::Itinerary,
            patterns(&[
                r"itinerary",
                r"day[ -]by[ -]day",
                r"schedule",
                r"daily plan",
            ]),
        ),
        (
            Intent::FullPlanning,
            patterns(&[
                r"plan everything",
                r"full plan",
                r"complete plan",
                r"plan (my|the|our) (whole |entire )?trip",
                r"plan it all",
                r"plan a trip",
            ]),
        ),
    ];
}

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("intent pattern must compile"))
        .collect()
}

/// Classify an utterance. Total: defaults to `Intent::Overview`.
pub fn classify(utterance: &str) -> Intent {
    let text = utterance.to_lowercase();

    for (intent, patterns) in INTENT_TABLE.iter() {
        if patterns.iter().any(|p| p.is_match(&text)) {
            return *intent;
        }
    }

    Intent::Overview
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("What's the weather like?", Intent::Weather)]
    #[case("plan everything", Intent::FullPlanning)]
    #[case("please plan my whole trip", Intent::FullPlanning)]
    #[case("any good hotels near the lake?", Intent::Hotels)]
    #[case("how do we get there from the airport", Intent::Transport)]
    #[case("what will all of this cost", Intent::Budget)]
    #[case("show me the itinerary again", Intent::Itinerary)]
    #[case("top attractions in Manali", Intent::Overview)]
    fn test_classify(#[case] text: &str, #[case] expected: Intent) {
        assert_eq!(classify(text), expected);
    }

    #[test]
    fn test_classifier_is_total() {
        assert_eq!(classify(""), Intent::Overview);
        assert_eq!(classify("xyzzy"), Intent::Overview);
        assert_eq!(classify("🌍"), Intent::Overview);
    }

    #[test]
    fn test_table_order_breaks_ties() {
        // Touches weather and transport; weather is listed first
        assert_eq!(classify("will the rain affect the drive"), Intent::Weather);
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(Intent::Overview.agent_name(), "research");
        assert_eq!(Intent::FullPlanning.agent_name(), "itinerary");
        assert_eq!(Intent::Weather.agent_name(), "weather");
    }

    #[test]
    fn test_serde_labels_are_snake_case() {
        let label = serde_json::to_string(&Intent::FullPlanning).unwrap();
        assert_eq!(label, "\"full_planning\"");
    }
}
