//! Trip Context
//!
//! Structured trip parameters accumulated across a conversation, plus the
//! lightweight regex extractor that pulls them out of free text. Fields
//! merge by presence: a later turn only overwrites a field when it yields
//! a new non-empty value, and nothing ever clears one mid-session.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // "from X to Y"; Y stops before a date introducer, punctuation or a digit
    static ref ROUTE: Regex = Regex::new(
        r"from\s+([a-z][a-z \-]*?)\s+to\s+([a-z][a-z \-]*?)(?:\s+(?:on|in)\b|[,.;!?]|\s+\d|$)"
    )
    .unwrap();
    // "D/M/YYYY to D/M/YYYY" with / or - separators
    static ref DATES: Regex = Regex::new(
        r"(\d{1,2}[/-]\d{1,2}[/-]\d{4})\s*(?:to|-)\s*(\d{1,2}[/-]\d{1,2}[/-]\d{4})"
    )
    .unwrap();
    static ref BUDGET: Regex = Regex::new(r"budget.*?(\d{3,})").unwrap();
    static ref TRAVELERS: Regex =
        Regex::new(r"(?:we are|travelling|traveling)\s*(\d+)\s*person").unwrap();
    // Mode keywords in priority order; plane normalizes to flight
    static ref MODES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\bcars?\b").unwrap(), "car"),
        (Regex::new(r"\bflights?\b").unwrap(), "flight"),
        (Regex::new(r"\bplanes?\b").unwrap(), "flight"),
        (Regex::new(r"\btrains?\b").unwrap(), "train"),
    ];
}

/// Trip parameters extracted from the conversation so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// ISO YYYY-MM-DD
    pub start_date: Option<String>,
    /// ISO YYYY-MM-DD
    pub end_date: Option<String>,
    pub travel_mode_preference: Option<String>,
    pub budget_total: Option<u64>,
    pub travelers: Option<u32>,
}

impl TripContext {
    /// Best-effort extraction from a raw utterance. Fields the text does
    /// not mention stay unset; malformed values are dropped silently.
    pub fn extract(utterance: &str) -> Self {
        let text = utterance.to_lowercase();
        let mut ctx = Self::default();

        if let Some(caps) = ROUTE.captures(&text) {
            ctx.origin = Some(title_case(&caps[1]));
            ctx.destination = Some(title_case(&caps[2]));
        }

        if let Some(caps) = DATES.captures(&text) {
            // Both dates or neither: a half-parsed pair is worse than none
            match (normalize_date(&caps[1]), normalize_date(&caps[2])) {
                (Some(start), Some(end)) => {
                    ctx.start_date = Some(start);
                    ctx.end_date = Some(end);
                }
                _ => {}
            }
        }

        for (pattern, mode) in MODES.iter() {
            if pattern.is_match(&text) {
                ctx.travel_mode_preference = Some((*mode).to_string());
                break;
            }
        }

        if let Some(caps) = BUDGET.captures(&text) {
            ctx.budget_total = caps[1].parse().ok();
        }

        if let Some(caps) = TRAVELERS.captures(&text) {
            ctx.travelers = caps[1].parse().ok();
        }

        ctx
    }

    /// Merge-by-presence: take every field the other context has set.
    pub fn merge(&mut self, newer: &TripContext) {
        if newer.origin.is_some() {
            self.origin = newer.origin.clone();
        }
        if newer.destination.is_some() {
            self.destination = newer.destination.clone();
        }
        if newer.start_date.is_some() {
            self.start_date = newer.start_date.clone();
        }
        if newer.end_date.is_some() {
            self.end_date = newer.end_date.clone();
        }
        if newer.travel_mode_preference.is_some() {
            self.travel_mode_preference = newer.travel_mode_preference.clone();
        }
        if newer.budget_total.is_some() {
            self.budget_total = newer.budget_total;
        }
        if newer.travelers.is_some() {
            self.travelers = newer.travelers;
        }
    }

    /// Inclusive trip length in days, when both dates parse
    pub fn trip_length_days(&self) -> Option<i64> {
        let start = NaiveDate::parse_from_str(self.start_date.as_deref()?, "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(self.end_date.as_deref()?, "%Y-%m-%d").ok()?;
        let days = (end - start).num_days() + 1;
        (days >= 1).then_some(days)
    }

    /// Human-readable summary for the front end
    pub fn summary(&self) -> String {
        let unset = "-".to_string();
        format!(
            "origin: {} | destination: {} | dates: {} to {} | mode: {} | budget: {} | travelers: {}",
            self.origin.clone().unwrap_or_else(|| unset.clone()),
            self.destination.clone().unwrap_or_else(|| unset.clone()),
            self.start_date.clone().unwrap_or_else(|| unset.clone()),
            self.end_date.clone().unwrap_or_else(|| unset.clone()),
            self.travel_mode_preference
                .clone()
                .unwrap_or_else(|| unset.clone()),
            self.budget_total
                .map_or_else(|| unset.clone(), |b| b.to_string()),
            self.travelers.map_or(unset, |t| t.to_string()),
        )
    }
}

/// Title-case each whitespace-separated word
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert D/M/YYYY or D-M-YYYY to ISO YYYY-MM-DD; None when the calendar
/// rejects the date
fn normalize_date(raw: &str) -> Option<String> {
    let normalized = raw.replace('/', "-");
    let mut parts = normalized.split('-');

    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}
