//! Route lookup via OpenRouteService: geocode both endpoints, then fetch
//! a directions summary. The only tool with an explicit request timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{required_str, TravelTool};
use crate::errors::{Result, WayfarerError};

const ORS_DIRECTIONS_URL: &str = "https://api.openrouteservice.org/v2/directions";
const ORS_GEOCODE_URL: &str = "https://api.openrouteservice.org/geocode/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MODE: &str = "driving-car";

/// Distance/duration summary between two named locations.
pub struct RouteTool {
    client: Client,
    api_key: String,
}

/// Route summary in display units
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
    pub mode: String,
}

impl RouteTool {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .ok_or_else(|| WayfarerError::Configuration("ORS_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WayfarerError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, api_key })
    }

    /// Resolve a location name to (lat, lon)
    async fn geocode(&self, location: &str) -> std::result::Result<(f64, f64), String> {
        let response = self
            .client
            .get(ORS_GEOCODE_URL)
            .query(&[("api_key", self.api_key.as_str()), ("text", location), ("size", "1")])
            .send()
            .await
            .map_err(|e| format!("Failed to geocode '{location}': {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "Failed to geocode '{location}': {}",
                response.status()
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to geocode '{location}': {e}"))?;

        let coordinates = data
            .get("features")
            .and_then(|f| f.get(0))
            .and_then(|f| f.get("geometry"))
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array)
            .ok_or_else(|| format!("Location '{location}' not found"))?;

        match (coordinates.first().and_then(Value::as_f64), coordinates.get(1).and_then(Value::as_f64)) {
            // GeoJSON order is lon, lat
            (Some(lon), Some(lat)) => Ok((lat, lon)),
            _ => Err(format!("Location '{location}' not found")),
        }
    }

    /// Fetch the directions summary between two coordinate pairs
    async fn route_summary(
        &self,
        start: (f64, f64),
        end: (f64, f64),
        mode: &str,
    ) -> std::result::Result<RouteSummary, String> {
        let url = format!("{ORS_DIRECTIONS_URL}/{mode}");
        let body = json!({
            "coordinates": [
                [start.1, start.0],
                [end.1, end.0],
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("ORS API error: {status} {text}"));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|_| "Invalid JSON response received from ORS API".to_string())?;

        let summary = data
            .get("routes")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("summary"))
            .ok_or_else(|| format!("No route data found: {data}"))?;

        let distance = summary.get("distance").and_then(Value::as_f64).unwrap_or(0.0);
        let duration = summary.get("duration").and_then(Value::as_f64).unwrap_or(0.0);

        Ok(RouteSummary {
            distance_km: round2(distance / 1000.0),
            duration_min: round2(duration / 60.0),
            mode: mode.to_string(),
        })
    }

    /// Full lookup by location names
    pub async fn lookup(&self, start_location: &str, end_location: &str, mode: &str) -> String {
        let start = match self.geocode(start_location).await {
            Ok(coords) => coords,
            Err(e) => return format!("Error getting route information: {e}"),
        };
        let end = match self.geocode(end_location).await {
            Ok(coords) => coords,
            Err(e) => return format!("Error getting route information: {e}"),
        };

        match self.route_summary(start, end, mode).await {
            Ok(summary) => format!(
                "Route from {start_location} to {end_location}\nMode: {}\nDistance: {} km\nDuration: {} minutes",
                summary.mode, summary.distance_km, summary.duration_min
            ),
            Err(e) => format!("Error getting route information: {e}"),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[async_trait]
impl TravelTool for RouteTool {
    fn name(&self) -> &'static str {
        "route_lookup"
    }

    fn description(&self) -> &'static str {
        "Get travel distance, duration, and route summary between two locations by name. \
         Supports driving, cycling, walking, and other modes. Just provide location names."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_location": {
                    "type": "string",
                    "description": "Starting location (city, address, or landmark)"
                },
                "end_location": {
                    "type": "string",
                    "description": "Destination location (city, address, or landmark)"
                },
                "mode": {
                    "type": "string",
                    "description": "Transport mode: driving-car, cycling-regular, foot-walking, etc."
                }
            },
            "required": ["start_location", "end_location"]
        })
    }

    async fn call(&self, args: &Value) -> String {
        let start = match required_str(args, "start_location") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let end = match required_str(args, "end_location") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let mode = args
            .get("mode")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODE);

        self.lookup(start, end, mode).await
    }
}
