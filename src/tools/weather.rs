//! Daily weather forecast from the OpenWeather 5-day / 3-hour API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::{json, Value};

use super::{required_str, TravelTool};
use crate::errors::{Result, WayfarerError};

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const MAX_FORECAST_DAYS: usize = 5; // free API limit

/// Per-day aggregate of the 3-hour forecast entries
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather: String,
}

/// Daily forecast for a destination city.
pub struct WeatherForecastTool {
    client: Client,
    api_key: String,
}

impl WeatherForecastTool {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            WayfarerError::Configuration("OPEN_WEATHER_API_KEY not set".to_string())
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Fetch the forecast for a city, aggregated per day
    pub async fn forecast(
        &self,
        city: &str,
        days: usize,
    ) -> std::result::Result<Vec<DailyForecast>, String> {
        let days = days.clamp(1, MAX_FORECAST_DAYS);

        let response = self
            .client
            .get(OPENWEATHER_URL)
            .query(&[("q", city), ("appid", &self.api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| format!("Request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(format!("OpenWeather API error: {status} - {text}"));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid JSON from OpenWeather: {e}"))?;

        let entries = data
            .get("list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(aggregate_daily(&entries, days))
    }

    fn format(forecasts: &[DailyForecast]) -> String {
        if forecasts.is_empty() {
            return "No forecast data available.".to_string();
        }

        forecasts
            .iter()
            .map(|f| {
                format!(
                    "{}: {:.1}C to {:.1}C, {}",
                    f.date, f.temp_min, f.temp_max, f.weather
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Group 3-hour entries by calendar date and summarize each day.
fn aggregate_daily(entries: &[Value], days: usize) -> Vec<DailyForecast> {
    let mut by_date: BTreeMap<String, Vec<&Value>> = BTreeMap::new();

    for entry in entries {
        let Some(ts) = entry.get("dt").and_then(Value::as_i64) else {
            continue;
        };
        let Some(datetime) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        let date = datetime.format("%Y-%m-%d").to_string();

        if by_date.len() >= days && !by_date.contains_key(&date) {
            continue;
        }
        by_date.entry(date).or_default().push(entry);
    }

    by_date
        .into_iter()
        .map(|(date, entries)| {
            let temps: Vec<f64> = entries
                .iter()
                .filter_map(|e| e.get("main").and_then(|m| m.get("temp")).and_then(Value::as_f64))
                .collect();

            let mut description_counts: BTreeMap<&str, usize> = BTreeMap::new();
            for entry in &entries {
                if let Some(description) = entry
                    .get("weather")
                    .and_then(|w| w.get(0))
                    .and_then(|w| w.get("description"))
                    .and_then(Value::as_str)
                {
                    *description_counts.entry(description).or_default() += 1;
                }
            }

            // Dominant description for the day
            let weather = description_counts
                .into_iter()
                .max_by_key(|(_, count)| *count)
                .map(|(description, _)| description.to_string())
                .unwrap_or_else(|| "unknown".to_string());

            DailyForecast {
                date,
                temp_min: temps.iter().copied().fold(f64::INFINITY, f64::min),
                temp_max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                weather,
            }
        })
        .filter(|f| f.temp_min.is_finite() && f.temp_max.is_finite())
        .collect()
}

#[async_trait]
impl TravelTool for WeatherForecastTool {
    fn name(&self) -> &'static str {
        "weather_forecast"
    }

    fn description(&self) -> &'static str {
        "Fetch the daily weather forecast for a city (up to 5 days): min/max \
         temperature and the dominant conditions per day."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, e.g. 'Paris,FR'"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of forecast days (max 5)"
                }
            },
            "required": ["city"]
        })
    }

    async fn call(&self, args: &Value) -> String {
        let city = match required_str(args, "city") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let days = args
            .get("days")
            .and_then(Value::as_u64)
            .map_or(MAX_FORECAST_DAYS, |d| d as usize);

        match self.forecast(city, days).await {
            Ok(forecasts) => Self::format(&forecasts),
            Err(e) => e,
        }
    }
}
