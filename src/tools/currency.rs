//! Currency conversion via exchangerate.host (requires an access key).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{required_str, TravelTool};
use crate::errors::{Result, WayfarerError};

const CONVERT_URL: &str = "https://api.exchangerate.host/convert";

/// Convert amounts between currencies.
pub struct CurrencyTool {
    client: Client,
    api_key: String,
}

impl CurrencyTool {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            WayfarerError::Configuration("CURRENCY_API_KEY not set".to_string())
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Convert an amount from one currency to another
    pub async fn convert(&self, amount: f64, from_currency: &str, to_currency: &str) -> String {
        let from = from_currency.to_uppercase();
        let to = to_currency.to_uppercase();

        let response = match self
            .client
            .get(CONVERT_URL)
            .query(&[
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("amount", &amount.to_string()),
                ("access_key", self.api_key.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return format!("Request failed: {e}"),
        };

        if !response.status().is_success() {
            return format!("Currency API error: {}", response.status());
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return format!("Invalid JSON from currency API: {e}"),
        };

        if !data.get("success").and_then(Value::as_bool).unwrap_or(false) {
            return format!("Currency API error: {data}");
        }

        let converted = data.get("result").and_then(Value::as_f64).unwrap_or(0.0);
        let rate = data
            .get("info")
            .and_then(|i| i.get("quote"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        format!(
            "{amount:.2} {from} = {converted:.2} {to} (rate {rate:.4})"
        )
    }
}

#[async_trait]
impl TravelTool for CurrencyTool {
    fn name(&self) -> &'static str {
        "currency_convert"
    }

    fn description(&self) -> &'static str {
        "Convert an amount between two currencies using current exchange rates."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {
                    "type": "number",
                    "description": "Amount to convert"
                },
                "from_currency": {
                    "type": "string",
                    "description": "ISO currency code to convert from, e.g. 'USD'"
                },
                "to_currency": {
                    "type": "string",
                    "description": "ISO currency code to convert to, e.g. 'INR'"
                }
            },
            "required": ["amount", "from_currency", "to_currency"]
        })
    }

    async fn call(&self, args: &Value) -> String {
        let Some(amount) = args.get("amount").and_then(Value::as_f64) else {
            return "Error: missing required argument 'amount'".to_string();
        };
        let from = match required_str(args, "from_currency") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let to = match required_str(args, "to_currency") {
            Ok(v) => v,
            Err(e) => return e,
        };

        self.convert(amount, from, to).await
    }
}
