use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

use crate::core::currency::{RateError, RateProvider, RateQuote};

const USER_AGENT: &str = concat!("xfx/", env!("CARGO_PKG_VERSION"));

/// Rate provider for the Frankfurter API (ECB reference rates).
pub struct FrankfurterProvider {
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RateError> {
        debug!("Requesting {}", url);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RateError::Network(format!("Failed to build HTTP client: {e}")))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| RateError::Network(format!("Request error: {e} for URL: {url}")))?;

        if !response.status().is_success() {
            return Err(RateError::Network(format!(
                "HTTP error: {} for URL: {}",
                response.status(),
                url
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::Network(format!("Failed to read response from {url}: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            RateError::Network(format!("Failed to parse JSON response from {url}: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default = "unit_amount")]
    amount: f64,
    #[allow(dead_code)]
    base: Option<String>,
    date: String,
    rates: HashMap<String, f64>,
}

fn unit_amount() -> f64 {
    1.0
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterCurrencies", skip(self))]
    async fn list_currencies(&self) -> Result<BTreeMap<String, String>, RateError> {
        let url = format!("{}/currencies", self.base_url);
        let currencies: BTreeMap<String, String> = self.fetch_json(&url).await?;
        debug!(count = currencies.len(), "Received currency list");
        Ok(currencies)
    }

    #[instrument(
        name = "FrankfurterRate",
        skip(self),
        fields(from = %from, to = %to)
    )]
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, RateError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/latest", self.base_url),
            [("from", from), ("to", to)],
        )
        .map_err(|e| RateError::Network(format!("Invalid rate URL for {from}/{to}: {e}")))?;
        let data: LatestResponse = self.fetch_json(url.as_str()).await?;

        let rate = *data
            .rates
            .get(to)
            .ok_or_else(|| RateError::UnsupportedPair {
                from: from.to_string(),
                to: to.to_string(),
            })?;

        let effective_date = NaiveDate::parse_from_str(&data.date, "%Y-%m-%d").map_err(|e| {
            RateError::Network(format!(
                "Invalid rate date '{}' for {from}/{to}: {e}",
                data.date
            ))
        })?;

        // Rates are quoted for `amount` units of the base currency.
        let rate = if data.amount.is_finite() && data.amount > 0.0 {
            rate / data.amount
        } else {
            rate
        };

        debug!(rate, %effective_date, "Received rate");
        Ok(RateQuote {
            rate,
            effective_date,
        })
    }
}
