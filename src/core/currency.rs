//! Currency and exchange rate abstractions

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Currencies offered before (or instead of) the full remote list.
pub const COMMON_CURRENCIES: [(&str, &str); 20] = [
    ("AUD", "Australian Dollar"),
    ("BRL", "Brazilian Real"),
    ("CAD", "Canadian Dollar"),
    ("CHF", "Swiss Franc"),
    ("CNY", "Chinese Renminbi Yuan"),
    ("DKK", "Danish Krone"),
    ("EUR", "Euro"),
    ("GBP", "British Pound"),
    ("HKD", "Hong Kong Dollar"),
    ("INR", "Indian Rupee"),
    ("JPY", "Japanese Yen"),
    ("KRW", "South Korean Won"),
    ("MXN", "Mexican Peso"),
    ("NOK", "Norwegian Krone"),
    ("NZD", "New Zealand Dollar"),
    ("SEK", "Swedish Krona"),
    ("SGD", "Singapore Dollar"),
    ("TRY", "Turkish Lira"),
    ("USD", "United States Dollar"),
    ("ZAR", "South African Rand"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyOption {
    pub code: String,
    pub name: String,
}

impl CurrencyOption {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: normalize_code(code),
            name: name.to_string(),
        }
    }
}

/// Returns the preload list, sorted by code.
pub fn common_currencies() -> Vec<CurrencyOption> {
    COMMON_CURRENCIES
        .iter()
        .map(|(code, name)| CurrencyOption::new(code, name))
        .collect()
}

/// Converts a provider listing into options sorted by code.
pub fn options_from_listing(listing: BTreeMap<String, String>) -> Vec<CurrencyOption> {
    let mut options: Vec<CurrencyOption> = listing
        .iter()
        .map(|(code, name)| CurrencyOption::new(code, name))
        .collect();
    options.sort_by(|a, b| a.code.cmp(&b.code));
    options.dedup_by(|a, b| a.code == b.code);
    options
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// True for three-letter ISO 4217 style codes such as `EUR`.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Rate for one unit of the source currency, as published by a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub effective_date: NaiveDate,
}

/// A resolved rate held by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
    pub effective_date: NaiveDate,
}

impl RateSnapshot {
    pub fn from_quote(quote: RateQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            rate: quote.rate,
            fetched_at,
            effective_date: quote.effective_date,
        }
    }

    /// Identity rate used when both sides of the pair are the same currency.
    pub fn identity(now: DateTime<Utc>) -> Self {
        Self {
            rate: 1.0,
            fetched_at: now,
            effective_date: now.date_naive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("No rate available for {from} to {to}")]
    UnsupportedPair { from: String, to: String },

    #[error("Network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Lists the supported currencies as code to display name.
    async fn list_currencies(&self) -> Result<BTreeMap<String, String>, RateError>;

    /// Fetches the rate for one unit of `from` expressed in `to`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, RateError>;
}
