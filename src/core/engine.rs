//! Conversion state machine.
//!
//! The engine owns every piece of converter state: the raw amount text, the
//! selected pair, the last resolved rate, history, theme and the currency list.
//! Persistence goes through [`PreferenceStore`], which only mirrors this state.
//!
//! A conversion is split into [`ConversionEngine::begin_conversion`] and
//! [`ConversionEngine::complete_conversion`] so callers may run several rate
//! requests at once. Each request carries a sequence number and only the most
//! recently issued one is applied.

use crate::core::currency::{
    CurrencyOption, RateError, RateProvider, RateQuote, RateSnapshot, common_currencies,
    is_currency_code, normalize_code, options_from_listing,
};
use crate::core::history::{History, HistoryEntry};
use crate::core::preferences::{CurrencyPair, PreferenceStore, Theme};
use chrono::Utc;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Who asked for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit convert action. Reports invalid input and records history.
    User,
    /// Re-conversion after an input changed. Silent on invalid input.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Please enter a valid amount greater than 0")]
    InvalidAmount,

    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedPair { from: String, to: String },

    #[error("Unable to fetch the exchange rate. Please try again.")]
    Network(String),

    #[error("Could not load the full currency list. Showing common currencies.")]
    CurrencyListUnavailable,

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// A rate lookup the caller must perform and hand back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRequest {
    pub seq: u64,
    pub trigger: Trigger,
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionStep {
    /// Finished without a network call.
    Resolved,
    /// Needs a quote from the rate provider.
    Fetch(RateRequest),
}

/// Outcome of observing the inputs that drive automatic conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FetchRate,
    NoOp,
}

#[derive(Debug, Clone, PartialEq)]
struct ObservedInputs {
    pair: CurrencyPair,
    has_currencies: bool,
}

/// Parses user-entered amount text.
///
/// Thousands separators (`,`, `_` and spaces) are ignored. Anything that does not
/// parse to a finite, positive number yields 0.
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

pub struct ConversionEngine {
    prefs: PreferenceStore,
    amount_input: String,
    pair: CurrencyPair,
    rate: Option<RateSnapshot>,
    history: History,
    error: Option<ConversionError>,
    notice: Option<ConversionError>,
    in_flight: bool,
    theme: Theme,
    currencies: Vec<CurrencyOption>,
    latest_seq: u64,
    observed: Option<ObservedInputs>,
}

impl ConversionEngine {
    /// Restores state from `prefs`, falling back to `defaults` for the pair.
    ///
    /// The currency list starts with the common currencies so conversion can begin
    /// before the full list arrives.
    pub fn new(prefs: PreferenceStore, defaults: CurrencyPair) -> Self {
        let pair = prefs.load_pair(defaults);
        let history = prefs.load_history();
        let theme = prefs.load_theme();
        debug!(?pair, history = history.len(), %theme, "Restored preferences");

        Self {
            prefs,
            amount_input: "1".to_string(),
            pair,
            rate: None,
            history,
            error: None,
            notice: None,
            in_flight: false,
            theme,
            currencies: common_currencies(),
            latest_seq: 0,
            observed: None,
        }
    }

    /// Replaces the initial currency list.
    pub fn with_currencies(mut self, currencies: Vec<CurrencyOption>) -> Self {
        self.currencies = currencies;
        self
    }

    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    pub fn numeric_amount(&self) -> f64 {
        parse_amount(&self.amount_input)
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn from(&self) -> &str {
        &self.pair.from
    }

    pub fn to(&self) -> &str {
        &self.pair.to
    }

    pub fn rate(&self) -> Option<&RateSnapshot> {
        self.rate.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    /// Degraded-mode notice about the currency list.
    pub fn notice(&self) -> Option<&ConversionError> {
        self.notice.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn currencies(&self) -> &[CurrencyOption] {
        &self.currencies
    }

    pub fn currency_name(&self, code: &str) -> Option<&str> {
        let code = normalize_code(code);
        self.currencies
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    pub fn is_known_currency(&self, code: &str) -> bool {
        self.currency_name(code).is_some()
    }

    /// `amount * rate` when a rate is known and the product is finite.
    pub fn converted_amount(&self) -> Option<f64> {
        let rate = self.rate.as_ref()?.rate;
        let value = self.numeric_amount() * rate;
        value.is_finite().then_some(value)
    }

    /// Stores the raw text. Parsing happens on demand.
    pub fn set_amount(&mut self, text: &str) {
        self.amount_input = text.to_string();
    }

    /// Changes the source currency. Rejected codes leave the pair untouched.
    pub fn set_from(&mut self, code: &str) -> Result<(), ConversionError> {
        self.pair.from = self.selectable_code(code)?;
        self.prefs.save_pair(&self.pair);
        Ok(())
    }

    /// Changes the target currency. Rejected codes leave the pair untouched.
    pub fn set_to(&mut self, code: &str) -> Result<(), ConversionError> {
        self.pair.to = self.selectable_code(code)?;
        self.prefs.save_pair(&self.pair);
        Ok(())
    }

    /// Codes must be three letters and, once a list is loaded, one of its entries.
    fn selectable_code(&self, code: &str) -> Result<String, ConversionError> {
        let code = normalize_code(code);
        let listed = self.currencies.is_empty() || self.is_known_currency(&code);
        if is_currency_code(&code) && listed {
            Ok(code)
        } else {
            debug!(%code, "Rejecting currency code");
            Err(ConversionError::UnknownCurrency(code))
        }
    }

    /// Exchanges both sides of the pair in a single update.
    pub fn swap(&mut self) {
        self.pair = self.pair.swapped();
        self.prefs.save_pair(&self.pair);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.prefs.save_theme(theme);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    /// Applies the outcome of a currency list fetch.
    ///
    /// A failed or empty fetch never clears an existing list.
    pub fn apply_currency_list(&mut self, result: Result<BTreeMap<String, String>, RateError>) {
        match result {
            Ok(listing) if !listing.is_empty() => {
                self.currencies = options_from_listing(listing);
                self.notice = None;
                info!(count = self.currencies.len(), "Loaded currency list");
            }
            Ok(_) => {
                warn!("Currency list was empty, keeping current list");
                self.degrade_currency_list();
            }
            Err(e) => {
                warn!("Failed to load currency list: {e}");
                self.degrade_currency_list();
            }
        }
    }

    fn degrade_currency_list(&mut self) {
        if self.currencies.is_empty() {
            self.currencies = common_currencies();
        }
        self.notice = Some(ConversionError::CurrencyListUnavailable);
    }

    /// Decides whether the current inputs call for an automatic conversion.
    ///
    /// Fires on the first observation, when either currency changed, or when the
    /// currency list became non-empty. Never fires while the list is empty.
    pub fn on_inputs_changed(&mut self) -> Effect {
        let current = ObservedInputs {
            pair: self.pair.clone(),
            has_currencies: !self.currencies.is_empty(),
        };
        let changed = match &self.observed {
            None => true,
            Some(prev) => {
                prev.pair != current.pair || (!prev.has_currencies && current.has_currencies)
            }
        };
        let has_currencies = current.has_currencies;
        self.observed = Some(current);

        if changed && has_currencies {
            Effect::FetchRate
        } else {
            Effect::NoOp
        }
    }

    /// Starts a conversion.
    ///
    /// Invalid amounts and same-currency pairs resolve immediately. Anything else
    /// yields a [`RateRequest`] that must be passed back to
    /// [`complete_conversion`](Self::complete_conversion).
    pub fn begin_conversion(&mut self, trigger: Trigger) -> ConversionStep {
        self.latest_seq += 1;
        let amount = self.numeric_amount();

        if amount <= 0.0 {
            debug!(input = %self.amount_input, ?trigger, "Amount is not convertible");
            self.rate = None;
            self.in_flight = false;
            self.error = match trigger {
                Trigger::User => Some(ConversionError::InvalidAmount),
                Trigger::Auto => None,
            };
            return ConversionStep::Resolved;
        }

        if self.pair.from == self.pair.to {
            let snapshot = RateSnapshot::identity(Utc::now());
            self.in_flight = false;
            self.error = None;
            self.rate = Some(snapshot);
            if trigger == Trigger::User {
                let (from, to) = (self.pair.from.clone(), self.pair.to.clone());
                self.record(amount, &from, &to, snapshot);
            }
            return ConversionStep::Resolved;
        }

        self.in_flight = true;
        self.error = None;
        ConversionStep::Fetch(RateRequest {
            seq: self.latest_seq,
            trigger,
            amount,
            from: self.pair.from.clone(),
            to: self.pair.to.clone(),
        })
    }

    /// Applies a provider response. Returns false if the request was superseded.
    ///
    /// Only the most recently issued request is applied, whatever its trigger. A
    /// user conversion overtaken by a later automatic one is dropped without a
    /// history entry; callers decide whether to tell the user.
    pub fn complete_conversion(
        &mut self,
        request: &RateRequest,
        result: Result<RateQuote, RateError>,
    ) -> bool {
        if request.seq != self.latest_seq {
            debug!(
                seq = request.seq,
                latest = self.latest_seq,
                "Discarding stale rate response for {}/{}",
                request.from,
                request.to
            );
            return false;
        }

        self.in_flight = false;
        match result {
            Ok(quote) => {
                let snapshot = RateSnapshot::from_quote(quote, Utc::now());
                self.rate = Some(snapshot);
                self.error = None;
                if request.trigger == Trigger::User {
                    self.record(request.amount, &request.from, &request.to, snapshot);
                }
            }
            Err(RateError::UnsupportedPair { .. }) => {
                self.rate = None;
                self.error = Some(ConversionError::UnsupportedPair {
                    from: request.from.clone(),
                    to: request.to.clone(),
                });
            }
            Err(RateError::Network(detail)) => {
                warn!("Rate request for {}/{} failed: {detail}", request.from, request.to);
                self.rate = None;
                self.error = Some(ConversionError::Network(detail));
            }
        }
        true
    }

    /// Runs a full conversion against `provider` and returns the converted amount.
    pub async fn convert(
        &mut self,
        provider: &(dyn RateProvider + Send + Sync),
        trigger: Trigger,
    ) -> Option<f64> {
        if let ConversionStep::Fetch(request) = self.begin_conversion(trigger) {
            let result = provider.get_rate(&request.from, &request.to).await;
            self.complete_conversion(&request, result);
        }
        self.converted_amount()
    }

    fn record(&mut self, amount: f64, from: &str, to: &str, snapshot: RateSnapshot) {
        let entry = HistoryEntry::new(amount, from, to, snapshot.rate, snapshot.fetched_at);
        debug!(id = %entry.id, "Recording conversion");
        self.history.record(entry);
        self.prefs.save_history(&self.history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::HISTORY_LIMIT;
    use crate::core::preferences::{HISTORY_KEY, PREFERENCES_KEY};
    use crate::store::KeyValueCollection;
    use crate::store::memory::MemoryCollection;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRateProvider {
        rates: BTreeMap<(String, String), f64>,
        fail_network: bool,
        call_count: AtomicUsize,
    }

    impl MockRateProvider {
        fn new() -> Self {
            let mut rates = BTreeMap::new();
            rates.insert(("USD".to_string(), "EUR".to_string()), 0.92);
            rates.insert(("EUR".to_string(), "USD".to_string()), 1.087);
            rates.insert(("GBP".to_string(), "JPY".to_string()), 190.5);
            Self {
                rates,
                fail_network: false,
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail_network: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        async fn list_currencies(&self) -> Result<BTreeMap<String, String>, RateError> {
            Err(RateError::Network("offline".to_string()))
        }

        async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, RateError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_network {
                return Err(RateError::Network("connection refused".to_string()));
            }
            self.rates
                .get(&(from.to_string(), to.to_string()))
                .map(|rate| RateQuote {
                    rate: *rate,
                    effective_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
                })
                .ok_or_else(|| RateError::UnsupportedPair {
                    from: from.to_string(),
                    to: to.to_string(),
                })
        }
    }

    fn engine() -> (Arc<MemoryCollection>, ConversionEngine) {
        let collection = Arc::new(MemoryCollection::new());
        let prefs = PreferenceStore::new(collection.clone());
        (collection, ConversionEngine::new(prefs, CurrencyPair::default()))
    }

    fn quote(rate: f64) -> Result<RateQuote, RateError> {
        Ok(RateQuote {
            rate,
            effective_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        })
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), 100.0);
        assert_eq!(parse_amount("1,234.5"), 1234.5);
        assert_eq!(parse_amount(" 1 000 "), 1000.0);
        assert_eq!(parse_amount("12."), 12.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("-5"), 0.0);
        assert_eq!(parse_amount("0"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("1e400"), 0.0);
    }

    #[test]
    fn test_set_amount_keeps_raw_text() {
        let (_, mut engine) = engine();
        engine.set_amount("1,2");
        assert_eq!(engine.amount_input(), "1,2");
        assert_eq!(engine.numeric_amount(), 12.0);
        assert!(engine.error().is_none());
    }

    #[tokio::test]
    async fn test_scenario_usd_to_eur() {
        let (collection, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.set_amount("100");

        let converted = engine.convert(&provider, Trigger::User).await.unwrap();
        assert!((converted - 92.0).abs() < 0.001);
        assert_eq!(format!("{converted:.2}"), "92.00");

        let rate = engine.rate().unwrap();
        assert_eq!(rate.rate, 0.92);
        assert_eq!(rate.effective_date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert!(!engine.in_flight());
        assert!(engine.error().is_none());

        let entries = engine.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, 100.0);
        assert_eq!(entries[0].from, "USD");
        assert_eq!(entries[0].to, "EUR");
        assert_eq!(entries[0].rate, 0.92);
        assert!((entries[0].result - 92.0).abs() < 0.001);

        // History is mirrored to the store.
        assert!(collection.get(HISTORY_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_same_currency_short_circuits() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.set_from("JPY").unwrap();
        engine.set_to("jpy").unwrap();
        engine.set_amount("2,500");

        let converted = engine.convert(&provider, Trigger::User).await;
        assert_eq!(converted, Some(2500.0));
        assert_eq!(engine.rate().unwrap().rate, 1.0);
        assert_eq!(
            engine.rate().unwrap().effective_date,
            Utc::now().date_naive()
        );
        assert_eq!(provider.calls(), 0);
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_silent_for_auto_trigger() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.set_amount("100");
        engine.convert(&provider, Trigger::Auto).await;
        assert!(engine.rate().is_some());

        engine.set_amount("abc");
        assert_eq!(engine.numeric_amount(), 0.0);
        assert_eq!(engine.convert(&provider, Trigger::Auto).await, None);
        assert!(engine.rate().is_none());
        assert!(engine.error().is_none());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_reported_for_user_trigger() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.set_amount("-3");

        assert_eq!(engine.convert(&provider, Trigger::User).await, None);
        assert!(engine.rate().is_none());
        assert_eq!(engine.error(), Some(&ConversionError::InvalidAmount));
        assert!(engine.history().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_pair_clears_rate() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.set_amount("10");
        engine.convert(&provider, Trigger::User).await;
        assert!(engine.rate().is_some());

        let mut listing = BTreeMap::new();
        listing.insert("USD".to_string(), "United States Dollar".to_string());
        listing.insert("XYZ".to_string(), "Test Currency".to_string());
        engine.apply_currency_list(Ok(listing));
        engine.set_to("XYZ").unwrap();
        assert_eq!(engine.convert(&provider, Trigger::User).await, None);
        assert!(engine.rate().is_none());

        let error = engine.error().unwrap();
        assert_eq!(
            error,
            &ConversionError::UnsupportedPair {
                from: "USD".to_string(),
                to: "XYZ".to_string()
            }
        );
        let message = error.to_string();
        assert!(message.contains("USD") && message.contains("XYZ"));
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_retry_message() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::failing();

        assert_eq!(engine.convert(&provider, Trigger::User).await, None);
        assert!(!engine.in_flight());
        assert!(engine.rate().is_none());
        assert!(matches!(engine.error(), Some(ConversionError::Network(_))));
        assert!(engine.error().unwrap().to_string().contains("try again"));
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_auto_conversion_does_not_record_history() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        engine.convert(&provider, Trigger::Auto).await;
        assert!(engine.rate().is_some());
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_keeps_five_most_recent() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();
        for i in 1..=7 {
            engine.set_amount(&i.to_string());
            engine.convert(&provider, Trigger::User).await;
        }

        let amounts: Vec<f64> = engine.history().entries().iter().map(|e| e.amount).collect();
        assert_eq!(amounts.len(), HISTORY_LIMIT);
        assert_eq!(amounts, vec![7.0, 6.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_in_flight_spans_the_request() {
        let (_, mut engine) = engine();
        let request = match engine.begin_conversion(Trigger::User) {
            ConversionStep::Fetch(request) => request,
            ConversionStep::Resolved => panic!("Expected a fetch"),
        };
        assert!(engine.in_flight());

        assert!(engine.complete_conversion(&request, Err(RateError::Network("boom".into()))));
        assert!(!engine.in_flight());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let (_, mut engine) = engine();
        let ConversionStep::Fetch(first) = engine.begin_conversion(Trigger::Auto) else {
            panic!("Expected a fetch");
        };

        engine.set_to("GBP").unwrap();
        let ConversionStep::Fetch(second) = engine.begin_conversion(Trigger::Auto) else {
            panic!("Expected a fetch");
        };
        assert!(second.seq > first.seq);

        // Latest response lands first, then the superseded one.
        assert!(engine.complete_conversion(&second, quote(0.79)));
        assert!(!engine.complete_conversion(&first, quote(0.92)));

        assert_eq!(engine.rate().unwrap().rate, 0.79);
        assert!(!engine.in_flight());
    }

    #[test]
    fn test_stale_response_does_not_clear_in_flight() {
        let (_, mut engine) = engine();
        let ConversionStep::Fetch(first) = engine.begin_conversion(Trigger::Auto) else {
            panic!("Expected a fetch");
        };
        let ConversionStep::Fetch(_second) = engine.begin_conversion(Trigger::Auto) else {
            panic!("Expected a fetch");
        };

        assert!(!engine.complete_conversion(&first, quote(0.92)));
        assert!(engine.in_flight());
        assert!(engine.rate().is_none());
    }

    #[test]
    fn test_converted_amount_is_reactive_only() {
        let (_, mut engine) = engine();
        assert_eq!(engine.converted_amount(), None);

        let ConversionStep::Fetch(request) = engine.begin_conversion(Trigger::Auto) else {
            panic!("Expected a fetch");
        };
        engine.complete_conversion(&request, quote(2.0));
        assert_eq!(engine.converted_amount(), Some(2.0));

        // Changing the amount re-derives without a new request.
        engine.set_amount("21");
        assert_eq!(engine.converted_amount(), Some(42.0));

        engine.complete_conversion(&request, quote(f64::MAX));
        engine.set_amount("10");
        assert_eq!(engine.converted_amount(), None);
    }

    #[test]
    fn test_swap_is_its_own_inverse() {
        let (collection, mut engine) = engine();
        let original = engine.pair().clone();

        engine.swap();
        assert_eq!(engine.from(), original.to);
        assert_eq!(engine.to(), original.from);

        engine.swap();
        assert_eq!(engine.pair(), &original);

        let stored: CurrencyPair =
            serde_json::from_slice(&collection.get(PREFERENCES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, original);
    }

    #[test]
    fn test_state_restored_from_store() {
        let collection = Arc::new(MemoryCollection::new());
        let prefs = PreferenceStore::new(collection.clone());
        {
            let mut engine = ConversionEngine::new(prefs.clone(), CurrencyPair::default());
            engine.set_from("gbp").unwrap();
            engine.set_to("jpy").unwrap();
            engine.set_theme(Theme::Dark);
        }

        let engine = ConversionEngine::new(prefs, CurrencyPair::default());
        assert_eq!(engine.pair(), &CurrencyPair::new("GBP", "JPY"));
        assert_eq!(engine.theme(), Theme::Dark);
    }

    #[test]
    fn test_toggle_theme() {
        let (_, mut engine) = engine();
        engine.set_theme(Theme::Light);
        assert_eq!(engine.toggle_theme(), Theme::Dark);
        assert_eq!(engine.toggle_theme(), Theme::Light);
    }

    #[test]
    fn test_inputs_changed_rule() {
        let (_, mut engine) = engine();

        // Initial observation converts with the preloaded list.
        assert_eq!(engine.on_inputs_changed(), Effect::FetchRate);
        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);

        // Amount edits alone do not trigger.
        engine.set_amount("55");
        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);

        engine.set_to("GBP").unwrap();
        assert_eq!(engine.on_inputs_changed(), Effect::FetchRate);

        engine.swap();
        assert_eq!(engine.on_inputs_changed(), Effect::FetchRate);

        // Setting the same code again is not a change.
        let from = engine.from().to_string();
        engine.set_from(&from).unwrap();
        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);
    }

    #[test]
    fn test_inputs_changed_waits_for_currencies() {
        let (_, engine) = engine();
        let mut engine = engine.with_currencies(Vec::new());

        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);
        engine.set_to("GBP").unwrap();
        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);

        let mut listing = BTreeMap::new();
        listing.insert("GBP".to_string(), "British Pound".to_string());
        listing.insert("USD".to_string(), "United States Dollar".to_string());
        engine.apply_currency_list(Ok(listing));
        assert_eq!(engine.on_inputs_changed(), Effect::FetchRate);
        assert_eq!(engine.on_inputs_changed(), Effect::NoOp);
    }

    #[tokio::test]
    async fn test_failed_currency_list_keeps_common_currencies() {
        let (_, mut engine) = engine();
        let provider = MockRateProvider::new();

        engine.apply_currency_list(provider.list_currencies().await);
        assert_eq!(engine.currencies().len(), 20);
        assert_eq!(
            engine.notice(),
            Some(&ConversionError::CurrencyListUnavailable)
        );

        engine.set_amount("100");
        let converted = engine.convert(&provider, Trigger::User).await.unwrap();
        assert!((converted - 92.0).abs() < 0.001);
    }

    #[test]
    fn test_failed_refresh_keeps_existing_list() {
        let (_, mut engine) = engine();
        let mut listing = BTreeMap::new();
        listing.insert("ISK".to_string(), "Icelandic Króna".to_string());
        engine.apply_currency_list(Ok(listing));
        assert_eq!(engine.currencies().len(), 1);
        assert!(engine.notice().is_none());

        engine.apply_currency_list(Err(RateError::Network("timeout".into())));
        assert_eq!(engine.currencies().len(), 1);
        assert_eq!(engine.currency_name("isk"), Some("Icelandic Króna"));
        assert!(engine.notice().is_some());
    }

    #[test]
    fn test_empty_listing_falls_back_when_nothing_loaded() {
        let (_, engine) = engine();
        let mut engine = engine.with_currencies(Vec::new());
        engine.apply_currency_list(Ok(BTreeMap::new()));
        assert_eq!(engine.currencies().len(), 20);
        assert!(engine.is_known_currency("usd"));
    }

    #[test]
    fn test_rejected_codes_leave_pair_and_store_untouched() {
        let (collection, mut engine) = engine();
        engine.set_to("gbp").unwrap();
        let stored = collection.get(PREFERENCES_KEY).unwrap();

        for code in ["eur&from=gbp", "EURO", "E1R", "", "XYZ"] {
            assert_eq!(
                engine.set_to(code),
                Err(ConversionError::UnknownCurrency(normalize_code(code)))
            );
            assert!(engine.set_from(code).is_err());
        }

        assert_eq!(engine.pair(), &CurrencyPair::new("USD", "GBP"));
        assert_eq!(collection.get(PREFERENCES_KEY).unwrap(), stored);
    }
}
