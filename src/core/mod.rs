//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod engine;
pub mod history;
pub mod log;
pub mod preferences;

// Re-export main types for cleaner imports
pub use currency::{CurrencyOption, RateError, RateProvider, RateQuote, RateSnapshot};
pub use engine::{ConversionEngine, ConversionError, ConversionStep, Effect, RateRequest, Trigger};
pub use history::{History, HistoryEntry};
pub use preferences::{CurrencyPair, PreferenceStore, Theme};
