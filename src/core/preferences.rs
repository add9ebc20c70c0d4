//! Persisted user preferences on top of a key-value collection

use crate::core::currency::{is_currency_code, normalize_code};
use crate::core::history::{History, HistoryEntry};
use crate::store::KeyValueCollection;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

pub const PREFERENCES_KEY: &str = "preferences";
pub const THEME_KEY: &str = "theme";
pub const HISTORY_KEY: &str = "history";

pub const DEFAULT_FROM: &str = "USD";
pub const DEFAULT_TO: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: normalize_code(from),
            to: normalize_code(to),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        is_currency_code(&self.from) && is_currency_code(&self.to)
    }

    pub fn swapped(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::new(DEFAULT_FROM, DEFAULT_TO)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Reads the terminal background hint from a `COLORFGBG` value such as `15;0`.
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        match background {
            0..=6 | 8 => Some(Theme::Dark),
            7 | 9..=15 => Some(Theme::Light),
            _ => None,
        }
    }

    /// Theme preferred by the terminal, if it advertises one.
    pub fn system() -> Option<Self> {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| Self::from_colorfgbg(&v))
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Theme::Light => "light",
                Theme::Dark => "dark",
            }
        )
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow!("Invalid theme: {}", s)),
        }
    }
}

/// Typed, best-effort access to persisted preferences.
///
/// Reads never fail: missing, corrupt or unreadable entries produce the caller's
/// fallback, and corrupt entries are dropped from the store. Writes are logged and
/// otherwise ignored on failure.
#[derive(Clone)]
pub struct PreferenceStore {
    collection: Arc<dyn KeyValueCollection>,
}

impl PreferenceStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let bytes = match self.collection.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return fallback,
            Err(e) => {
                debug!("Failed to read {key} from store: {e:#}");
                return fallback;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                debug!("Discarding malformed value for {key}: {e}");
                self.discard(key);
                fallback
            }
        }
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.collection.remove(key) {
            warn!("Failed to remove {key}: {e:#}");
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let res: Result<()> = (|| {
            let bytes = serde_json::to_vec(value)?;
            self.collection.put(key, &bytes)
        })();
        if let Err(e) = res {
            warn!("Failed to save {key}: {e:#}");
        }
    }

    pub fn load_pair(&self, fallback: CurrencyPair) -> CurrencyPair {
        let Some(stored) = self.load::<Option<CurrencyPair>>(PREFERENCES_KEY, None) else {
            return fallback;
        };
        let pair = CurrencyPair::new(&stored.from, &stored.to);
        if pair.is_well_formed() {
            pair
        } else {
            debug!(?pair, "Discarding stored pair with malformed codes");
            self.discard(PREFERENCES_KEY);
            fallback
        }
    }

    pub fn save_pair(&self, pair: &CurrencyPair) {
        self.save(PREFERENCES_KEY, pair);
    }

    /// Stored theme, else the system preference, else light.
    pub fn load_theme(&self) -> Theme {
        self.load_theme_with(Theme::system())
    }

    pub fn load_theme_with(&self, system: Option<Theme>) -> Theme {
        self.load::<Option<Theme>>(THEME_KEY, None)
            .or(system)
            .unwrap_or_default()
    }

    pub fn save_theme(&self, theme: Theme) {
        self.save(THEME_KEY, &theme);
    }

    pub fn load_history(&self) -> History {
        History::from_entries(self.load::<Vec<HistoryEntry>>(HISTORY_KEY, Vec::new()))
    }

    pub fn save_history(&self, history: &History) {
        self.save(HISTORY_KEY, history);
    }
}
