//! Locale message catalogs.
//!
//! Catalogs are parsed once at startup into a process-wide table. Lookups
//! resolve the requested locale, then English, then the configured default
//! locale. Within a catalog, a missing condition falls back to the
//! catalog's `unknown` entry and finally to the raw condition code.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::weather_condition;
use crate::{ForkcastError, Result};

/// Universal fallback locale.
pub const FALLBACK_LOCALE: &str = "en";

/// Locale used when neither the requested locale nor English is loaded.
pub const DEFAULT_LOCALE: &str = "vi";

const BUILTIN_CATALOGS: [(&str, &str); 3] = [
    ("en", include_str!("../assets/messages/en.json")),
    ("vi", include_str!("../assets/messages/vi.json")),
    ("fr", include_str!("../assets/messages/fr.json")),
];

#[derive(Debug, Clone, Default, Deserialize)]
struct Messages {
    #[serde(default)]
    weather: WeatherMessages,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WeatherMessages {
    #[serde(default)]
    conditions: HashMap<String, String>,
}

/// Preloaded locale → messages table.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locales: HashMap<String, Messages>,
    default_locale: String,
}

impl MessageCatalog {
    /// Load the catalogs compiled into the binary (en, vi, fr).
    pub fn builtin() -> Result<Self> {
        Self::from_sources(BUILTIN_CATALOGS, DEFAULT_LOCALE)
    }

    /// Build a catalog from `(locale, json)` pairs.
    pub fn from_sources<'a, I>(sources: I, default_locale: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut locales = HashMap::new();
        for (locale, raw) in sources {
            let messages: Messages = serde_json::from_str(raw).map_err(|e| {
                ForkcastError::Configuration(format!("invalid catalog for locale {locale}: {e}"))
            })?;
            locales.insert(locale.to_string(), messages);
        }
        Ok(Self {
            locales,
            default_locale: default_locale.into(),
        })
    }

    /// Replace the locale of last resort.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Whether a catalog is loaded for `locale`.
    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.contains_key(locale)
    }

    /// Resolve the locale actually used for `requested`.
    pub fn resolve_locale<'a>(&'a self, requested: &'a str) -> &'a str {
        if self.has_locale(requested) {
            requested
        } else if self.has_locale(FALLBACK_LOCALE) {
            FALLBACK_LOCALE
        } else {
            &self.default_locale
        }
    }

    /// Localized text for a WMO weather code.
    pub fn condition_text(&self, locale: &str, code: i64) -> String {
        let condition = weather_condition(code);
        let Some(messages) = self.locales.get(self.resolve_locale(locale)) else {
            return condition;
        };
        let conditions = &messages.weather.conditions;
        conditions
            .get(&condition)
            .or_else(|| conditions.get("unknown"))
            .cloned()
            .unwrap_or(condition)
    }
}
