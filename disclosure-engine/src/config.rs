//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Configuration rejected at engine construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL field does not parse as an absolute http(s) URL
    #[error("Invalid {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    /// The marker phrase is empty or whitespace
    #[error("Marker phrase must not be empty")]
    EmptyMarker,

    /// The badge class is not a usable CSS class name
    #[error("Invalid badge class: {0:?}")]
    InvalidBadgeClass(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Static JSON array of known-positive identifiers
    #[serde(default = "default_bulk_list_url")]
    pub bulk_list_url: String,

    /// Storefront origin; detail pages live at `{base}/app/{id}/`
    #[serde(default = "default_detail_page_base")]
    pub detail_page_base: String,

    /// Freshness window of the persisted bulk list
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_ms: u64,

    /// Pause after each verification fetch
    #[serde(default = "default_fetch_delay")]
    pub fetch_delay_ms: u64,

    /// Quiescence window before a re-scan
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Delay before the first load and scan
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u64,

    /// Phrase whose presence on a detail page marks a positive entry
    #[serde(default = "default_marker_phrase")]
    pub marker_phrase: String,

    /// Store slot holding the last fetched identifier array
    #[serde(default = "default_cache_ids_key")]
    pub cache_ids_key: String,

    /// Store slot holding the fetch timestamp (epoch millis)
    #[serde(default = "default_cache_time_key")]
    pub cache_time_key: String,

    /// Class carried by every inserted badge
    #[serde(default = "default_badge_class")]
    pub badge_class: String,
}

fn default_bulk_list_url() -> String {
    "https://raw.githubusercontent.com/Pierre-Demessence/SteamAIGamesIndicator/main/appids.json"
        .to_string()
}
fn default_detail_page_base() -> String { "https://store.steampowered.com".to_string() }
fn default_cache_ttl() -> u64 { 24 * 60 * 60 * 1000 } // 24 hours
fn default_fetch_delay() -> u64 { 1000 }
fn default_debounce() -> u64 { 200 }
fn default_startup_delay() -> u64 { 500 }
fn default_marker_phrase() -> String { "AI Generated Content Disclosure".to_string() }
fn default_cache_ids_key() -> String { "aiAppIds".to_string() }
fn default_cache_time_key() -> String { "aiAppIdsCacheTime".to_string() }
fn default_badge_class() -> String { "tm-ai-badge".to_string() }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bulk_list_url: default_bulk_list_url(),
            detail_page_base: default_detail_page_base(),
            cache_ttl_ms: default_cache_ttl(),
            fetch_delay_ms: default_fetch_delay(),
            debounce_ms: default_debounce(),
            startup_delay_ms: default_startup_delay(),
            marker_phrase: default_marker_phrase(),
            cache_ids_key: default_cache_ids_key(),
            cache_time_key: default_cache_time_key(),
            badge_class: default_badge_class(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `DISCLOSURE_*` environment variables.
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("DISCLOSURE_BULK_LIST_URL") {
            config.bulk_list_url = val;
        }
        if let Some(val) = lookup("DISCLOSURE_DETAIL_BASE") {
            config.detail_page_base = val;
        }

        let numeric = [
            ("DISCLOSURE_CACHE_TTL_MS", &mut config.cache_ttl_ms),
            ("DISCLOSURE_FETCH_DELAY_MS", &mut config.fetch_delay_ms),
            ("DISCLOSURE_DEBOUNCE_MS", &mut config.debounce_ms),
            ("DISCLOSURE_STARTUP_DELAY_MS", &mut config.startup_delay_ms),
        ];
        for (key, slot) in numeric {
            if let Some(val) = lookup(key) {
                match val.trim().parse::<u64>() {
                    Ok(ms) => *slot = ms,
                    Err(_) => warn!(key, value = %val, "Ignoring non-numeric override"),
                }
            }
        }

        config
    }

    pub fn cache_ttl_ms(&self) -> i64 {
        i64::try_from(self.cache_ttl_ms).unwrap_or(i64::MAX)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("bulk_list_url", &self.bulk_list_url)?;
        check_url("detail_page_base", &self.detail_page_base)?;
        if self.marker_phrase.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        let class_ok = !self.badge_class.is_empty()
            && self
                .badge_class
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !class_ok {
            return Err(ConfigError::InvalidBadgeClass(self.badge_class.clone()));
        }
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
