//! Banner configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerConfig {
    /// Element id of the banner singleton
    #[serde(default = "default_banner_id")]
    pub banner_id: String,

    /// Heading text that marks the content-descriptor block as a disclosure
    #[serde(default = "default_marker_phrase")]
    pub marker_phrase: String,

    /// Storefront origin, used to recognise detail pages
    #[serde(default = "default_storefront_base")]
    pub storefront_base: String,

    /// Quiet window after document mutations
    #[serde(default = "default_mutation_debounce")]
    pub mutation_debounce_ms: u64,

    /// Quiet window after in-page navigation
    #[serde(default = "default_navigation_debounce")]
    pub navigation_debounce_ms: u64,
}

fn default_banner_id() -> String { "tm-ai-label".to_string() }
fn default_marker_phrase() -> String { "AI Generated Content Disclosure".to_string() }
fn default_storefront_base() -> String { "https://store.steampowered.com".to_string() }
fn default_mutation_debounce() -> u64 { 300 }
fn default_navigation_debounce() -> u64 { 200 }

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            banner_id: default_banner_id(),
            marker_phrase: default_marker_phrase(),
            storefront_base: default_storefront_base(),
            mutation_debounce_ms: default_mutation_debounce(),
            navigation_debounce_ms: default_navigation_debounce(),
        }
    }
}

impl BannerConfig {
    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn navigation_debounce(&self) -> Duration {
        Duration::from_millis(self.navigation_debounce_ms)
    }
}
