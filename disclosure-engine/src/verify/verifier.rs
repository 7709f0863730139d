//! Detail-page verifier.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::fetch::HttpClient;
use crate::types::EntryId;

/// Why a verification did not come back positive. None of these prove the
/// entry lacks the disclosure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconclusive {
    MarkerAbsent,
    Status(u16),
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Positive,
    Inconclusive(Inconclusive),
}

/// Decides whether one entry carries the disclosure.
#[async_trait]
pub trait DisclosureVerifier: Send + Sync {
    async fn verify(&self, id: &EntryId) -> Verification;
}

/// Case-insensitive literal match of `phrase`.
pub fn marker_pattern(phrase: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(phrase))
        .case_insensitive(true)
        .build()
}

/// Detail page of `id` under the storefront origin `base`.
pub fn detail_page_url(base: &str, id: &EntryId) -> String {
    format!("{}/app/{}/", base.trim_end_matches('/'), id)
}

pub struct DetailPageVerifier {
    http: Arc<dyn HttpClient>,
    base_url: String,
    marker: Regex,
}

impl DetailPageVerifier {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        marker_phrase: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            http,
            base_url: base_url.into(),
            marker: marker_pattern(marker_phrase)?,
        })
    }
}

#[async_trait]
impl DisclosureVerifier for DetailPageVerifier {
    async fn verify(&self, id: &EntryId) -> Verification {
        match self.http.get(&detail_page_url(&self.base_url, id)).await {
            Ok(response) if !response.is_ok() => {
                Verification::Inconclusive(Inconclusive::Status(response.status))
            }
            Ok(response) if self.marker.is_match(&response.body) => Verification::Positive,
            Ok(_) => Verification::Inconclusive(Inconclusive::MarkerAbsent),
            Err(e) => Verification::Inconclusive(Inconclusive::Transport(e.to_string())),
        }
    }
}
