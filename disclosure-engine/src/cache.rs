//! Known-positive cache.
//!
//! Two store slots back the bulk list: the identifier array and its fetch
//! timestamp. A load inside the TTL window is served from the store. Past
//! it, the list is fetched again; if that fails, the previously persisted
//! list is used as-is and the timestamp is left alone so the next load
//! retries instead of waiting out a full window.
//!
//! Identifiers confirmed one by one during a session are kept in memory
//! only. The persisted list mirrors the remote canonical list and nothing
//! else.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::fetch::{FetchError, HttpClient};
use crate::store::KeyValueStore;
use crate::types::{EntryId, KnownPositiveSet};

/// Error types for bulk list refreshes.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Bulk list fetch did not complete
    #[error("Bulk list fetch failed: {0}")]
    Transport(#[from] FetchError),

    /// Bulk list answered with a non-200 status
    #[error("Bulk list returned HTTP {0}")]
    Status(u16),

    /// Bulk list body is not a JSON array
    #[error("Malformed bulk list: {0}")]
    Malformed(String),
}

/// Cache location and freshness policy.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub bulk_list_url: String,
    pub ttl_ms: i64,
    pub ids_key: String,
    pub time_key: String,
}

/// Where the identifiers of a load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Persisted list inside the TTL window
    Fresh,
    /// Fetched from the bulk list just now
    Refreshed,
    /// Refresh failed; previously persisted list reused
    Stale,
    /// Refresh failed and nothing was persisted yet
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct CacheLoad {
    pub source: CacheSource,
    pub ids: Vec<EntryId>,
}

pub struct CacheStore {
    policy: CachePolicy,
    store: Arc<dyn KeyValueStore>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    known: RwLock<KnownPositiveSet>,
}

impl CacheStore {
    pub fn new(
        policy: CachePolicy,
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            store,
            http,
            clock,
            known: RwLock::new(KnownPositiveSet::new()),
        }
    }

    /// Load the bulk list per the TTL policy and merge it into the
    /// known-positive set.
    pub async fn load_known_positives(&self) -> CacheLoad {
        let now = self.clock.now_ms();
        let fetched_at = self.read_timestamp().await;
        let cached = self.read_ids().await;

        if let (Some(at), Some(ids)) = (fetched_at, cached.as_ref()) {
            if now.saturating_sub(at) < self.policy.ttl_ms {
                let load = CacheLoad {
                    source: CacheSource::Fresh,
                    ids: ids.clone(),
                };
                self.merge(&load).await;
                info!(count = load.ids.len(), "Loaded known positives from cache");
                return load;
            }
        }

        let load = match self.fetch_bulk_list().await {
            Ok(ids) => {
                self.persist(&ids, now).await;
                info!(count = ids.len(), "Fetched and cached known positives");
                CacheLoad {
                    source: CacheSource::Refreshed,
                    ids,
                }
            }
            Err(e) => match cached {
                Some(ids) => {
                    warn!(error = %e, count = ids.len(), "Bulk list refresh failed, using stale cache");
                    CacheLoad {
                        source: CacheSource::Stale,
                        ids,
                    }
                }
                None => {
                    warn!(error = %e, "Bulk list unavailable and nothing cached");
                    CacheLoad {
                        source: CacheSource::Unavailable,
                        ids: Vec::new(),
                    }
                }
            },
        };

        self.merge(&load).await;
        load
    }

    /// Remember a session-confirmed positive. Not persisted.
    pub async fn record_positive(&self, id: EntryId) -> bool {
        self.known.write().await.insert(id)
    }

    pub async fn is_known_positive(&self, id: &EntryId) -> bool {
        self.known.read().await.contains(id.as_str())
    }

    pub async fn known_count(&self) -> usize {
        self.known.read().await.len()
    }

    async fn merge(&self, load: &CacheLoad) {
        self.known.write().await.extend(load.ids.iter().cloned());
    }

    async fn read_timestamp(&self) -> Option<i64> {
        match self.store.get(&self.policy.time_key).await {
            Ok(Some(value)) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f as i64)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read cache timestamp");
                None
            }
        }
    }

    async fn read_ids(&self) -> Option<Vec<EntryId>> {
        match self.store.get(&self.policy.ids_key).await {
            Ok(Some(Value::Array(items))) => Some(normalize(&items)),
            Ok(Some(_)) => {
                warn!(key = %self.policy.ids_key, "Ignoring non-array cached identifiers");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read cached identifiers");
                None
            }
        }
    }

    async fn persist(&self, ids: &[EntryId], now: i64) {
        let array = Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect());
        if let Err(e) = self.store.set(&self.policy.ids_key, array).await {
            warn!(error = %e, "Failed to persist identifiers");
            return;
        }
        // Only stamp the time once the list itself is stored.
        if let Err(e) = self.store.set(&self.policy.time_key, Value::from(now)).await {
            warn!(error = %e, "Failed to persist cache timestamp");
        }
    }

    async fn fetch_bulk_list(&self) -> Result<Vec<EntryId>, CacheError> {
        debug!(url = %self.policy.bulk_list_url, "Fetching bulk list");
        let response = self.http.get(&self.policy.bulk_list_url).await?;
        if !response.is_ok() {
            return Err(CacheError::Status(response.status));
        }
        parse_bulk_list(&response.body)
    }
}

/// Parse a flat JSON array of numeric or string identifiers.
///
/// Entries that are neither are skipped; a body that is not an array is
/// malformed as a whole.
pub fn parse_bulk_list(body: &str) -> Result<Vec<EntryId>, CacheError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Ok(normalize(&items)),
        Ok(_) => Err(CacheError::Malformed("expected a JSON array".to_string())),
        Err(e) => Err(CacheError::Malformed(e.to_string())),
    }
}

fn normalize(items: &[Value]) -> Vec<EntryId> {
    let ids: Vec<EntryId> = items.iter().filter_map(EntryId::from_json).collect();
    if ids.len() != items.len() {
        debug!(skipped = items.len() - ids.len(), "Skipped non-identifier entries");
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fetch::MockHttpClient;
    use crate::store::MemoryStore;
    use serde_json::json;

    const URL: &str = "https://lists.example/appids.json";
    const TTL: i64 = 24 * 60 * 60 * 1000;
    const NOW: i64 = 1_750_000_000_000;

    fn policy() -> CachePolicy {
        CachePolicy {
            bulk_list_url: URL.to_string(),
            ttl_ms: TTL,
            ids_key: "ids".to_string(),
            time_key: "at".to_string(),
        }
    }

    fn cache(store: Arc<MemoryStore>, http: Arc<MockHttpClient>) -> CacheStore {
        CacheStore::new(policy(), store, http, Arc::new(FixedClock::new(NOW)))
    }

    fn seeded(at: i64) -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_value("ids", json!(["10", "20"]))
                .with_value("at", json!(at)),
        )
    }

    #[tokio::test]
    async fn test_just_past_ttl_refetches() {
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, "[30]"));
        let cache = cache(seeded(NOW - TTL - 1), http.clone());

        let load = cache.load_known_positives().await;
        assert_eq!(load.source, CacheSource::Refreshed);
        assert_eq!(http.calls_to(URL), 1);
        assert!(cache.is_known_positive(&EntryId::from(30)).await);
    }

    #[tokio::test]
    async fn test_just_inside_ttl_uses_cache() {
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, "[30]"));
        let cache = cache(seeded(NOW - TTL + 1), http.clone());

        let load = cache.load_known_positives().await;
        assert_eq!(load.source, CacheSource::Fresh);
        assert_eq!(http.call_count(), 0);
        assert!(cache.is_known_positive(&EntryId::from(10)).await);
        assert!(!cache.is_known_positive(&EntryId::from(30)).await);
    }

    #[tokio::test]
    async fn test_refresh_persists_list_and_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, r#"[620, "400", null]"#));
        let cache = cache(store.clone(), http);

        let load = cache.load_known_positives().await;
        assert_eq!(load.ids, vec![EntryId::from(620), EntryId::from(400)]);
        assert_eq!(store.get("ids").await.unwrap(), Some(json!(["620", "400"])));
        assert_eq!(store.get("at").await.unwrap(), Some(json!(NOW)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_prior_set_and_timestamp() {
        let store = seeded(NOW - TTL - 5);
        let http = Arc::new(MockHttpClient::new().with_response(URL, 500, "oops"));
        let cache = cache(store.clone(), http);

        let load = cache.load_known_positives().await;
        assert_eq!(load.source, CacheSource::Stale);
        assert!(cache.is_known_positive(&EntryId::from(10)).await);
        assert!(cache.is_known_positive(&EntryId::from(20)).await);
        assert_eq!(store.get("at").await.unwrap(), Some(json!(NOW - TTL - 5)));
    }

    #[tokio::test]
    async fn test_malformed_payload_on_first_run_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, r#"{"ids": [1]}"#));
        let cache = cache(store.clone(), http);

        let load = cache.load_known_positives().await;
        assert_eq!(load.source, CacheSource::Unavailable);
        assert!(load.ids.is_empty());
        assert_eq!(cache.known_count().await, 0);
        assert_eq!(store.get("at").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_is_absorbed() {
        let http = Arc::new(MockHttpClient::new().with_failure(URL, "dns"));
        let cache = cache(Arc::new(MemoryStore::new()), http);
        assert_eq!(
            cache.load_known_positives().await.source,
            CacheSource::Unavailable
        );
    }

    #[tokio::test]
    async fn test_fresh_timestamp_without_list_refetches() {
        let store = Arc::new(MemoryStore::new().with_value("at", json!(NOW)));
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, "[1]"));
        let cache = cache(store, http.clone());

        assert_eq!(
            cache.load_known_positives().await.source,
            CacheSource::Refreshed
        );
        assert_eq!(http.calls_to(URL), 1);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_network() {
        let store = seeded(NOW);
        store.set_failing(true);
        let http = Arc::new(MockHttpClient::new().with_response(URL, 200, "[7]"));
        let cache = cache(store, http);

        let load = cache.load_known_positives().await;
        assert_eq!(load.source, CacheSource::Refreshed);
        assert!(cache.is_known_positive(&EntryId::from(7)).await);
    }

    #[tokio::test]
    async fn test_record_positive_is_memory_only() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store.clone(), Arc::new(MockHttpClient::new()));

        assert!(cache.record_positive(EntryId::from(99)).await);
        assert!(!cache.record_positive(EntryId::from(99)).await);
        assert!(cache.is_known_positive(&EntryId::from(99)).await);
        assert_eq!(store.get("ids").await.unwrap(), None);
    }

    #[test]
    fn test_parse_bulk_list() {
        assert_eq!(
            parse_bulk_list(r#"[1, "2", true]"#).unwrap(),
            vec![EntryId::from(1), EntryId::from(2)]
        );
        assert!(matches!(
            parse_bulk_list("not json"),
            Err(CacheError::Malformed(_))
        ));
    }
}
