//! Engine integration tests
//!
//! Drives whole sessions over an in-memory document:
//! - Bulk-listed entries badged on the first scan with no verification
//! - Unlisted entries verified once, delay-separated, then badged everywhere
//! - Tiles detached before their entry resolves are skipped
//! - Stale cache fallback when the bulk list refresh fails
//! - Debounced re-scans while the loop runs

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use disclosure_engine::{
    detail_page_url, CacheSource, DisclosureEngine, DocumentTree, Dom, ElementSpec, EngineConfig,
    EntryId, FixedClock, JsonFileStore, MemoryStore, MockHttpClient, NodeId, Selector,
    StorefrontLocator, TileLocator,
};

const BULK: &str = "http://lists.test/appids.json";
const MARKER_PAGE: &str = "<div id=\"game_area_content_descriptors\">\
    <h2>AI Generated Content Disclosure</h2><p>The developers describe...</p></div>";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("disclosure_engine=debug")
        .with_test_writer()
        .try_init();
}

fn config() -> EngineConfig {
    EngineConfig {
        bulk_list_url: BULK.to_string(),
        detail_page_base: "http://store.test".to_string(),
        ..Default::default()
    }
}

fn detail(id: u64) -> String {
    detail_page_url(&config().detail_page_base, &EntryId::from(id))
}

fn tab_item(app: u64) -> ElementSpec {
    ElementSpec::new("div")
        .with_class("tab_item")
        .with_child(ElementSpec::new("a").with_attr("href", format!("/app/{app}/")))
}

fn search_row(app: u64) -> ElementSpec {
    ElementSpec::new("a")
        .with_class("search_result_row")
        .with_attr("href", format!("/app/{app}/?snr=1"))
        .with_attr("data-ds-appid", app.to_string())
}

fn capsule(app: u64) -> ElementSpec {
    ElementSpec::new("div")
        .with_class("_3r4Ny9tQdQZc50XDM5B2q2")
        .with_child(ElementSpec::new("a").with_attr("href", format!("/app/{app}/")))
        .with_child(ElementSpec::new("div").with_class("CapsuleDecorators"))
}

fn add(dom: &Dom, spec: &ElementSpec) -> NodeId {
    dom.append_child(dom.body().unwrap(), spec).unwrap()
}

fn badged(dom: &Dom, tile: NodeId) -> bool {
    !dom.query_all(tile, &Selector::class("tm-ai-badge")).is_empty()
}

fn badge_count(dom: &Dom) -> usize {
    dom.query_all(dom.root(), &Selector::class("tm-ai-badge")).len()
}

// =============================================================================
// Bulk list + verification
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_listed_unlisted_and_unmarked_entries() {
    init_tracing();
    let dom = Arc::new(Dom::new());
    let listed = add(&dom, &tab_item(10));
    let marked = add(&dom, &tab_item(20));
    let unmarked = add(&dom, &tab_item(30));

    let http = Arc::new(
        MockHttpClient::new()
            .with_response(BULK, 200, "[10]")
            .with_response(detail(20), 200, MARKER_PAGE)
            .with_response(detail(30), 200, "<html>no disclosure here</html>"),
    );
    let engine = DisclosureEngine::builder(dom.clone(), Arc::new(MemoryStore::new()), http.clone())
        .with_config(config())
        .build()
        .unwrap();

    let load = engine.initialize().await;
    assert_eq!(load.source, CacheSource::Refreshed);

    let report = engine.scan().await;
    assert_eq!(report.decorated, 1);
    assert_eq!(report.enqueued, 2);
    assert!(badged(&dom, listed));
    assert_eq!(http.calls_to(&detail(10)), 0);

    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(badged(&dom, marked));
    assert!(!badged(&dom, unmarked));
    assert_eq!(http.calls_to(&detail(20)), 1);
    assert_eq!(http.calls_to(&detail(30)), 1);

    let detail_calls: Vec<_> = http
        .calls()
        .into_iter()
        .filter(|c| c.url != BULK)
        .collect();
    assert_eq!(detail_calls.len(), 2);
    assert!(detail_calls[1].at - detail_calls[0].at >= config().fetch_delay());

    // Another tile for the unmarked entry is not re-queried this session.
    add(&dom, &search_row(30));
    let report = engine.scan().await;
    assert_eq!(report.new_tiles, 1);
    assert_eq!(report.enqueued, 0);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(http.calls_to(&detail(30)), 1);
    assert!(!engine.queue().is_draining().await);
}

#[tokio::test(start_paused = true)]
async fn test_verified_entry_badges_every_layout() {
    init_tracing();
    let dom = Arc::new(Dom::new());
    let tiles = [
        add(&dom, &tab_item(77)),
        add(&dom, &search_row(77)),
        add(&dom, &capsule(77)),
    ];

    let http = Arc::new(
        MockHttpClient::new()
            .with_response(BULK, 200, "[]")
            .with_response(detail(77), 200, MARKER_PAGE.to_uppercase()),
    );
    let engine = DisclosureEngine::builder(dom.clone(), Arc::new(MemoryStore::new()), http.clone())
        .with_config(config())
        .build()
        .unwrap();

    engine.initialize().await;
    let report = engine.scan().await;
    assert_eq!(report.new_tiles, 3);
    assert_eq!(report.enqueued, 1);
    assert_eq!(badge_count(&dom), 0);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    for tile in tiles {
        assert!(badged(&dom, tile));
    }
    assert_eq!(badge_count(&dom), 3);
    assert_eq!(http.calls_to(&detail(77)), 1);

    // Re-scanning is a no-op for tiles already handled.
    engine.scan().await;
    assert_eq!(badge_count(&dom), 3);
}

#[tokio::test(start_paused = true)]
async fn test_tile_removed_before_verification_resolves() {
    init_tracing();
    let dom = Arc::new(Dom::new());
    let kept = add(&dom, &tab_item(88));
    let removed = add(&dom, &tab_item(88));

    let http = Arc::new(
        MockHttpClient::new()
            .with_response(BULK, 200, "[]")
            .with_response(detail(88), 200, MARKER_PAGE),
    );
    let engine = DisclosureEngine::builder(dom.clone(), Arc::new(MemoryStore::new()), http.clone())
        .with_config(config())
        .build()
        .unwrap();

    engine.initialize().await;
    let report = engine.scan().await;
    assert_eq!(report.new_tiles, 2);
    assert_eq!(report.enqueued, 1);
    assert!(dom.remove(removed));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(badged(&dom, kept));
    assert_eq!(badge_count(&dom), 1);
    assert!(engine.is_known_positive(&EntryId::from(88)).await);

    // A same-layout tile arriving later waits for the next scan.
    let replacement = add(&dom, &tab_item(88));
    assert!(!badged(&dom, replacement));

    let report = engine.scan().await;
    assert_eq!(report.new_tiles, 1);
    assert_eq!(report.decorated, 1);
    assert!(badged(&dom, replacement));
    assert_eq!(badge_count(&dom), 2);
    assert_eq!(http.calls_to(&detail(88)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_inconclusive() {
    let dom = Arc::new(Dom::new());
    let tile = add(&dom, &tab_item(5));
    let http = Arc::new(
        MockHttpClient::new()
            .with_response(BULK, 200, "[]")
            .with_failure(detail(5), "connection reset"),
    );
    let engine = DisclosureEngine::builder(dom.clone(), Arc::new(MemoryStore::new()), http.clone())
        .with_config(config())
        .build()
        .unwrap();

    engine.initialize().await;
    engine.scan().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(!badged(&dom, tile));
    assert!(!engine.is_known_positive(&EntryId::from(5)).await);
    assert!(engine.queue().has_seen(&EntryId::from(5)).await);

    http.set_response(detail(5), 200, MARKER_PAGE);
    add(&dom, &tab_item(5));
    engine.scan().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(http.calls_to(&detail(5)), 1);
    assert_eq!(badge_count(&dom), 0);
}

// =============================================================================
// Cache freshness
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_cached_positives() {
    let now = 1_700_000_000_000;
    let store = Arc::new(
        MemoryStore::new()
            .with_value("aiAppIds", json!(["10", "20"]))
            .with_value("aiAppIdsCacheTime", json!(now - 2 * 86_400_000)),
    );
    let dom = Arc::new(Dom::new());
    let first = add(&dom, &tab_item(10));
    let second = add(&dom, &search_row(20));
    let http = Arc::new(MockHttpClient::new().with_response(BULK, 500, "oops"));

    let engine = DisclosureEngine::builder(dom.clone(), store, http.clone())
        .with_config(config())
        .with_clock(Arc::new(FixedClock::new(now)))
        .build()
        .unwrap();

    let load = engine.initialize().await;
    assert_eq!(load.source, CacheSource::Stale);
    assert_eq!(http.calls_to(BULK), 1);

    let report = engine.scan().await;
    assert_eq!(report.decorated, 2);
    assert_eq!(report.enqueued, 0);
    assert!(badged(&dom, first));
    assert!(badged(&dom, second));
}

#[tokio::test(start_paused = true)]
async fn test_file_store_survives_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let clock = Arc::new(FixedClock::new(1_000_000));
    let http = Arc::new(MockHttpClient::new().with_response(BULK, 200, r#"[42, "43"]"#));

    let session = |dom: Arc<Dom>| {
        DisclosureEngine::builder(dom, Arc::new(JsonFileStore::new(path.clone())), http.clone())
            .with_config(config())
            .with_clock(clock.clone())
            .build()
            .unwrap()
    };

    let first = session(Arc::new(Dom::new()));
    assert_eq!(first.initialize().await.source, CacheSource::Refreshed);

    clock.advance(60_000);
    let dom = Arc::new(Dom::new());
    let tile = add(&dom, &tab_item(43));
    let second = session(dom.clone());
    assert_eq!(second.initialize().await.source, CacheSource::Fresh);
    second.scan().await;

    assert!(badged(&dom, tile));
    assert_eq!(http.calls_to(BULK), 1);
}

// =============================================================================
// Scan loop
// =============================================================================

struct CountingLocator {
    inner: StorefrontLocator,
    scans: AtomicUsize,
}

impl TileLocator for CountingLocator {
    fn locate(&self, doc: &dyn DocumentTree) -> Vec<NodeId> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.locate(doc)
    }

    fn identifier_control(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId> {
        self.inner.identifier_control(doc, tile)
    }

    fn link(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId> {
        self.inner.link(doc, tile)
    }
}

#[tokio::test(start_paused = true)]
async fn test_mutation_burst_collapses_into_one_scan() {
    let dom = Arc::new(Dom::new());
    let locator = Arc::new(CountingLocator {
        inner: StorefrontLocator::new().unwrap(),
        scans: AtomicUsize::new(0),
    });
    let http = Arc::new(MockHttpClient::new().with_response(BULK, 200, "[]"));
    let engine = DisclosureEngine::builder(dom.clone(), Arc::new(MemoryStore::new()), http)
        .with_config(config())
        .with_locator(locator.clone())
        .build()
        .unwrap();

    let handle = engine.spawn();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(locator.scans.load(Ordering::SeqCst), 1);

    for app in 1..=5 {
        add(&dom, &tab_item(app));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(locator.scans.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(locator.scans.load(Ordering::SeqCst), 2);
    assert_eq!(engine.queue().pending_len().await + 1, 5);

    dom.discard();
    handle.await.unwrap();
}
