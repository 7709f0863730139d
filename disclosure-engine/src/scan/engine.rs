//! DisclosureEngine - one classification session over one document.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::debounce::TrailingDebounce;
use crate::cache::{CacheLoad, CachePolicy, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, EngineConfig};
use crate::decorate::{ensure_stylesheet, BadgeTemplates, Decorator, LayoutRules, StorefrontBadges};
use crate::extract::IdentifierExtractor;
use crate::fetch::HttpClient;
use crate::locator::{StorefrontLocator, TileLocator};
use crate::registry::{ProcessedSet, TileRegistry};
use crate::store::KeyValueStore;
use crate::tree::{DocumentTree, SelectorError};
use crate::types::EntryId;
use crate::verify::{DetailPageVerifier, DisclosureVerifier, ResolutionSink, VerificationQueue};

/// Error types for engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A built-in tile or layout selector failed to parse
    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    /// Identifier or marker pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Counts from one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidate tiles the locator returned
    pub seen: usize,
    /// Tiles not processed by an earlier pass
    pub new_tiles: usize,
    /// New tiles badged because their entry was already known positive
    pub decorated: usize,
    /// Entries newly queued for verification
    pub enqueued: usize,
    /// New tiles with no derivable identifier
    pub unidentified: usize,
}

#[derive(Debug, Default)]
struct Session {
    registry: TileRegistry,
    processed: ProcessedSet,
}

struct EngineInner {
    config: EngineConfig,
    document: Arc<dyn DocumentTree>,
    locator: Arc<dyn TileLocator>,
    extractor: IdentifierExtractor,
    decorator: Decorator,
    cache: CacheStore,
    queue: Arc<VerificationQueue>,
    session: Mutex<Session>,
}

#[async_trait]
impl ResolutionSink for EngineInner {
    async fn resolved_positive(&self, id: &EntryId) {
        // Recorded before the session lock: a scan that misses the record
        // has registered its tile by the time the lock is ours.
        self.cache.record_positive(id.clone()).await;

        let session = self.session.lock().await;
        let tiles = session.registry.tiles_for(id);
        let decorated = tiles
            .iter()
            .filter(|tile| {
                self.decorator
                    .decorate(self.document.as_ref(), **tile)
                    .is_applied()
            })
            .count();
        debug!(%id, tiles = tiles.len(), decorated, "Decorated tiles of verified entry");
    }
}

/// Builder for [`DisclosureEngine`].
pub struct EngineBuilder {
    document: Arc<dyn DocumentTree>,
    store: Arc<dyn KeyValueStore>,
    http: Arc<dyn HttpClient>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    locator: Option<Arc<dyn TileLocator>>,
    verifier: Option<Arc<dyn DisclosureVerifier>>,
    templates: Arc<dyn BadgeTemplates>,
}

impl EngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn TileLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Replace the detail-page verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn DisclosureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn BadgeTemplates>) -> Self {
        self.templates = templates;
        self
    }

    pub fn build(self) -> Result<DisclosureEngine, EngineError> {
        let config = self.config;
        config.validate()?;

        let locator = match self.locator {
            Some(locator) => locator,
            None => Arc::new(StorefrontLocator::new()?),
        };
        let verifier = match self.verifier {
            Some(verifier) => verifier,
            None => Arc::new(DetailPageVerifier::new(
                self.http.clone(),
                config.detail_page_base.clone(),
                &config.marker_phrase,
            )?),
        };

        let policy = CachePolicy {
            bulk_list_url: config.bulk_list_url.clone(),
            ttl_ms: config.cache_ttl_ms(),
            ids_key: config.cache_ids_key.clone(),
            time_key: config.cache_time_key.clone(),
        };

        let inner = EngineInner {
            extractor: IdentifierExtractor::storefront()?,
            decorator: Decorator::new(
                config.badge_class.clone(),
                LayoutRules::storefront()?,
                self.templates,
            ),
            cache: CacheStore::new(policy, self.store, self.http, self.clock),
            queue: Arc::new(VerificationQueue::new(verifier, config.fetch_delay())),
            session: Mutex::new(Session::default()),
            document: self.document,
            locator,
            config,
        };

        Ok(DisclosureEngine {
            inner: Arc::new(inner),
        })
    }
}

/// Incremental tile classifier and badger for one document.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct DisclosureEngine {
    inner: Arc<EngineInner>,
}

impl DisclosureEngine {
    /// Start building an engine over `document`, persisting the bulk list
    /// in `store` and fetching through `http`.
    pub fn builder(
        document: Arc<dyn DocumentTree>,
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
    ) -> EngineBuilder {
        EngineBuilder {
            document,
            store,
            http,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
            locator: None,
            verifier: None,
            templates: Arc::new(StorefrontBadges),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn queue(&self) -> &Arc<VerificationQueue> {
        &self.inner.queue
    }

    pub async fn is_known_positive(&self, id: &EntryId) -> bool {
        self.inner.cache.is_known_positive(id).await
    }

    /// Install the badge style sheet and load the known-positive set.
    pub async fn initialize(&self) -> CacheLoad {
        let inner = &self.inner;
        if ensure_stylesheet(inner.document.as_ref(), inner.decorator.badge_class()).is_none() {
            debug!("Document has no head or body for the badge style sheet");
        }
        inner.cache.load_known_positives().await
    }

    /// One pass over the document. Starts draining the verification queue
    /// if the pass left work in it.
    pub async fn scan(&self) -> ScanReport {
        let inner = &self.inner;
        let doc = inner.document.as_ref();
        let mut report = ScanReport::default();

        {
            let mut session = inner.session.lock().await;
            session.processed.prune(doc);

            for tile in inner.locator.locate(doc) {
                report.seen += 1;
                if !session.processed.insert(tile) {
                    continue;
                }
                report.new_tiles += 1;

                let Some(id) = inner.extractor.extract(doc, inner.locator.as_ref(), tile) else {
                    report.unidentified += 1;
                    continue;
                };
                session.registry.register(id.clone(), tile);

                if inner.cache.is_known_positive(&id).await {
                    if inner.decorator.decorate(doc, tile).is_applied() {
                        report.decorated += 1;
                    }
                } else if inner.queue.enqueue(id).await {
                    report.enqueued += 1;
                }
            }
        }

        let sink: Arc<dyn ResolutionSink> = inner.clone();
        inner.queue.drain(sink).await;

        debug!(
            seen = report.seen,
            new = report.new_tiles,
            decorated = report.decorated,
            enqueued = report.enqueued,
            unidentified = report.unidentified,
            "Scan complete"
        );
        report
    }

    /// Drive the session until the document is discarded: wait out the
    /// startup delay, load, scan once, then re-scan after each quiet
    /// debounce window following document changes.
    pub async fn run(self) {
        let config = &self.inner.config;
        tokio::time::sleep(config.startup_delay()).await;

        let load = self.initialize().await;
        // Subscribed before the first scan so no change in between is lost.
        let mut changes = self.inner.document.subscribe();
        info!(source = ?load.source, known = load.ids.len(), "Disclosure engine started");
        self.scan().await;

        let mut debounce = TrailingDebounce::new(config.debounce_window());
        loop {
            tokio::select! {
                event = changes.recv() => match event {
                    Some(_) => debounce.trigger(),
                    None => break,
                },
                _ = debounce.elapsed() => {
                    self.scan().await;
                }
            }
        }

        info!("Document discarded, disclosure engine stopped");
    }

    /// Run the session on a tokio task.
    pub fn spawn(&self) -> JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }
}
