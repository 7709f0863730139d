//! Disclosure Engine - incremental tile classification and badging
//!
//! Scans a continuously mutating storefront document for item tiles,
//! decides whether each tile's entry carries the AI content disclosure, and
//! badges confirmed tiles exactly once:
//! - Known positives come from a TTL-cached bulk list
//! - Unknown entries are verified one at a time against their detail page
//! - Document changes trigger a debounced re-scan
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           DisclosureEngine              │
//! │   (scan loop, one session per page)     │
//! └───────┬──────────────┬──────────────┬───┘
//!         ▼              ▼              ▼
//! ┌──────────────┐ ┌────────────┐ ┌──────────────┐
//! │ TileLocator  │ │ CacheStore │ │ Verification │
//! │ + Identifier │ │ (bulk list │ │ Queue        │
//! │   Extractor  │ │  + TTL)    │ │ (1 in flight)│
//! └──────┬───────┘ └────────────┘ └──────┬───────┘
//!        ▼                               ▼
//! ┌──────────────┐               ┌──────────────┐
//! │ TileRegistry │◄──────────────│  Decorator   │
//! │ (fan-out)    │   resolved    │  (badges)    │
//! └──────────────┘               └──────────────┘
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod decorate;
pub mod extract;
pub mod fetch;
pub mod locator;
pub mod page;
pub mod registry;
pub mod scan;
pub mod store;
pub mod tree;
pub mod types;
pub mod verify;

// Re-export main types for convenience
pub use cache::{CacheError, CacheLoad, CachePolicy, CacheSource, CacheStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use decorate::{BadgeKind, BadgeTemplates, Decoration, Decorator, LayoutRules, StorefrontBadges};
pub use extract::IdentifierExtractor;
pub use fetch::{FetchError, HttpClient, HttpResponse, MockHttpClient, ReqwestClient};
pub use locator::{StorefrontLocator, TileLocator};
pub use page::PageKind;
pub use registry::{ProcessedSet, TileRegistry};
pub use scan::{DisclosureEngine, EngineBuilder, EngineError, ScanReport, TrailingDebounce};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use tree::{
    ChangeSubscription, DocumentEvent, DocumentTree, Dom, ElementSpec, NodeId, Selector,
    SelectorError,
};
pub use types::{EntryId, KnownPositiveSet};
pub use verify::{
    detail_page_url, DetailPageVerifier, DisclosureVerifier, Inconclusive, ResolutionSink, Verification,
    VerificationQueue,
};
