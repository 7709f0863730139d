//! Keeps the banner in sync while the detail page changes underneath it.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use disclosure_engine::page::PageKind;
use disclosure_engine::scan::TrailingDebounce;
use disclosure_engine::tree::{DocumentEvent, DocumentTree};

use crate::banner::{BannerError, BannerState, DetailBanner};
use crate::config::BannerConfig;

/// Whether the banner belongs on the page at `url`.
pub fn applies_to(url: &str, config: &BannerConfig) -> bool {
    PageKind::classify(url, &config.storefront_base)
        .entry()
        .is_some()
}

pub struct BannerWatcher {
    banner: DetailBanner,
    document: Arc<dyn DocumentTree>,
    config: BannerConfig,
}

impl BannerWatcher {
    pub fn new(document: Arc<dyn DocumentTree>, config: BannerConfig) -> Result<Self, BannerError> {
        Ok(Self {
            banner: DetailBanner::new(&config)?,
            document,
            config,
        })
    }

    pub fn check(&self) -> BannerState {
        self.banner.check(self.document.as_ref())
    }

    /// Check once, then again after each quiet window following a mutation
    /// or a navigation. Mutations and navigations debounce independently.
    /// Returns when the document is discarded.
    pub async fn run(self) {
        let mut changes = self.document.subscribe();
        let state = self.check();
        info!(?state, "Banner watcher started");

        let mut mutations = TrailingDebounce::new(self.config.mutation_debounce());
        let mut navigations = TrailingDebounce::new(self.config.navigation_debounce());
        loop {
            tokio::select! {
                event = changes.recv() => match event {
                    Some(DocumentEvent::Mutation) => mutations.trigger(),
                    Some(DocumentEvent::Navigation) => navigations.trigger(),
                    None => break,
                },
                _ = mutations.elapsed() => {
                    let state = self.check();
                    debug!(?state, "Re-checked after mutations");
                }
                _ = navigations.elapsed() => {
                    let state = self.check();
                    debug!(?state, "Re-checked after navigation");
                }
            }
        }

        info!("Document discarded, banner watcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
