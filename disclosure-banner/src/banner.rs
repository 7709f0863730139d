//! Banner singleton on an entry's detail page.
//!
//! The banner mirrors the page's own content-descriptor block: it exists
//! exactly while that block carries a disclosure heading. It is the only
//! element this crate ever removes, and it only removes its own.

use regex::Regex;
use tracing::debug;

use disclosure_engine::tree::{DocumentTree, ElementSpec, NodeId, Selector, SelectorError};
use disclosure_engine::verify::marker_pattern;

use crate::config::BannerConfig;

const BANNER_STYLE: &str = "background:#ff6b6b;color:#fff;padding:12px 16px;font-size:15px;\
font-weight:600;text-align:center;border-radius:6px;margin-bottom:10px;\
box-shadow:0 2px 6px rgba(0,0,0,0.2);z-index:9999";

/// Error types for banner construction.
#[derive(Debug, thiserror::Error)]
pub enum BannerError {
    /// A built-in page selector failed to parse
    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    /// Marker phrase failed to compile
    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Disclosure found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure {
    pub heading: String,
    /// Text of the block's second paragraph, when present
    pub description: Option<String>,
}

/// Outcome of one [`DetailBanner::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Shown { banner: NodeId, created: bool },
    Removed,
    Absent,
}

pub struct DetailBanner {
    banner_id: String,
    marker: Regex,
    block: Selector,
    heading: Selector,
    paragraph: Selector,
    title: Selector,
    page_content: Selector,
}

impl DetailBanner {
    pub fn new(config: &BannerConfig) -> Result<Self, BannerError> {
        Ok(Self {
            banner_id: config.banner_id.clone(),
            marker: marker_pattern(&config.marker_phrase)?,
            block: Selector::parse("#game_area_content_descriptors")?,
            heading: Selector::parse("h2")?,
            paragraph: Selector::parse("p")?,
            title: Selector::parse("#appHubAppName, .apphub_AppName")?,
            page_content: Selector::parse("#page_content, .responsive_page_template_content")?,
        })
    }

    /// Bring the banner in line with the page.
    pub fn check(&self, doc: &dyn DocumentTree) -> BannerState {
        match self.disclosure(doc) {
            Some(disclosure) => match self.ensure(doc, &disclosure) {
                Some((banner, created)) => BannerState::Shown { banner, created },
                None => BannerState::Absent,
            },
            None if self.remove(doc) => BannerState::Removed,
            None => BannerState::Absent,
        }
    }

    /// Read the disclosure out of the content-descriptor block.
    pub fn disclosure(&self, doc: &dyn DocumentTree) -> Option<Disclosure> {
        let block = doc.query(doc.root(), &self.block)?;
        let heading = doc.query(block, &self.heading)?;
        let heading = doc.text_content(heading).trim().to_string();
        if !self.marker.is_match(&heading) {
            return None;
        }

        let description = doc
            .query_all(block, &self.paragraph)
            .get(1)
            .map(|p| doc.text_content(*p).trim().to_string());
        Some(Disclosure {
            heading,
            description,
        })
    }

    pub fn current(&self, doc: &dyn DocumentTree) -> Option<NodeId> {
        doc.element_by_id(&self.banner_id)
    }

    /// Insert the banner unless one exists. Returns the banner and whether
    /// this call created it.
    pub fn ensure(&self, doc: &dyn DocumentTree, disclosure: &Disclosure) -> Option<(NodeId, bool)> {
        if let Some(existing) = self.current(doc) {
            return Some((existing, false));
        }

        let parent = doc
            .query(doc.root(), &self.title)
            .and_then(|title| doc.parent(title))
            .or_else(|| doc.query(doc.root(), &self.page_content))
            .or_else(|| doc.body())?;
        let banner = doc.prepend_child(parent, &self.render(disclosure))?;
        debug!(%banner, "Disclosure banner shown");
        Some((banner, true))
    }

    pub fn remove(&self, doc: &dyn DocumentTree) -> bool {
        let Some(banner) = self.current(doc) else {
            return false;
        };
        debug!(%banner, "Disclosure banner removed");
        doc.remove(banner)
    }

    fn render(&self, disclosure: &Disclosure) -> ElementSpec {
        ElementSpec::new("div")
            .with_id(self.banner_id.clone())
            .with_attr("style", BANNER_STYLE)
            .with_child(
                ElementSpec::new("div")
                    .with_attr("style", "font-size:18px;margin-bottom:6px")
                    .with_text(format!("\u{26a0}\u{fe0f} {}", disclosure.heading)),
            )
            .with_child(
                ElementSpec::new("div")
                    .with_attr("style", "font-weight:400")
                    .with_text(disclosure.description.clone().unwrap_or_default()),
            )
    }
}
