//! Decoration engine: idempotently badge a tile.
//!
//! Decoration is additive and best-effort. A tile that already carries a
//! badge, fits no known layout, or has been detached is left alone.

pub mod badges;
pub mod layout;
pub mod stylesheet;

pub use badges::{BadgeTemplates, StorefrontBadges};
pub use layout::{Anchor, BadgeKind, LayoutRules};
pub use stylesheet::{ensure_stylesheet, stylesheet_id};

use std::sync::Arc;
use tracing::debug;

use crate::tree::{DocumentTree, NodeId, Selector};

/// Result of a [`Decorator::decorate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Applied { kind: BadgeKind, badge: NodeId },
    AlreadyBadged,
    NoAnchor,
    Detached,
}

impl Decoration {
    pub fn is_applied(&self) -> bool {
        matches!(self, Decoration::Applied { .. })
    }
}

pub struct Decorator {
    badge_class: String,
    badge: Selector,
    layout: LayoutRules,
    templates: Arc<dyn BadgeTemplates>,
}

impl Decorator {
    pub fn new(
        badge_class: impl Into<String>,
        layout: LayoutRules,
        templates: Arc<dyn BadgeTemplates>,
    ) -> Self {
        let badge_class = badge_class.into();
        Self {
            badge: Selector::class(badge_class.clone()),
            badge_class,
            layout,
            templates,
        }
    }

    pub fn badge_class(&self) -> &str {
        &self.badge_class
    }

    fn anchor_has_badge(&self, doc: &dyn DocumentTree, parent: NodeId) -> bool {
        doc.children(parent)
            .into_iter()
            .any(|c| self.badge.matches(doc, c))
    }

    pub fn decorate(&self, doc: &dyn DocumentTree, tile: NodeId) -> Decoration {
        if !doc.is_live(tile) {
            return Decoration::Detached;
        }
        if doc.query(tile, &self.badge).is_some() {
            return Decoration::AlreadyBadged;
        }

        let Some(anchor) = self.layout.detect(doc, tile) else {
            debug!(%tile, "No badge anchor for tile");
            return Decoration::NoAnchor;
        };
        if self.anchor_has_badge(doc, anchor.parent) {
            return Decoration::AlreadyBadged;
        }

        let spec = self.templates.render(anchor.kind, &self.badge_class);
        match doc.append_child(anchor.parent, &spec) {
            Some(badge) => {
                debug!(%tile, kind = ?anchor.kind, "Badge applied");
                Decoration::Applied {
                    kind: anchor.kind,
                    badge,
                }
            }
            None => Decoration::Detached,
        }
    }
}
