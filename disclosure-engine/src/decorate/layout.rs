//! Layout detection: where a tile's badge is anchored.

use crate::tree::{DocumentTree, NodeId, Selector, SelectorError};

/// Badge variant, one per storefront layout family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKind {
    /// Inline slot inside a modern capsule's decorator strip
    Decorator,
    /// Absolute-positioned flag on spotlight / main capsule tiles
    SpotlightFlag,
    /// Tab list item (top sellers, upcoming)
    TabItem,
    /// Search result row
    SearchRow,
    /// Overlay on a wishlist panel's image container
    ImageOverlay,
}

/// Chosen anchor: append a badge of `kind` to `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub kind: BadgeKind,
    pub parent: NodeId,
}

/// Structural markers tested in priority order.
#[derive(Debug, Clone)]
pub struct LayoutRules {
    decorators: Selector,
    spotlight: Selector,
    tab_item: Selector,
    search_row: Selector,
    id_control: Selector,
    image: Selector,
}

impl LayoutRules {
    pub fn storefront() -> Result<Self, SelectorError> {
        Ok(Self {
            decorators: Selector::parse(".CapsuleDecorators")?,
            spotlight: Selector::parse(".ds_flagged")?,
            tab_item: Selector::parse(".tab_item")?,
            search_row: Selector::parse(".search_result_row")?,
            id_control: Selector::parse("input[data-appid]")?,
            image: Selector::parse("img")?,
        })
    }

    /// First matching layout, or `None` when the tile fits none of them.
    pub fn detect(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<Anchor> {
        if let Some(parent) = doc.query(tile, &self.decorators) {
            return Some(Anchor {
                kind: BadgeKind::Decorator,
                parent,
            });
        }

        let ancestor_rules = [
            (&self.spotlight, BadgeKind::SpotlightFlag),
            (&self.tab_item, BadgeKind::TabItem),
            (&self.search_row, BadgeKind::SearchRow),
        ];
        for (selector, kind) in ancestor_rules {
            if let Some(parent) = doc.closest(tile, selector) {
                return Some(Anchor { kind, parent });
            }
        }

        doc.query(tile, &self.id_control)?;
        let image = doc.query(tile, &self.image)?;
        doc.parent(image).map(|parent| Anchor {
            kind: BadgeKind::ImageOverlay,
            parent,
        })
    }
}
