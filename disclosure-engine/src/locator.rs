//! Tile location: which elements are tiles, and where their identifiers live.

use crate::tree::{DocumentTree, NodeId, Selector, SelectorError};

/// Injected tree-query capability used by the scan loop and the extractor.
pub trait TileLocator: Send + Sync {
    /// Candidate tiles in document order. May contain duplicates; the scan
    /// loop deduplicates.
    fn locate(&self, doc: &dyn DocumentTree) -> Vec<NodeId>;

    /// Nested input/checkbox-like control carrying an explicit identifier.
    fn identifier_control(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId>;

    /// Entry link of the tile: the tile itself when it is an anchor.
    fn link(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId>;
}

/// Storefront layouts: modern capsules, spotlight/`ds_flagged` tiles, tab
/// lists, search rows and wishlist panels.
#[derive(Debug, Clone)]
pub struct StorefrontLocator {
    game_link: Selector,
    tile_containers: Vec<Selector>,
    id_control: Selector,
    panel_containers: Vec<Selector>,
}

impl StorefrontLocator {
    pub fn new() -> Result<Self, SelectorError> {
        Ok(Self {
            game_link: Selector::parse("a[href*='/app/']")?,
            tile_containers: vec![
                Selector::parse("._3r4Ny9tQdQZc50XDM5B2q2")?,
                Selector::parse(".ds_flagged")?,
                Selector::parse(".tab_item")?,
                Selector::parse(".search_result_row")?,
            ],
            id_control: Selector::parse("input[data-appid]")?,
            panel_containers: vec![
                Selector::parse("[class*='Panel']")?,
                Selector::parse("[data-index]")?,
            ],
        })
    }

    fn tile_for_link(&self, doc: &dyn DocumentTree, link: NodeId) -> NodeId {
        self.tile_containers
            .iter()
            .find_map(|sel| doc.closest(link, sel))
            .unwrap_or(link)
    }

    fn panel_for_control(&self, doc: &dyn DocumentTree, control: NodeId) -> Option<NodeId> {
        self.panel_containers
            .iter()
            .find_map(|sel| doc.closest(control, sel))
            .or_else(|| doc.parent(control).and_then(|p| doc.parent(p)))
    }
}

impl TileLocator for StorefrontLocator {
    fn locate(&self, doc: &dyn DocumentTree) -> Vec<NodeId> {
        let root = doc.root();
        let mut tiles: Vec<NodeId> = doc
            .query_all(root, &self.game_link)
            .into_iter()
            .map(|link| self.tile_for_link(doc, link))
            .collect();

        tiles.extend(
            doc.query_all(root, &self.id_control)
                .into_iter()
                .filter_map(|control| self.panel_for_control(doc, control)),
        );

        tiles
    }

    fn identifier_control(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId> {
        doc.query(tile, &self.id_control)
    }

    fn link(&self, doc: &dyn DocumentTree, tile: NodeId) -> Option<NodeId> {
        if doc.tag(tile).as_deref() == Some("a") {
            Some(tile)
        } else {
            doc.query(tile, &self.game_link)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Dom, ElementSpec};

    fn link(app: &str) -> ElementSpec {
        ElementSpec::new("a").with_attr("href", format!("https://store.example/app/{app}/x"))
    }

    #[test]
    fn test_links_resolve_to_layout_containers() {
        let dom = Dom::new();
        let body = dom.body().unwrap();

        let capsule = dom
            .append_child(
                body,
                &ElementSpec::new("div")
                    .with_class("_3r4Ny9tQdQZc50XDM5B2q2")
                    .with_child(ElementSpec::new("div").with_child(link("1"))),
            )
            .unwrap();
        let row = dom
            .append_child(
                body,
                &ElementSpec::new("a")
                    .with_class("search_result_row")
                    .with_attr("href", "/app/2/"),
            )
            .unwrap();
        let bare = dom.append_child(body, &link("3")).unwrap();

        let locator = StorefrontLocator::new().unwrap();
        assert_eq!(locator.locate(&dom), vec![capsule, row, bare]);
    }

    #[test]
    fn test_wishlist_controls_resolve_to_panels() {
        let dom = Dom::new();
        let body = dom.body().unwrap();

        let panel = dom
            .append_child(
                body,
                &ElementSpec::new("div").with_class("WishlistPanel_x1").with_child(
                    ElementSpec::new("label")
                        .with_child(ElementSpec::new("input").with_attr("data-appid", "40")),
                ),
            )
            .unwrap();

        let grandparent = dom
            .append_child(
                body,
                &ElementSpec::new("section").with_child(
                    ElementSpec::new("span")
                        .with_child(ElementSpec::new("input").with_attr("data-appid", "41")),
                ),
            )
            .unwrap();

        let locator = StorefrontLocator::new().unwrap();
        assert_eq!(locator.locate(&dom), vec![panel, grandparent]);
        assert!(locator.identifier_control(&dom, panel).is_some());
    }

    #[test]
    fn test_link_of_anchor_tile_is_itself() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let anchor = dom.append_child(body, &link("5")).unwrap();
        let locator = StorefrontLocator::new().unwrap();
        assert_eq!(locator.link(&dom, anchor), Some(anchor));
        assert_eq!(locator.link(&dom, body), Some(anchor));
    }
}
