//! Identifier extraction.
//!
//! Strategies, first match wins:
//! 1. identifier attribute on a nested control (wishlist checkbox)
//! 2. identifier attribute on the tile
//! 3. identifier attribute on the entry link
//! 4. numeric id parsed from the link's URL path
//!
//! Structured attributes outrank the URL. Blank attribute values fall
//! through to the next strategy.

use regex::Regex;

use crate::locator::TileLocator;
use crate::tree::{DocumentTree, NodeId};
use crate::types::EntryId;

#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    control_attribute: String,
    tile_attribute: String,
    link_attribute: String,
    path_pattern: Regex,
}

impl IdentifierExtractor {
    /// `path_pattern` must capture the identifier in group 1.
    pub fn new(
        control_attribute: impl Into<String>,
        tile_attribute: impl Into<String>,
        link_attribute: impl Into<String>,
        path_pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            control_attribute: control_attribute.into(),
            tile_attribute: tile_attribute.into(),
            link_attribute: link_attribute.into(),
            path_pattern: Regex::new(path_pattern)?,
        })
    }

    pub fn storefront() -> Result<Self, regex::Error> {
        Self::new("data-appid", "data-ds-appid", "data-ds-appid", r"/app/(\d+)")
    }

    pub fn extract(
        &self,
        doc: &dyn DocumentTree,
        locator: &dyn TileLocator,
        tile: NodeId,
    ) -> Option<EntryId> {
        if !doc.is_live(tile) {
            return None;
        }

        let from_control = || {
            locator
                .identifier_control(doc, tile)
                .and_then(|c| attribute_id(doc, c, &self.control_attribute))
        };
        let from_tile = || attribute_id(doc, tile, &self.tile_attribute);

        if let Some(id) = from_control().or_else(from_tile) {
            return Some(id);
        }

        let link = locator.link(doc, tile)?;
        attribute_id(doc, link, &self.link_attribute).or_else(|| {
            let href = doc.attribute(link, "href")?;
            let captures = self.path_pattern.captures(&href)?;
            EntryId::parse(captures.get(1)?.as_str())
        })
    }
}

fn attribute_id(doc: &dyn DocumentTree, node: NodeId, name: &str) -> Option<EntryId> {
    doc.attribute(node, name).and_then(|v| EntryId::parse(&v))
}
