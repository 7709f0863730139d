//! Session bookkeeping: which tiles show which entry, and which tiles have
//! already been handled.

use std::collections::{HashMap, HashSet};

use crate::tree::{DocumentTree, NodeId};
use crate::types::EntryId;

/// Maps an entry to every tile found displaying it, in discovery order.
///
/// Handles are never removed. Resolving a stale handle is a no-op in the
/// document, so detached tiles simply fail to decorate.
#[derive(Debug, Default)]
pub struct TileRegistry {
    tiles: HashMap<EntryId, Vec<NodeId>>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callers register each tile once; the processed set gates repeats.
    pub fn register(&mut self, id: EntryId, tile: NodeId) {
        self.tiles.entry(id).or_default().push(tile);
    }

    pub fn tiles_for(&self, id: &EntryId) -> &[NodeId] {
        self.tiles.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct entries seen.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Tiles that have been through the scan once.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    seen: HashSet<NodeId>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a tile processed. Returns `false` if it already was.
    pub fn insert(&mut self, tile: NodeId) -> bool {
        self.seen.insert(tile)
    }

    pub fn contains(&self, tile: NodeId) -> bool {
        self.seen.contains(&tile)
    }

    /// Forget handles whose tiles left the document.
    pub fn prune(&mut self, doc: &dyn DocumentTree) -> usize {
        let before = self.seen.len();
        self.seen.retain(|tile| doc.is_live(*tile));
        before - self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Dom, ElementSpec};

    #[test]
    fn test_fan_out_keeps_every_tile() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let a = dom.append_child(body, &ElementSpec::new("div")).unwrap();
        let b = dom.append_child(body, &ElementSpec::new("div")).unwrap();

        let mut registry = TileRegistry::new();
        registry.register(EntryId::from(5), a);
        registry.register(EntryId::from(5), b);

        assert_eq!(registry.tiles_for(&EntryId::from(5)), &[a, b]);
        assert!(registry.tiles_for(&EntryId::from(6)).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_prune_drops_detached_tiles() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let kept = dom.append_child(body, &ElementSpec::new("div")).unwrap();
        let dropped = dom.append_child(body, &ElementSpec::new("div")).unwrap();

        let mut processed = ProcessedSet::new();
        assert!(processed.insert(kept));
        assert!(processed.insert(dropped));
        assert!(!processed.insert(kept));

        dom.remove(dropped);
        assert_eq!(processed.prune(&dom), 1);
        assert!(processed.contains(kept));
        assert!(!processed.contains(dropped));
    }
}
