//! In-memory document tree with generational handles.

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use super::{ChangeSubscription, DocumentEvent, DocumentTree, ElementSpec, NodeId};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    fn get(&self, node: NodeId) -> Option<&Element> {
        let slot = self.slots.get(node.index() as usize)?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.element.as_ref()
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(node.index() as usize)?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.element.as_mut()
    }

    fn alloc(&mut self, element: Element) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            element: Some(element),
        });
        NodeId::new(index, 0)
    }

    /// Build `spec` and its children; returns the detached subtree root.
    fn build(&mut self, spec: &ElementSpec, parent: Option<NodeId>) -> NodeId {
        let node = self.alloc(Element {
            tag: spec.tag.clone(),
            attributes: spec.attributes.clone(),
            text: spec.text.clone().unwrap_or_default(),
            parent,
            children: Vec::new(),
        });
        for child in &spec.children {
            let child_id = self.build(child, Some(node));
            if let Some(element) = self.get_mut(node) {
                element.children.push(child_id);
            }
        }
        node
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let index = current.index() as usize;
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            if slot.generation != current.generation() {
                continue;
            }
            if let Some(element) = slot.element.take() {
                stack.extend(element.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index());
        }
    }
}

/// In-memory document: `html` > (`head`, `body`).
pub struct Dom {
    arena: RwLock<Arena>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    events: Mutex<Option<broadcast::Sender<DocumentEvent>>>,
}

impl Dom {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let root = arena.build(&ElementSpec::new("html"), None);
        let head = arena.build(&ElementSpec::new("head"), Some(root));
        let body = arena.build(&ElementSpec::new("body"), Some(root));
        if let Some(html) = arena.get_mut(root) {
            html.children = vec![head, body];
        }

        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            arena: RwLock::new(arena),
            root,
            head,
            body,
            events: Mutex::new(Some(tx)),
        }
    }

    /// Set or replace an attribute. Attribute changes are not structural,
    /// so no change notification is sent.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool {
        let mut arena = self.arena.write();
        let Some(element) = arena.get_mut(node) else {
            return false;
        };
        match element.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
        true
    }

    /// Signal an in-page navigation to subscribers.
    pub fn navigate(&self) {
        self.notify(DocumentEvent::Navigation);
    }

    /// Tear the document down from the subscribers' point of view: every
    /// subscription yields `None` after draining what was already sent.
    pub fn discard(&self) {
        self.events.lock().take();
    }

    /// Number of live elements, including `html`, `head` and `body`.
    pub fn len(&self) -> usize {
        let arena = self.arena.read();
        arena.slots.iter().filter(|s| s.element.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, event: DocumentEvent) {
        if let Some(tx) = self.events.lock().as_ref() {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }

    fn insert(&self, parent: NodeId, spec: &ElementSpec, at_front: bool) -> Option<NodeId> {
        let node = {
            let mut arena = self.arena.write();
            arena.get(parent)?;
            let node = arena.build(spec, Some(parent));
            let element = arena.get_mut(parent)?;
            if at_front {
                element.children.insert(0, node);
            } else {
                element.children.push(node);
            }
            node
        };
        self.notify(DocumentEvent::Mutation);
        Some(node)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree for Dom {
    fn is_live(&self, node: NodeId) -> bool {
        self.arena.read().get(node).is_some()
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.arena.read().get(node).map(|e| e.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let arena = self.arena.read();
        arena
            .get(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.read().get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .read()
            .get(node)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        let arena = self.arena.read();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(element) = arena.get(current) {
                out.push_str(&element.text);
                stack.extend(element.children.iter().rev().copied());
            }
        }
        out
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head).filter(|n| self.is_live(*n))
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body).filter(|n| self.is_live(*n))
    }

    fn append_child(&self, parent: NodeId, spec: &ElementSpec) -> Option<NodeId> {
        self.insert(parent, spec, false)
    }

    fn prepend_child(&self, parent: NodeId, spec: &ElementSpec) -> Option<NodeId> {
        self.insert(parent, spec, true)
    }

    fn remove(&self, node: NodeId) -> bool {
        if node == self.root {
            return false;
        }
        {
            let mut arena = self.arena.write();
            let Some(parent) = arena.get(node).map(|e| e.parent) else {
                return false;
            };
            if let Some(parent) = parent.and_then(|p| arena.get_mut(p)) {
                parent.children.retain(|c| *c != node);
            }
            arena.free_subtree(node);
        }
        self.notify(DocumentEvent::Mutation);
        true
    }

    fn subscribe(&self) -> ChangeSubscription {
        let rx = match self.events.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                // Already discarded: hand out a receiver whose sender is gone.
                let (_, rx) = broadcast::channel(1);
                rx
            }
        };
        ChangeSubscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Selector;

    fn card(app: &str) -> ElementSpec {
        ElementSpec::new("div")
            .with_class("tab_item")
            .with_child(ElementSpec::new("a").with_attr("href", format!("/app/{app}/")))
    }

    #[test]
    fn test_build_and_query() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let first = dom.append_child(body, &card("10")).unwrap();
        let second = dom.append_child(body, &card("20")).unwrap();

        let links = dom.query_all(dom.root(), &Selector::parse("a[href*='/app/']").unwrap());
        assert_eq!(links.len(), 2);
        assert_eq!(dom.closest(links[0], &Selector::class("tab_item")), Some(first));
        assert_eq!(dom.closest(links[1], &Selector::class("tab_item")), Some(second));
        assert_eq!(dom.parent(first), Some(body));
    }

    #[test]
    fn test_prepend_orders_first() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        dom.append_child(body, &ElementSpec::new("p").with_text("b"));
        dom.prepend_child(body, &ElementSpec::new("p").with_text("a"));
        assert_eq!(dom.text_content(body), "ab");
    }

    #[test]
    fn test_removed_handle_goes_stale_and_slot_reuse_does_not_alias() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let tile = dom.append_child(body, &card("10")).unwrap();
        let link = dom.children(tile)[0];

        assert!(dom.remove(tile));
        assert!(!dom.is_live(tile));
        assert!(!dom.is_live(link));
        assert_eq!(dom.attribute(link, "href"), None);
        assert!(dom.append_child(tile, &ElementSpec::new("span")).is_none());

        let replacement = dom.append_child(body, &card("20")).unwrap();
        assert_ne!(replacement, tile);
        assert!(!dom.is_live(tile));
        assert!(!dom.remove(tile));
    }

    #[test]
    fn test_element_by_id_and_has_class() {
        let dom = Dom::new();
        let head = dom.head().unwrap();
        let style = dom
            .append_child(head, &ElementSpec::new("style").with_id("s").with_class("x"))
            .unwrap();
        assert_eq!(dom.element_by_id("s"), Some(style));
        assert!(dom.has_class(style, "x"));
        assert!(dom.element_by_id("missing").is_none());
    }

    #[tokio::test]
    async fn test_mutations_and_discard_reach_subscribers() {
        let dom = Dom::new();
        let mut changes = dom.subscribe();
        let body = dom.body().unwrap();

        dom.append_child(body, &ElementSpec::new("div"));
        dom.navigate();
        dom.discard();

        assert_eq!(changes.recv().await, Some(DocumentEvent::Mutation));
        assert_eq!(changes.recv().await, Some(DocumentEvent::Navigation));
        assert_eq!(changes.recv().await, None);
        assert_eq!(dom.subscribe().recv().await, None);
    }

    #[test]
    fn test_set_attribute() {
        let dom = Dom::new();
        let body = dom.body().unwrap();
        let div = dom.append_child(body, &ElementSpec::new("div")).unwrap();
        assert!(dom.set_attribute(div, "data-ds-appid", "70"));
        assert_eq!(dom.attribute(div, "data-ds-appid").as_deref(), Some("70"));
    }
}
