//! Document tree abstraction.
//!
//! The engine never owns host elements. It sees the page through the
//! [`DocumentTree`] trait: generational [`NodeId`] handles, a handful of
//! primitive reads, additive inserts, and a change subscription. Every
//! operation on a stale handle degrades to `None`, `false` or a no-op.
//!
//! [`Dom`] is the in-process implementation used by tests and by hosts that
//! mirror a page into memory.

pub mod dom;
pub mod node;
pub mod selector;

pub use dom::Dom;
pub use node::{ElementSpec, NodeId};
pub use selector::{Selector, SelectorError};

use tokio::sync::broadcast;

/// Structural change signalled by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Children were added or removed somewhere in the tree.
    Mutation,
    /// The host navigated in-page (history push/pop/replace).
    Navigation,
}

/// Subscription to [`DocumentEvent`]s. Dropping it unsubscribes.
pub struct ChangeSubscription {
    rx: broadcast::Receiver<DocumentEvent>,
}

impl ChangeSubscription {
    pub fn new(rx: broadcast::Receiver<DocumentEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the document has been discarded. Notifications
    /// dropped because the subscriber fell behind are reported as a single
    /// mutation; callers only care that something changed.
    pub async fn recv(&mut self) -> Option<DocumentEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => Some(DocumentEvent::Mutation),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// Read/insert access to a host document.
pub trait DocumentTree: Send + Sync {
    /// Whether the handle still refers to an element in the tree.
    fn is_live(&self, node: NodeId) -> bool;

    /// Lower-cased tag name.
    fn tag(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Concatenated text of the element and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// The document element.
    fn root(&self) -> NodeId;

    fn head(&self) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    /// Insert `spec` as the last child of `parent`.
    fn append_child(&self, parent: NodeId, spec: &ElementSpec) -> Option<NodeId>;

    /// Insert `spec` as the first child of `parent`.
    fn prepend_child(&self, parent: NodeId, spec: &ElementSpec) -> Option<NodeId>;

    /// Detach and drop an element with its subtree.
    fn remove(&self, node: NodeId) -> bool;

    fn subscribe(&self) -> ChangeSubscription;

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// Descendants of `scope` in document order, excluding `scope`.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node).filter(|n| self.is_live(*n));
        while let Some(n) = current {
            if selector.matches(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let selector = Selector::id(id);
        let root = self.root();
        if selector.matches(self, root) {
            return Some(root);
        }
        self.query(root, &selector)
    }
}
