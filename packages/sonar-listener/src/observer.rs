//! Element observer: mirrors DOM nodes the framework inserts, removes and
//! mutates.

use crate::tracker::{DomListeners, Entry, Handle, Tracker};
use smallvec::SmallVec;
use sonar_core::{DomHandle, DomNodeKind, HandleKey, Handler, Listener, NodeId, NodeKind};
use std::rc::Rc;

/// Element, text, or anchor (a comment or blank text node used as an
/// insertion marker).
pub fn classify(node: &DomHandle) -> NodeKind {
    match node.kind() {
        DomNodeKind::Element => NodeKind::Element,
        DomNodeKind::Text if node.node_value().is_some_and(|v| !v.trim().is_empty()) => {
            NodeKind::Text
        }
        _ => NodeKind::Anchor,
    }
}

impl Tracker {
    /// `node` was inserted into `target` before `anchor`.
    ///
    /// An already tracked node is moved, staying under the block that created
    /// it; otherwise it and every untracked descendant are added.
    pub fn dom_insert(
        &mut self,
        node: &DomHandle,
        target: Option<&DomHandle>,
        anchor: Option<&DomHandle>,
    ) {
        let target = target.and_then(|t| self.node_of(t));
        let anchor_key = anchor.map(HandleKey::of);

        if let Some(id) = self.node_of(node) {
            let parent_block = self.entries.get(&id).and_then(|e| e.parent_block);
            let parent = self.resolve_parent(target, parent_block);
            let anchor = anchor.and_then(|a| self.node_of(a));
            tracing::trace!("Moving tracked node {}", id);
            self.store.relocate(id, parent, anchor);
            return;
        }
        self.observe(node, target, anchor_key);
    }

    fn observe(&mut self, node: &DomHandle, target: Option<NodeId>, anchor: Option<HandleKey>) {
        if self.node_of(node).is_some() {
            return;
        }

        let id = self.allocate_id();
        let entry = Entry {
            kind: classify(node),
            tag_name: node.node_name().to_lowercase(),
            handle: Handle::Dom(node.clone()),
            parent_block: self.current_block,
        };
        self.add_node(id, entry, target, anchor);

        for child in node.child_nodes() {
            self.observe(&child, Some(id), None);
        }
    }

    pub fn dom_remove(&mut self, node: &DomHandle) {
        match self.node_of(node) {
            Some(id) => {
                self.remove_node(id);
            }
            None => {
                tracing::trace!("Ignoring removal of untracked DOM node");
                self.dom_listeners.remove(&HandleKey::of(node));
            }
        }
    }

    /// Data, property or attribute change on `node`.
    pub fn dom_update(&mut self, node: &DomHandle) {
        let Some(id) = self.node_of(node) else {
            return;
        };
        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.kind == NodeKind::Anchor && classify(node) == NodeKind::Text {
                entry.kind = NodeKind::Text;
            }
        }
        self.emit_update(id);
    }

    pub fn dom_add_listener(
        &mut self,
        node: &DomHandle,
        event: impl Into<String>,
        handler: impl Into<String>,
        modifiers: impl IntoIterator<Item = String>,
    ) {
        let listener = Listener {
            event: event.into(),
            handler: Handler::Source(handler.into()),
            modifiers: modifiers.into_iter().collect(),
        };
        self.dom_listeners.retain(|_, entry| entry.is_live());
        self.dom_listeners
            .entry(HandleKey::of(node))
            .or_insert_with(|| DomListeners {
                node: Rc::downgrade(node),
                listeners: Vec::new(),
            })
            .listeners
            .push(listener);
        if let Some(id) = self.node_of(node) {
            self.emit_update(id);
        }
    }

    /// Removes the first listener matching event, handler and modifiers.
    pub fn dom_remove_listener(
        &mut self,
        node: &DomHandle,
        event: &str,
        handler: &str,
        modifiers: &[String],
    ) {
        let key = HandleKey::of(node);
        let Some(DomListeners { listeners, .. }) = self.dom_listeners.get_mut(&key) else {
            return;
        };
        let modifiers: SmallVec<[String; 2]> = modifiers.iter().cloned().collect();
        let Some(index) = listeners.iter().position(|l| {
            l.event == event && l.handler == Handler::Source(handler.to_string()) && l.modifiers == modifiers
        }) else {
            return;
        };
        listeners.remove(index);
        if listeners.is_empty() {
            self.dom_listeners.remove(&key);
        }
        if let Some(id) = self.node_of(node) {
            self.emit_update(id);
        }
    }

    /// Listeners registered on a DOM node, tracked or not.
    pub fn listeners_of(&self, node: &DomHandle) -> &[Listener] {
        self.dom_listeners
            .get(&HandleKey::of(node))
            .map(|entry| &entry.listeners[..])
            .unwrap_or(&[])
    }

    /// Number of DOM nodes currently carrying listeners.
    pub fn listener_targets(&self) -> usize {
        self.dom_listeners.len()
    }
}
