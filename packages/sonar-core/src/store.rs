use crate::events::{StoreEvent, SubscriptionId};
use crate::navigation::Visibility;
use crate::node::{Handler, Listener, NodeData, NodeDetail, NodeId, NodeKind, TrackedNode};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use slotmap::SlotMap;
use sonar_scheduler::{Clock, LocalScheduler, Scheduler, SystemClock};
use std::rc::Rc;

pub const DEFAULT_RETRY_DELAY_MS: f64 = 100.0;
pub const DEFAULT_BUBBLE_MARKER: &str = "bubble($$self, event)";
pub const FROM_PARENT_PREFIX: &str = "// From parent\n";

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Delay before a deferred insertion looks for its target again.
    pub retry_delay_ms: f64,
    /// Handler source fragment the framework emits for forwarded events.
    pub bubble_marker: String,
    pub visibility: Visibility,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            bubble_marker: DEFAULT_BUBBLE_MARKER.to_string(),
            visibility: Visibility::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Spliced into the target's children.
    Linked,
    /// No target was given; appended to the root list.
    Root,
    /// Target unknown; parked in the root list until the retry fires.
    Deferred,
    /// The id was already tracked; the data was merged instead.
    AlreadyTracked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedListener {
    pub event: String,
    pub handler: Option<String>,
    pub modifiers: Vec<String>,
}

struct DeferredInsert {
    target: NodeId,
    anchor: Option<NodeId>,
    /// Only the retry timer scheduled for this deferral may consume it.
    generation: u64,
}

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// The authoritative shadow tree of one inspected page.
///
/// Nodes live in an id-keyed arena; `parent` and `children` are ids into it.
/// Every mutation marks the affected nodes dirty; [`ShadowStore::flush`]
/// publishes one coalesced invalidation per refresh and computes flash state.
pub struct ShadowStore {
    pub(crate) nodes: FxHashMap<NodeId, TrackedNode>,
    pub(crate) roots: Vec<NodeId>,
    deferred: FxHashMap<NodeId, DeferredInsert>,
    next_generation: u64,
    dirty: FxHashSet<NodeId>,
    fresh: FxHashSet<NodeId>,
    roots_dirty: bool,
    pub(crate) selected: Option<NodeId>,
    hovered: Option<NodeId>,
    pub(crate) visibility: Visibility,
    options: StoreOptions,
    scheduler: Rc<LocalScheduler<ShadowStore>>,
    subscribers: SlotMap<SubscriptionId, Subscriber>,
}

impl ShadowStore {
    pub fn new(options: StoreOptions, clock: Rc<dyn Clock>) -> Self {
        Self {
            nodes: FxHashMap::default(),
            roots: Vec::new(),
            deferred: FxHashMap::default(),
            next_generation: 0,
            dirty: FxHashSet::default(),
            fresh: FxHashSet::default(),
            roots_dirty: false,
            selected: None,
            hovered: None,
            visibility: options.visibility.clone(),
            options,
            scheduler: Rc::new(LocalScheduler::with_clock(clock)),
            subscribers: SlotMap::with_key(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreOptions::default(), Rc::new(SystemClock::new()))
    }

    // ---- read interface ----

    pub fn get(&self, id: NodeId) -> Option<&TrackedNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| &n.children[..]).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn is_deferred(&self, id: NodeId) -> bool {
        self.deferred.contains_key(&id)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn set_visible(&mut self, kind: NodeKind, visible: bool) {
        self.visibility.set(kind, visible);
        self.roots_dirty = true;
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Ids in display order: roots first, depth-first, children in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    /// `id` and all of its descendants, depth-first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.parent(cur);
        }
        false
    }

    // ---- subscriptions ----

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.subscribers.insert(Box::new(subscriber))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub fn publish(&mut self, event: StoreEvent) {
        for subscriber in self.subscribers.values_mut() {
            subscriber(&event);
        }
    }

    /// Runs pending deferred-insertion retries that are due.
    pub fn tick(&mut self) -> bool {
        let scheduler = self.scheduler.clone();
        scheduler.tick(self)
    }

    pub fn pending_retries(&self) -> usize {
        self.deferred.len()
    }

    // ---- mutations ----

    pub fn insert(
        &mut self,
        data: NodeData,
        target: Option<NodeId>,
        anchor: Option<NodeId>,
    ) -> InsertOutcome {
        let id = data.id;
        if self.deferred.contains_key(&id) {
            tracing::trace!("Node {} already waiting for its target", id);
            return InsertOutcome::Deferred;
        }
        if self.nodes.contains_key(&id) {
            tracing::debug!("Node {} inserted twice, merging instead", id);
            self.update(data);
            return InsertOutcome::AlreadyTracked;
        }

        let mut node = TrackedNode::from_data(data);
        mark_bubbles(&mut node.detail, &self.options.bubble_marker);
        self.nodes.insert(id, node);
        self.fresh.insert(id);
        self.place(id, target, anchor)
    }

    /// Moves a tracked node (with its subtree) to a new position.
    pub fn relocate(
        &mut self,
        id: NodeId,
        target: Option<NodeId>,
        anchor: Option<NodeId>,
    ) -> Option<InsertOutcome> {
        if !self.nodes.contains_key(&id) {
            return None;
        }
        self.deferred.remove(&id);
        self.unlink(id);
        Some(self.place(id, target, anchor))
    }

    fn place(&mut self, id: NodeId, target: Option<NodeId>, anchor: Option<NodeId>) -> InsertOutcome {
        match target {
            None => {
                self.push_root(id);
                self.publish(StoreEvent::Inserted {
                    id,
                    parent: None,
                    anchor: None,
                });
                InsertOutcome::Root
            }
            Some(target) if self.nodes.contains_key(&target) && !self.is_ancestor_or_self(id, target) => {
                self.link(id, target, anchor);
                self.publish(StoreEvent::Inserted {
                    id,
                    parent: Some(target),
                    anchor,
                });
                InsertOutcome::Linked
            }
            Some(target) => {
                tracing::debug!("Target {} of node {} not tracked yet, deferring", target, id);
                self.push_root(id);
                self.next_generation += 1;
                let generation = self.next_generation;
                self.deferred.insert(
                    id,
                    DeferredInsert {
                        target,
                        anchor,
                        generation,
                    },
                );
                self.scheduler.schedule_timeout(
                    self.options.retry_delay_ms,
                    Box::new(move |store: &mut ShadowStore| {
                        if store.deferred.get(&id).is_some_and(|p| p.generation == generation) {
                            store.retry_deferred(id);
                        }
                    }),
                );
                self.publish(StoreEvent::Deferred { id, target });
                InsertOutcome::Deferred
            }
        }
    }

    /// Second and last attempt to link a deferred node. Returns true when the
    /// node moved under its target; otherwise it stays a root.
    pub fn retry_deferred(&mut self, id: NodeId) -> bool {
        let Some(pending) = self.deferred.remove(&id) else {
            return false;
        };
        if !self.nodes.contains_key(&id) {
            return false;
        }
        if !self.nodes.contains_key(&pending.target) || self.is_ancestor_or_self(id, pending.target)
        {
            tracing::debug!(
                "Target {} of node {} never arrived, keeping it as a root",
                pending.target,
                id
            );
            return false;
        }

        self.unlink(id);
        self.link(id, pending.target, pending.anchor);
        self.publish(StoreEvent::Inserted {
            id,
            parent: Some(pending.target),
            anchor: pending.anchor,
        });
        true
    }

    fn push_root(&mut self, id: NodeId) {
        self.roots.push(id);
        self.roots_dirty = true;
    }

    fn link(&mut self, id: NodeId, target: NodeId, anchor: Option<NodeId>) {
        if let Some(parent) = self.nodes.get_mut(&target) {
            let index = anchor.and_then(|a| parent.children.iter().position(|&c| c == a));
            match index {
                Some(index) => parent.children.insert(index, id),
                None => parent.children.push(id),
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(target);
        }
        self.dirty.insert(target);
    }

    /// Detaches `id` from its parent (or the root list). Returns the former parent.
    fn unlink(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get_mut(&id)?.parent.take();
        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    if let Some(index) = parent.children.iter().position(|&c| c == id) {
                        parent.children.remove(index);
                    }
                }
                self.dirty.insert(parent_id);
            }
            None => {
                if let Some(index) = self.roots.iter().position(|&r| r == id) {
                    self.roots.remove(index);
                    self.roots_dirty = true;
                }
            }
        }
        parent
    }

    /// Removes `id` and, defensively, every descendant still linked under it.
    ///
    /// Returns the ids dropped from the index; empty when `id` is unknown.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(&id) {
            tracing::trace!("Ignoring remove of unknown node {}", id);
            return Vec::new();
        }

        let parent = self.unlink(id);
        let removed = self.subtree(id);
        for gone in &removed {
            self.nodes.remove(gone);
            self.deferred.remove(gone);
            self.dirty.remove(gone);
            self.fresh.remove(gone);
        }

        if self.selected.is_some_and(|s| removed.contains(&s)) {
            self.selected = None;
            self.publish(StoreEvent::SelectionChanged { id: None });
        }
        if self.hovered.is_some_and(|h| removed.contains(&h)) {
            self.hovered = None;
            self.publish(StoreEvent::HoverChanged { id: None });
        }

        self.publish(StoreEvent::Removed { id, parent });
        removed
    }

    /// Merges new data onto the tracked node in place. Unknown ids are dropped.
    pub fn update(&mut self, data: NodeData) -> bool {
        let id = data.id;
        let Some(node) = self.nodes.get_mut(&id) else {
            tracing::trace!("Ignoring update of unknown node {}", id);
            return false;
        };

        node.kind = data.kind;
        node.tag_name = data.tag_name;
        node.detail = data.detail;
        mark_bubbles(&mut node.detail, &self.options.bubble_marker);

        self.dirty.insert(id);
        self.publish(StoreEvent::Updated { id });
        if self.selected == Some(id) {
            self.publish(StoreEvent::SelectionChanged { id: Some(id) });
        }
        true
    }

    pub fn invalidate(&mut self, id: NodeId) {
        if self.nodes.contains_key(&id) {
            self.dirty.insert(id);
        }
    }

    /// Publishes the coalesced invalidation for this refresh and updates flash
    /// flags. Returns the invalidated ids.
    ///
    /// A node flashes when its child count differs from the count seen at the
    /// previous flush. Nodes inserted since the last flush only record their
    /// count.
    pub fn flush(&mut self) -> Vec<NodeId> {
        for id in self.fresh.drain() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.observed_children = Some(node.children.len());
            }
        }

        let mut ids: Vec<NodeId> = self.dirty.drain().collect();
        ids.sort();
        ids.retain(|id| {
            let Some(node) = self.nodes.get_mut(id) else {
                return false;
            };
            let count = node.children.len();
            if node.observed_children.is_some_and(|seen| seen != count) {
                node.flash = true;
            }
            node.observed_children = Some(count);
            true
        });

        let roots = std::mem::take(&mut self.roots_dirty);
        if !ids.is_empty() || roots {
            self.publish(StoreEvent::Invalidated {
                ids: ids.clone(),
                roots,
            });
        }
        ids
    }

    /// Called by the consumer once the flash transition has finished.
    pub fn clear_flash(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.flash = false;
        }
    }

    /// Drops every node, pending retry, selection and hover.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.deferred.clear();
        self.dirty.clear();
        self.fresh.clear();
        self.selected = None;
        self.hovered = None;
        self.roots_dirty = true;
        self.publish(StoreEvent::Cleared);
    }

    // ---- user intents ----

    /// Selects `id` and expands every collapsed ancestor so it is visible.
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        let Some(id) = id else {
            self.selected = None;
            self.publish(StoreEvent::SelectionChanged { id: None });
            return true;
        };
        if !self.nodes.contains_key(&id) {
            return false;
        }

        self.selected = Some(id);
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            let Some(node) = self.nodes.get_mut(&ancestor) else {
                break;
            };
            if node.collapsed {
                node.collapsed = false;
                self.dirty.insert(ancestor);
            }
            current = node.parent;
        }

        self.publish(StoreEvent::SelectionChanged { id: Some(id) });
        true
    }

    pub fn hover(&mut self, id: Option<NodeId>) {
        let id = id.filter(|id| self.nodes.contains_key(id));
        if self.hovered != id {
            self.hovered = id;
            self.publish(StoreEvent::HoverChanged { id });
        }
    }

    pub fn toggle_collapse(&mut self, id: NodeId) -> bool {
        let Some(collapsed) = self.nodes.get(&id).map(|n| n.collapsed) else {
            return false;
        };
        self.set_collapsed(id, !collapsed)
    }

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        node.collapsed = collapsed;
        self.dirty.insert(id);
        true
    }

    // ---- listeners ----

    /// Source text of a listener's handler. Forwarded (`Bubble`) handlers
    /// resolve to the nearest ancestor component's listener for the same
    /// event, prefixed with a `// From parent` line per hop.
    pub fn resolve_handler(&self, id: NodeId, listener: &Listener) -> Option<String> {
        match &listener.handler {
            Handler::Source(source) => Some(source.clone()),
            Handler::Bubble => {
                let mut current = self.parent(id);
                while let Some(ancestor) = current {
                    let node = self.nodes.get(&ancestor)?;
                    if node.kind == NodeKind::Component {
                        break;
                    }
                    current = node.parent;
                }
                let component = self.nodes.get(&current?)?;
                let forwarded = component
                    .detail
                    .listeners()
                    .iter()
                    .find(|l| l.event == listener.event)?;
                let source = self.resolve_handler(component.id, forwarded)?;
                Some(format!("{FROM_PARENT_PREFIX}{source}"))
            }
        }
    }

    pub fn resolved_listeners(&self, id: NodeId) -> Vec<ResolvedListener> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        node.detail
            .listeners()
            .iter()
            .map(|listener| ResolvedListener {
                event: listener.event.clone(),
                handler: self.resolve_handler(id, listener),
                modifiers: listener.modifiers.to_vec(),
            })
            .collect()
    }
}

fn mark_bubbles(detail: &mut NodeDetail, marker: &str) {
    let Some(listeners) = detail.listeners_mut() else {
        return;
    };
    for listener in listeners {
        if matches!(&listener.handler, Handler::Source(source) if source.contains(marker)) {
            listener.handler = Handler::Bubble;
        }
    }
}
