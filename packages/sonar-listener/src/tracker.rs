use crate::profiler::{FrameKind, ProfileFrame, Profiler, ResolvedFrame};
use crate::version::SemVer;
use rustc_hash::FxHashMap;
use sonar_core::{
    ComponentHandle, DocumentHandle, DomHandle, DomNode, FrameHandle, HandleKey, HostValue,
    InsertOutcome, Listener, NodeData, NodeId, NodeKind, ShadowStore, StoreEvent, StoreOptions,
};
use sonar_scheduler::{Clock, LocalScheduler, Scheduler, SystemClock};
use std::rc::{Rc, Weak};

/// Framework version from which components expose `capture_state`.
pub const CAPTURE_STATE_SINCE: SemVer = SemVer::new(3, 19, 2);

#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub store: StoreOptions,
    pub capture_state_since: SemVer,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            store: StoreOptions::default(),
            capture_state_since: CAPTURE_STATE_SINCE,
        }
    }
}

/// The live host object behind a tracked node.
#[derive(Clone)]
pub(crate) enum Handle {
    Component(ComponentHandle),
    Dom(DomHandle),
    Block { ctx: HostValue, source: String },
    /// A component block mounted before its instance was registered.
    Placeholder,
}

/// Listeners added to one DOM node. The weak handle pins the allocation, so
/// the key cannot be handed to another node while the entry exists.
pub(crate) struct DomListeners {
    pub node: Weak<dyn DomNode>,
    pub listeners: Vec<Listener>,
}

impl DomListeners {
    pub fn is_live(&self) -> bool {
        self.node.strong_count() > 0
    }
}

#[derive(Clone)]
pub(crate) struct Entry {
    pub kind: NodeKind,
    pub tag_name: String,
    pub handle: Handle,
    /// Block that was mounting when this node was created.
    pub parent_block: Option<NodeId>,
}

/// Tracking context of one inspected page.
///
/// Owns the shadow tree plus every index the listener needs to map host
/// objects onto tracked ids. The host drives it through the lifecycle
/// interceptor (`mount_block`, `patch_block`, `detach_block`) and
/// [`Tracker::handle_event`], and calls [`Tracker::tick`] from its event loop.
pub struct Tracker {
    pub(crate) store: ShadowStore,
    pub(crate) entries: FxHashMap<NodeId, Entry>,
    pub(crate) by_handle: FxHashMap<HandleKey, NodeId>,
    /// Registered components whose block has not been mounted yet.
    pub(crate) pending_components: FxHashMap<HandleKey, (ComponentHandle, String)>,
    /// Component blocks waiting for their instance, keyed by fragment.
    pub(crate) placeholders: FxHashMap<HandleKey, NodeId>,
    pub(crate) each_groups: FxHashMap<(Option<NodeId>, String), NodeId>,
    pub(crate) dom_listeners: FxHashMap<HandleKey, DomListeners>,
    pub(crate) current_block: Option<NodeId>,
    pub(crate) last_promise_parent: Option<NodeId>,
    pub(crate) version: Option<SemVer>,
    capture_state_since: SemVer,
    pub(crate) profiler: Profiler,
    next_id: u64,
    attached: FxHashMap<HandleKey, DocumentHandle>,
    clock: Rc<dyn Clock>,
    pub(crate) scheduler: Rc<LocalScheduler<Tracker>>,
}

impl Tracker {
    pub fn new(options: TrackerOptions, clock: Rc<dyn Clock>) -> Self {
        Self {
            store: ShadowStore::new(options.store, clock.clone()),
            entries: FxHashMap::default(),
            by_handle: FxHashMap::default(),
            pending_components: FxHashMap::default(),
            placeholders: FxHashMap::default(),
            each_groups: FxHashMap::default(),
            dom_listeners: FxHashMap::default(),
            current_block: None,
            last_promise_parent: None,
            version: None,
            capture_state_since: options.capture_state_since,
            profiler: Profiler::default(),
            next_id: 0,
            attached: FxHashMap::default(),
            scheduler: Rc::new(LocalScheduler::with_clock(clock.clone())),
            clock,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrackerOptions::default(), Rc::new(SystemClock::new()))
    }

    pub fn store(&self) -> &ShadowStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ShadowStore {
        &mut self.store
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Framework version reported by the first block registration carrying one.
    pub fn version(&self) -> Option<SemVer> {
        self.version
    }

    pub(crate) fn uses_capture_state(&self) -> bool {
        self.version.is_some_and(|v| v >= self.capture_state_since)
    }

    /// Runs due listener work (bound re-checks, frame attach retries) and
    /// the store's deferred insertions. Returns true while anything is pending.
    pub fn tick(&mut self) -> bool {
        let scheduler = self.scheduler.clone();
        let listener_pending = scheduler.tick(self);
        let store_pending = self.store.tick();
        listener_pending || store_pending
    }

    // ---- handle lookups ----

    pub fn node_of(&self, dom: &DomHandle) -> Option<NodeId> {
        self.by_handle.get(&HandleKey::of(dom)).copied()
    }

    pub fn dom_node(&self, id: NodeId) -> Option<DomHandle> {
        match &self.entries.get(&id)?.handle {
            Handle::Dom(dom) => Some(dom.clone()),
            _ => None,
        }
    }

    pub fn component(&self, id: NodeId) -> Option<ComponentHandle> {
        match &self.entries.get(&id)?.handle {
            Handle::Component(component) => Some(component.clone()),
            _ => None,
        }
    }

    /// Context object of a tracked block.
    pub fn block_ctx(&self, id: NodeId) -> Option<HostValue> {
        match &self.entries.get(&id)?.handle {
            Handle::Block { ctx, .. } => Some(ctx.clone()),
            _ => None,
        }
    }

    pub fn is_tracked(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    // ---- attachment ----

    /// Starts accepting events from `document` and, recursively, from its
    /// frames. Frames whose document is not ready are retried every tick.
    pub fn attach(&mut self, document: &DocumentHandle) -> bool {
        let key = HandleKey::of(document);
        if self.attached.contains_key(&key) {
            return false;
        }
        self.attached.insert(key, document.clone());

        let frames = document.frames();
        tracing::info!("Listener attached ({} frame(s))", frames.len());
        for frame in frames {
            self.attach_frame(frame);
        }
        true
    }

    pub fn is_attached(&self, document: &DocumentHandle) -> bool {
        self.attached.contains_key(&HandleKey::of(document))
    }

    fn attach_frame(&mut self, frame: FrameHandle) {
        match frame.document() {
            Some(document) => {
                self.attach(&document);
            }
            None => {
                tracing::trace!("Frame document not ready, retrying");
                self.scheduler.schedule_timeout(
                    0.0,
                    Box::new(move |tracker: &mut Tracker| tracker.attach_frame(frame)),
                );
            }
        }
    }

    // ---- node bookkeeping ----

    pub(crate) fn allocate_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    /// The DOM target only becomes the parent when it was created by the same
    /// block as the node; otherwise the node hangs under its own block.
    pub(crate) fn resolve_parent(
        &self,
        target: Option<NodeId>,
        parent_block: Option<NodeId>,
    ) -> Option<NodeId> {
        match target.and_then(|t| self.entries.get(&t).map(|e| (t, e.parent_block))) {
            Some((target, target_block)) if target_block == parent_block => Some(target),
            _ => parent_block,
        }
    }

    /// Registers `entry` under `id` and inserts it into the store.
    pub(crate) fn add_node(
        &mut self,
        id: NodeId,
        entry: Entry,
        target: Option<NodeId>,
        anchor: Option<HandleKey>,
    ) -> InsertOutcome {
        let parent = self.resolve_parent(target, entry.parent_block);
        let anchor = anchor.and_then(|key| self.by_handle.get(&key).copied());

        if let Handle::Dom(dom) = &entry.handle {
            self.by_handle.insert(HandleKey::of(dom), id);
        }
        self.entries.insert(id, entry);

        match self.serialize(id) {
            Some(data) => self.store.insert(data, parent, anchor),
            None => InsertOutcome::AlreadyTracked,
        }
    }

    /// Removes `id` (and whatever the store cascades with it) from every index.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut gone = self.store.remove(id);
        if !gone.contains(&id) && self.entries.contains_key(&id) {
            gone.push(id);
        }

        for removed in &gone {
            let Some(entry) = self.entries.remove(removed) else {
                continue;
            };
            if let Handle::Dom(dom) = &entry.handle {
                let key = HandleKey::of(dom);
                self.by_handle.remove(&key);
                self.dom_listeners.remove(&key);
            }
        }
        self.each_groups.retain(|_, group| !gone.contains(group));
        self.placeholders.retain(|_, node| !gone.contains(node));
        gone
    }

    /// Re-serializes `id` and merges the result into the store.
    pub(crate) fn emit_update(&mut self, id: NodeId) -> bool {
        match self.serialize(id) {
            Some(data) => self.store.update(data),
            None => false,
        }
    }

    /// Re-reads the live handle of `id`, e.g. after state was injected.
    pub fn refresh(&mut self, id: NodeId) -> bool {
        self.emit_update(id)
    }

    /// Forgets every tracked node. Attachment, version and profile survive.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_handle.clear();
        self.pending_components.clear();
        self.placeholders.clear();
        self.each_groups.clear();
        self.dom_listeners.clear();
        self.current_block = None;
        self.last_promise_parent = None;
        self.store.clear();
    }

    pub(crate) fn serialize(&self, id: NodeId) -> Option<NodeData> {
        let entry = self.entries.get(&id)?;
        let detail = crate::serialize::serialize_detail(self, entry);
        Some(NodeData::new(id, entry.kind, entry.tag_name.clone()).with_detail(detail))
    }

    // ---- profiler ----

    pub fn start_profiler(&mut self) {
        let now = self.clock.now();
        self.profiler.start(now);
        tracing::debug!("Profiler started");
    }

    pub fn stop_profiler(&mut self) {
        let now = self.clock.now();
        self.profiler.stop(now);
        tracing::debug!("Profiler stopped");
    }

    pub fn is_profiling(&self) -> bool {
        self.profiler.is_running()
    }

    pub fn profile(&self) -> Option<&ProfileFrame> {
        self.profiler.top()
    }

    /// The top frame with node references resolved against the live tree.
    pub fn resolved_profile(&self) -> Option<ResolvedFrame> {
        self.profiler.top().map(|top| top.resolve(&self.store))
    }

    pub fn clear_profile(&mut self) {
        self.profiler.clear();
        self.store.publish(StoreEvent::ProfileUpdated);
    }

    /// Runs `f` inside a profiler frame. A plain call while not profiling.
    pub fn profiled<R>(
        &mut self,
        kind: FrameKind,
        node: Option<NodeId>,
        f: impl FnOnce(&mut Tracker) -> R,
    ) -> R {
        if !self.profiler.is_running() {
            return f(self);
        }

        let now = self.clock.now();
        self.profiler.enter(kind, node, now);
        let out = f(self);
        let now = self.clock.now();
        if self.profiler.exit(now) {
            self.store.publish(StoreEvent::ProfileUpdated);
        }
        out
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
