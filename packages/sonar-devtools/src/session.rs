use crate::bridge::{DevBridge, TreeSnapshot};
use crate::config::InspectorConfig;
use crate::edit::edit_expression;
use crate::error::{InspectError, PickError};
use crate::highlight::{HighlightSink, bounding_rect};
use crate::pick::{Pick, PickState};
use rustc_hash::FxHashMap;
use serde_json::Value;
use sonar_core::{
    ComponentHandle, DocumentHandle, DomHandle, Evaluator, HostValue, NavKey, NodeId, NodeKind,
    SearchCursor,
};
use sonar_listener::{HostEvent, ResolvedFrame, Tracker};
use sonar_scheduler::{Clock, SystemClock};
use std::fmt::Display;
use std::rc::Rc;

/// Live handle of the selected node, for host-side debugging access.
#[derive(Clone)]
pub enum InspectedHandle {
    Component(ComponentHandle),
    Dom(DomHandle),
    Block(HostValue),
}

/// One inspector attached to one page.
///
/// Wraps the [`Tracker`] (which the host feeds) and implements the commands
/// the UI issues: selection, hover, collapse, navigation, search, pick,
/// profiling and state injection.
pub struct Inspector {
    tracker: Tracker,
    config: InspectorConfig,
    evaluator: Option<Box<dyn Evaluator>>,
    highlight: Option<Box<dyn HighlightSink>>,
    bridge: Option<Box<dyn DevBridge>>,
    pick: Option<PickState>,
    search: Option<SearchCursor>,
    edit_errors: FxHashMap<(NodeId, String), String>,
    inspected: Option<InspectedHandle>,
    ui_failed: bool,
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(config: InspectorConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            tracker: Tracker::new(config.tracker_options(), clock),
            config,
            evaluator: None,
            highlight: None,
            bridge: None,
            pick: None,
            search: None,
            edit_errors: FxHashMap::default(),
            inspected: None,
            ui_failed: false,
        }
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        self.evaluator = Some(evaluator);
    }

    pub fn set_highlight(&mut self, sink: Box<dyn HighlightSink>) {
        self.highlight = Some(sink);
    }

    pub fn set_bridge(&mut self, bridge: Box<dyn DevBridge>) {
        self.bridge = Some(bridge);
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The host drives block mount/patch/detach through this.
    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    // ---- host side ----

    pub fn attach(&mut self, document: &DocumentHandle) -> bool {
        self.tracker.attach(document)
    }

    pub fn dispatch(&mut self, source: &DocumentHandle, event: HostEvent) -> bool {
        self.tracker.dispatch(source, event)
    }

    pub fn tick(&mut self) -> bool {
        self.tracker.tick()
    }

    /// Ends a refresh: publishes the coalesced invalidation and pushes a
    /// snapshot to the bridge. Returns the nodes that started flashing.
    pub fn flush(&mut self) -> Vec<NodeId> {
        let flashed = self.tracker.store_mut().flush();
        if let Some(bridge) = &self.bridge {
            bridge.send_snapshot(&TreeSnapshot::capture(&self.tracker));
        }
        flashed
    }

    /// Opens the inspector window. A failure is logged once; tracking
    /// carries on either way.
    pub fn open_ui<E: Display>(&mut self, open: impl FnOnce() -> Result<(), E>) -> bool {
        match open() {
            Ok(()) => true,
            Err(err) => {
                if !self.ui_failed {
                    tracing::error!("Failed to open inspector window: {}", err);
                    self.ui_failed = true;
                }
                false
            }
        }
    }

    // ---- tree commands ----

    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        let selected = self.tracker.store_mut().select(id);
        if selected {
            self.set_selected(id);
        }
        selected
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.tracker.store().selected()
    }

    /// Hovers `id` and highlights its box; `None` hides the highlight.
    pub fn hover(&mut self, id: Option<NodeId>) {
        self.tracker.store_mut().hover(id);
        let hovered = self.tracker.store().hovered();
        let rect = hovered.and_then(|id| bounding_rect(&self.tracker, id).map(|r| (id, r)));
        let Some(sink) = self.highlight.as_mut() else {
            return;
        };
        match rect {
            Some((id, rect)) => {
                let label = self
                    .tracker
                    .store()
                    .get(id)
                    .map(|n| n.tag_name.clone())
                    .unwrap_or_default();
                sink.show(rect, &label);
            }
            None => sink.hide(),
        }
    }

    pub fn toggle_collapse(&mut self, id: NodeId) -> bool {
        self.tracker.store_mut().toggle_collapse(id)
    }

    pub fn navigate(&mut self, key: NavKey) -> Option<NodeId> {
        let before = self.selected();
        let after = self.tracker.store_mut().navigate(key);
        if after != before {
            self.set_selected(after);
        }
        after
    }

    pub fn set_visible(&mut self, kind: NodeKind, visible: bool) {
        self.tracker.store_mut().set_visible(kind, visible);
    }

    // ---- search ----

    /// Starts a search and selects the first result.
    pub fn search(&mut self, query: &str) -> Vec<NodeId> {
        let cursor = SearchCursor::new(self.tracker.store(), query, self.config.search_min_len);
        let results = cursor.results().to_vec();
        self.search = Some(cursor);
        self.search_next();
        results
    }

    pub fn search_next(&mut self) -> Option<NodeId> {
        let id = self.search.as_mut()?.next()?;
        self.select(Some(id));
        Some(id)
    }

    pub fn search_prev(&mut self) -> Option<NodeId> {
        let id = self.search.as_mut()?.prev()?;
        self.select(Some(id));
        Some(id)
    }

    pub fn search_cursor(&self) -> Option<&SearchCursor> {
        self.search.as_ref()
    }

    // ---- pick ----

    /// Starts picking an element on the page. Any pick in flight is
    /// cancelled first.
    pub fn pick(&mut self) -> Pick {
        self.cancel_pick();
        let (state, pick) = PickState::new();
        self.pick = Some(state);
        tracing::debug!("Pick started");
        pick
    }

    pub fn is_picking(&self) -> bool {
        self.pick.is_some()
    }

    /// Pointer moved over `element` while picking.
    pub fn pointer_move(&mut self, element: &DomHandle) {
        let Some(pick) = self.pick.as_mut() else {
            return;
        };
        pick.hovered = Some(element.clone());
        if let (Some(sink), Some(rect)) = (self.highlight.as_mut(), element.layout_rect()) {
            sink.show(rect, &element.node_name().to_lowercase());
        }
    }

    /// Finishes the pick with the last hovered element. The picked node is
    /// selected.
    pub fn click(&mut self) -> Option<NodeId> {
        let pick = self.pick.take()?;
        self.hide_highlight();
        let picked = pick
            .hovered
            .as_ref()
            .and_then(|element| self.tracker.node_of(element));
        match picked {
            Some(id) => {
                pick.resolve(Ok(id));
                self.select(Some(id));
            }
            None => pick.resolve(Err(PickError::Untracked)),
        }
        picked
    }

    pub fn cancel_pick(&mut self) {
        if let Some(pick) = self.pick.take() {
            pick.resolve(Err(PickError::Cancelled));
            self.hide_highlight();
            tracing::debug!("Pick cancelled");
        }
    }

    fn hide_highlight(&mut self) {
        if let Some(sink) = self.highlight.as_mut() {
            sink.hide();
        }
    }

    // ---- profiler ----

    pub fn start_profiler(&mut self) {
        self.tracker.start_profiler();
    }

    pub fn stop_profiler(&mut self) {
        self.tracker.stop_profiler();
    }

    pub fn profile(&self) -> Option<ResolvedFrame> {
        self.tracker.resolved_profile()
    }

    pub fn clear_profile(&mut self) {
        self.tracker.clear_profile();
    }

    // ---- state injection ----

    /// Evaluates `expr` in the page and assigns the result to `key` on the
    /// component `id`.
    ///
    /// Failures are recorded against `(id, key)` as the first line of the
    /// message; a later success for the same key clears it.
    pub fn inject_state(&mut self, id: NodeId, key: &str, expr: &str) -> Result<(), InspectError> {
        if !self.config.capabilities.code_execution {
            return Err(InspectError::CodeExecutionDisabled);
        }
        let component = self.component(id)?;
        let evaluator = self.evaluator.as_ref().ok_or(InspectError::NoEvaluator)?;

        let result = evaluator
            .eval(expr)
            .and_then(|value| component.inject_state(key, value));
        let slot = (id, key.to_string());
        match result {
            Ok(()) => {
                self.edit_errors.remove(&slot);
                self.tracker.refresh(id);
                Ok(())
            }
            Err(err) => {
                tracing::debug!("Injecting {} on {} failed: {}", key, id, err);
                self.edit_errors.insert(slot, err.first_line());
                Err(err.into())
            }
        }
    }

    /// Sets the leaf at `path` inside the value of `key` and injects the
    /// whole updated value.
    pub fn edit_value(
        &mut self,
        id: NodeId,
        key: &str,
        path: &[String],
        leaf: Value,
    ) -> Result<(), InspectError> {
        let node = self
            .tracker
            .store()
            .get(id)
            .ok_or(InspectError::UnknownNode(id))?;
        let invalid = || InspectError::InvalidPath {
            node: id,
            path: std::iter::once(key)
                .chain(path.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join("."),
        };
        let current = node.detail.value_of(key).ok_or_else(invalid)?;
        let expr = edit_expression(current, path, leaf).ok_or_else(invalid)?;
        self.inject_state(id, key, &expr)
    }

    /// Last injection error recorded for `key` on `id`.
    pub fn edit_error(&self, id: NodeId, key: &str) -> Option<&str> {
        self.edit_errors
            .get(&(id, key.to_string()))
            .map(String::as_str)
    }

    fn component(&self, id: NodeId) -> Result<ComponentHandle, InspectError> {
        if !self.tracker.is_tracked(id) {
            return Err(InspectError::UnknownNode(id));
        }
        self.tracker
            .component(id)
            .ok_or(InspectError::NotAComponent(id))
    }

    // ---- inspection ----

    /// Logs and returns the serialized detail of `id`.
    pub fn inspect(&self, id: NodeId) -> Option<Value> {
        let node = self.tracker.store().get(id)?;
        let detail = serde_json::to_value(&node.detail).unwrap_or(Value::Null);
        tracing::info!("{} <{}>: {}", id, node.tag_name, detail);
        Some(detail)
    }

    /// Records the live handle behind `id` as the inspected object.
    pub fn set_selected(&mut self, id: Option<NodeId>) {
        self.inspected = id.and_then(|id| {
            if let Some(component) = self.tracker.component(id) {
                return Some(InspectedHandle::Component(component));
            }
            if let Some(dom) = self.tracker.dom_node(id) {
                return Some(InspectedHandle::Dom(dom));
            }
            self.tracker.block_ctx(id).map(InspectedHandle::Block)
        });
    }

    pub fn inspected(&self) -> Option<&InspectedHandle> {
        self.inspected.as_ref()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(&self.tracker)
    }

    pub fn export_state(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }

    /// Drops the tree, selection, hover, search and any pick in flight.
    pub fn clear(&mut self) {
        self.cancel_pick();
        self.search = None;
        self.inspected = None;
        self.edit_errors.clear();
        self.tracker.clear();
    }
}
