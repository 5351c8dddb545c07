use crate::tracker::Tracker;
use sonar_core::{ComponentHandle, DocumentHandle, DomHandle};

/// Notifications the framework dispatches on a document. Block lifecycle is
/// not here; it goes through the interceptor calls on [`Tracker`].
pub enum HostEvent {
    RegisterComponent {
        component: ComponentHandle,
        tag_name: String,
    },
    DomInsert {
        node: DomHandle,
        target: Option<DomHandle>,
        anchor: Option<DomHandle>,
    },
    DomRemove {
        node: DomHandle,
    },
    DomAddListener {
        node: DomHandle,
        event: String,
        handler: String,
        modifiers: Vec<String>,
    },
    DomRemoveListener {
        node: DomHandle,
        event: String,
        handler: String,
        modifiers: Vec<String>,
    },
    DomSetData {
        node: DomHandle,
    },
    DomSetProperty {
        node: DomHandle,
    },
    DomSetAttribute {
        node: DomHandle,
    },
    DomRemoveAttribute {
        node: DomHandle,
    },
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::RegisterComponent { .. } => "register-component",
            HostEvent::DomInsert { .. } => "dom-insert",
            HostEvent::DomRemove { .. } => "dom-remove",
            HostEvent::DomAddListener { .. } => "dom-add-listener",
            HostEvent::DomRemoveListener { .. } => "dom-remove-listener",
            HostEvent::DomSetData { .. } => "dom-set-data",
            HostEvent::DomSetProperty { .. } => "dom-set-property",
            HostEvent::DomSetAttribute { .. } => "dom-set-attribute",
            HostEvent::DomRemoveAttribute { .. } => "dom-remove-attribute",
        }
    }
}

impl Tracker {
    /// Handles an event raised on `source`. Events from documents the
    /// tracker is not attached to are ignored.
    pub fn dispatch(&mut self, source: &DocumentHandle, event: HostEvent) -> bool {
        if !self.is_attached(source) {
            tracing::trace!("Ignoring {} from an unattached document", event.name());
            return false;
        }
        self.handle_event(event);
        true
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        tracing::trace!("Handling {}", event.name());
        match event {
            HostEvent::RegisterComponent {
                component,
                tag_name,
            } => self.register_component(component, tag_name),
            HostEvent::DomInsert {
                node,
                target,
                anchor,
            } => self.dom_insert(&node, target.as_ref(), anchor.as_ref()),
            HostEvent::DomRemove { node } => self.dom_remove(&node),
            HostEvent::DomAddListener {
                node,
                event,
                handler,
                modifiers,
            } => self.dom_add_listener(&node, event, handler, modifiers),
            HostEvent::DomRemoveListener {
                node,
                event,
                handler,
                modifiers,
            } => self.dom_remove_listener(&node, &event, &handler, &modifiers),
            HostEvent::DomSetData { node }
            | HostEvent::DomSetProperty { node }
            | HostEvent::DomSetAttribute { node }
            | HostEvent::DomRemoveAttribute { node } => self.dom_update(&node),
        }
    }
}
