//! Conversion of host values and tracked handles into render-safe details.

use crate::tracker::{Entry, Handle, Tracker};
use rustc_hash::FxHashSet;
use serde_json::{Map, Value, json};
use sonar_core::node::Entry as DetailEntry;
use sonar_core::{
    BlockDetail, ComponentDetail, ComponentHandle, DomHandle, ElementDetail, HostValue,
    Listener, NodeDetail, NodeKind, PropEntry, TextDetail,
};

/// Deep-copies a host value into JSON.
///
/// Functions and symbols become descriptor objects, the global object becomes
/// `null`, and a container already visited on the current walk becomes `{}`.
/// Undefined object entries are dropped; undefined array items become `null`.
pub fn clone_value(value: &HostValue) -> Value {
    let mut seen = FxHashSet::default();
    clone_inner(value, &mut seen).unwrap_or(Value::Null)
}

fn clone_inner(value: &HostValue, seen: &mut FxHashSet<usize>) -> Option<Value> {
    let cloned = match value {
        HostValue::Undefined => return None,
        HostValue::Null | HostValue::Global => Value::Null,
        HostValue::Bool(b) => Value::Bool(*b),
        HostValue::Number(n) => number(*n),
        HostValue::String(s) => Value::String(s.clone()),
        HostValue::Function(f) => json!({
            "isFunction": true,
            "source": f.source,
            "name": f.name,
        }),
        HostValue::Symbol(name) => json!({ "isSymbol": true, "name": name }),
        HostValue::Array(items) => {
            if !seen.insert(identity_of(value)) {
                return Some(Value::Object(Map::new()));
            }
            let items = items.borrow();
            Value::Array(
                items
                    .iter()
                    .map(|item| clone_inner(item, seen).unwrap_or(Value::Null))
                    .collect(),
            )
        }
        HostValue::Object(entries) => {
            if !seen.insert(identity_of(value)) {
                return Some(Value::Object(Map::new()));
            }
            let entries = entries.borrow();
            let mut map = Map::new();
            for (key, item) in entries.iter() {
                if let Some(item) = clone_inner(item, seen) {
                    map.insert(key.clone(), item);
                }
            }
            Value::Object(map)
        }
    };
    Some(cloned)
}

fn identity_of(value: &HostValue) -> usize {
    value.identity().unwrap_or_default()
}

/// Integral numbers stay integers; NaN and infinities are nulled.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Key/value entries of a JSON object or array, in order.
pub fn entries_of(value: Value) -> Vec<DetailEntry> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| DetailEntry { key, value })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, value)| DetailEntry {
                key: index.to_string(),
                value,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Excerpt of a block's source: the first `{` through the first `}`. A
/// missing brace counts as the start of the text; reversed braces yield the
/// text between them.
pub fn source_excerpt(source: &str) -> String {
    let open = source.find('{').unwrap_or(0);
    let close = source.find('}').map_or(0, |i| i + 1);
    source[open.min(close)..open.max(close)].to_string()
}

pub(crate) fn serialize_detail(tracker: &Tracker, entry: &Entry) -> NodeDetail {
    match &entry.handle {
        Handle::Component(component) => component_detail(component, tracker.uses_capture_state()),
        Handle::Placeholder => NodeDetail::Empty,
        Handle::Dom(dom) if entry.kind == NodeKind::Element => {
            element_detail(dom, tracker.listeners_of(dom).to_vec())
        }
        Handle::Dom(dom) => NodeDetail::Text(TextDetail {
            node_value: dom.node_value(),
        }),
        Handle::Block { ctx, source } => NodeDetail::Block(BlockDetail {
            ctx: entries_of(clone_value(ctx)),
            source: source_excerpt(source),
        }),
    }
}

fn component_detail(component: &ComponentHandle, use_capture_state: bool) -> NodeDetail {
    let Some(internals) = component.internals() else {
        return NodeDetail::Component(ComponentDetail::default());
    };

    let state = use_capture_state
        .then(|| component.capture_state())
        .flatten()
        .unwrap_or_else(|| internals.ctx.clone());
    let mut ctx = match clone_value(&state) {
        Value::Object(map) => map,
        other => entries_of(other)
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect(),
    };

    let attributes = internals
        .props
        .iter()
        .filter_map(|key| {
            let value = ctx.shift_remove(key)?;
            Some(PropEntry {
                key: key.clone(),
                value,
                is_bound: internals.bound.contains(key),
            })
        })
        .collect();

    let listeners = internals
        .callbacks
        .iter()
        .flat_map(|(event, handlers)| {
            handlers
                .iter()
                .map(move |handler| Listener::new(event.clone(), handler.clone()))
        })
        .collect();

    NodeDetail::Component(ComponentDetail {
        attributes,
        listeners,
        ctx: entries_of(Value::Object(ctx)),
    })
}

fn element_detail(dom: &DomHandle, listeners: Vec<Listener>) -> NodeDetail {
    NodeDetail::Element(ElementDetail {
        attributes: dom
            .attributes()
            .into_iter()
            .map(|(key, value)| DetailEntry {
                key,
                value: Value::String(value),
            })
            .collect(),
        listeners,
    })
}
