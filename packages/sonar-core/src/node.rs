use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Component,
    Element,
    Text,
    Anchor,
    Block,
    Iteration,
    Slot,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Component,
        NodeKind::Element,
        NodeKind::Text,
        NodeKind::Anchor,
        NodeKind::Block,
        NodeKind::Iteration,
        NodeKind::Slot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Component => "component",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Anchor => "anchor",
            NodeKind::Block => "block",
            NodeKind::Iteration => "iteration",
            NodeKind::Slot => "slot",
        }
    }
}

/// Handler attached to a listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Handler {
    Source(String),
    /// Re-dispatches to the nearest ancestor component's listener for the
    /// same event. Resolved on read, see `ShadowStore::resolve_handler`.
    Bubble,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listener {
    pub event: String,
    pub handler: Handler,
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub modifiers: SmallVec<[String; 2]>,
}

impl Listener {
    pub fn new(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handler: Handler::Source(handler.into()),
            modifiers: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropEntry {
    pub key: String,
    pub value: Value,
    pub is_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComponentDetail {
    pub attributes: Vec<PropEntry>,
    pub listeners: Vec<Listener>,
    pub ctx: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ElementDetail {
    pub attributes: Vec<Entry>,
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDetail {
    pub node_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BlockDetail {
    pub ctx: Vec<Entry>,
    pub source: String,
}

/// Render-safe, type-specific payload of a tracked node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum NodeDetail {
    #[default]
    Empty,
    Component(ComponentDetail),
    Element(ElementDetail),
    Text(TextDetail),
    Block(BlockDetail),
}

impl NodeDetail {
    pub fn listeners(&self) -> &[Listener] {
        match self {
            NodeDetail::Component(c) => &c.listeners,
            NodeDetail::Element(e) => &e.listeners,
            _ => &[],
        }
    }

    pub(crate) fn listeners_mut(&mut self) -> Option<&mut Vec<Listener>> {
        match self {
            NodeDetail::Component(c) => Some(&mut c.listeners),
            NodeDetail::Element(e) => Some(&mut e.listeners),
            _ => None,
        }
    }

    /// Current serialized value of an editable key (prop or state entry).
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        match self {
            NodeDetail::Component(c) => c
                .attributes
                .iter()
                .find(|a| a.key == key)
                .map(|a| &a.value)
                .or_else(|| c.ctx.iter().find(|e| e.key == key).map(|e| &e.value)),
            NodeDetail::Block(b) => b.ctx.iter().find(|e| e.key == key).map(|e| &e.value),
            _ => None,
        }
    }
}

/// A serialized node as produced by the listener: everything but tree links.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub tag_name: String,
    pub detail: NodeDetail,
}

impl NodeData {
    pub fn new(id: NodeId, kind: NodeKind, tag_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            tag_name: tag_name.into(),
            detail: NodeDetail::Empty,
        }
    }

    pub fn with_detail(mut self, detail: NodeDetail) -> Self {
        self.detail = detail;
        self
    }
}

/// One entry in the shadow tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub tag_name: String,
    pub detail: NodeDetail,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    pub collapsed: bool,
    pub flash: bool,
    /// Child count seen at the last refresh; `None` until the first one.
    #[serde(skip)]
    pub(crate) observed_children: Option<usize>,
}

impl TrackedNode {
    pub(crate) fn from_data(data: NodeData) -> Self {
        Self {
            id: data.id,
            kind: data.kind,
            tag_name: data.tag_name,
            detail: data.detail,
            parent: None,
            children: SmallVec::new(),
            collapsed: true,
            flash: false,
            observed_children: None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
