use serde::Serialize;
use sonar_core::{NodeDetail, NodeId, NodeKind, ResolvedListener, ShadowStore};
use sonar_listener::{ResolvedFrame, Tracker};

/// Receives tree snapshots, e.g. to forward them to an out-of-page UI.
pub trait DevBridge {
    fn send_snapshot(&self, snapshot: &TreeSnapshot);
}

/// One visible node with its visible descendants. Hidden nodes are skipped
/// and their children take their place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub tag_name: String,
    pub detail: NodeDetail,
    /// Listeners with forwarded handlers already resolved.
    pub listeners: Vec<ResolvedListener>,
    pub collapsed: bool,
    pub flash: bool,
    pub children: Vec<NodeView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub roots: Vec<NodeView>,
    pub selected: Option<NodeId>,
    pub hovered: Option<NodeId>,
    pub node_count: usize,
    pub version: Option<String>,
    pub profile: Option<ResolvedFrame>,
}

impl TreeSnapshot {
    pub fn capture(tracker: &Tracker) -> Self {
        let store = tracker.store();
        let mut roots = Vec::new();
        collect_views(store, store.roots(), &mut roots);
        Self {
            roots,
            selected: store.selected(),
            hovered: store.hovered(),
            node_count: store.len(),
            version: tracker.version().map(|v| v.to_string()),
            profile: tracker.resolved_profile(),
        }
    }
}

fn collect_views(store: &ShadowStore, ids: &[NodeId], out: &mut Vec<NodeView>) {
    for &id in ids {
        let Some(node) = store.get(id) else {
            continue;
        };
        if !store.visibility().is_visible(node.kind) {
            collect_views(store, &node.children, out);
            continue;
        }
        let mut children = Vec::new();
        collect_views(store, &node.children, &mut children);
        out.push(NodeView {
            id,
            kind: node.kind,
            tag_name: node.tag_name.clone(),
            detail: node.detail.clone(),
            listeners: store.resolved_listeners(id),
            collapsed: node.collapsed,
            flash: node.flash,
            children,
        });
    }
}
