use crate::node::NodeId;
use serde::Serialize;
use slotmap::new_key_type;

new_key_type! {
    pub struct SubscriptionId;
}

/// Notifications published by the store to its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreEvent {
    Inserted {
        id: NodeId,
        parent: Option<NodeId>,
        anchor: Option<NodeId>,
    },
    /// The target was unknown; the node sits in the root list until the retry.
    Deferred {
        id: NodeId,
        target: NodeId,
    },
    Removed {
        id: NodeId,
        parent: Option<NodeId>,
    },
    Updated {
        id: NodeId,
    },
    /// Coalesced re-render signal, published once per flush.
    Invalidated {
        ids: Vec<NodeId>,
        roots: bool,
    },
    SelectionChanged {
        id: Option<NodeId>,
    },
    HoverChanged {
        id: Option<NodeId>,
    },
    ProfileUpdated,
    Cleared,
}
