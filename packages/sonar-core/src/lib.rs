pub mod events;
pub mod host;
pub mod navigation;
pub mod node;
pub mod search;
pub mod store;
pub mod value;

pub use events::{StoreEvent, SubscriptionId};
pub use host::{
    ComponentHandle, ComponentInstance, ComponentInternals, DocumentHandle, DocumentRoot,
    DomHandle, DomNode, DomNodeKind, EvalError, Evaluator, FrameHandle, FrameWindow, HandleKey,
    Rect,
};
pub use navigation::{NavKey, Visibility};
pub use node::{
    BlockDetail, ComponentDetail, ElementDetail, Entry, Handler, Listener, NodeData, NodeDetail,
    NodeId, NodeKind, PropEntry, TextDetail, TrackedNode,
};
pub use search::{DEFAULT_SEARCH_MIN_LEN, SearchCursor};
pub use store::{
    DEFAULT_BUBBLE_MARKER, DEFAULT_RETRY_DELAY_MS, FROM_PARENT_PREFIX, InsertOutcome,
    ResolvedListener, ShadowStore, StoreOptions,
};
pub use value::{HostFunction, HostValue};
