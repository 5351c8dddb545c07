pub mod bridge;
pub mod config;
pub mod edit;
pub mod error;
pub mod highlight;
pub mod pick;
pub mod session;

pub use bridge::{DevBridge, NodeView, TreeSnapshot};
pub use config::{Capabilities, InspectorConfig};
pub use error::{ConfigError, InspectError, PickError};
pub use highlight::{HighlightSink, bounding_rect};
pub use pick::Pick;
pub use session::{InspectedHandle, Inspector};
