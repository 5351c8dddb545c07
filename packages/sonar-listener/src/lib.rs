pub mod events;
pub mod lifecycle;
pub mod observer;
pub mod profiler;
pub mod serialize;
pub mod tracker;
pub mod version;

pub use events::HostEvent;
pub use lifecycle::{BlockDescriptor, BlockRegistration, BlockType};
pub use observer::classify;
pub use profiler::{FrameKind, FrameNode, ProfileFrame, Profiler, ResolvedFrame};
pub use serialize::clone_value;
pub use tracker::{CAPTURE_STATE_SINCE, Tracker, TrackerOptions};
pub use version::SemVer;
