//! Allocation state module.
//!
//! This module holds the persisted platform/host state, the merge of fresh
//! platform definitions into it, the state file, and the store that
//! reconciles subnet, IP and port assignments.

pub mod merge;
pub mod persist;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use merge::merge;
pub use persist::{to_pretty_json, StateFile, DEFAULT_STATE_PATH};
pub use store::{Assignment, SkippedPlatform, StateStore, UpdateReport};
pub use types::{GlobalState, HostState, PlatformState, PortKind, SERVER_ROLE};
