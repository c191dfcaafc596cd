//! Host Environment Abstraction
//!
//! Everything the storage selector learns about its surroundings comes
//! through [`HostEnvironment`]: whether the host is constrained, whether the
//! string-only bridge is reachable, how to ask for it, and when it becomes
//! ready.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   BackendSelector   │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   HostEnvironment   │  <-- Trait (injected)
//! └──────────┬──────────┘
//!            │ hub_storage()
//! ┌──────────▼──────────┐
//! │     HubStorage      │  <-- Trait (string-only)
//! └──────────┬──────────┘
//!     ┌──────┴──────┐
//!     │             │
//! ┌───▼───┐   ┌─────▼─────┐
//! │Memory │   │   File    │
//! │Bridge │   │  Bridge   │
//! └───────┘   └───────────┘
//! ```
//!
//! [`LocalHost`] is a process-backed host for native composition roots and
//! tests.

mod events;
mod file_bridge;
mod local;
mod memory_bridge;
mod traits;

pub use events::EventBus;
pub use file_bridge::FileHubStorage;
pub use local::LocalHost;
pub use memory_bridge::MemoryHubStorage;
pub use traits::{HostEnvironment, HubStorage};

/// Event the host emits once the bridge has been enabled
pub const DEFAULT_READY_EVENT: &str = "hubstorageupdated";

/// Option string sent with the enable request
pub const DEFAULT_ENABLE_REQUEST: &str = "+hubstorage";
