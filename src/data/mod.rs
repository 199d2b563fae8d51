//! The trace model and the engines that query it.
//!
//! Everything here is synchronous and free of side effects once a
//! [`TraceData`] has been built.
//!
//! ## Submodules
//!
//! - [`event`]: The [`TraceEvent`] record and its full-text rendering
//! - [`snapshot`]: Configuration and recovery-state snapshots derived from events
//! - [`trace`]: The time-sorted [`TraceData`] store and its binary-search lookups
//! - [`address`]: Process address classification
//! - [`cluster`]: Topology replay from role transitions
//! - [`filter`]: The layered [`FilterConfig`] predicate
//! - [`search`]: Wildcard patterns and wrap-around search
//!
//! ## Data Flow
//!
//! ```text
//! trace lines
//!        │
//!        ▼
//! TraceData::from_events()
//!        │
//!        ├──▶ DbConfig / RecoveryState (derived indices)
//!        │
//!        └──▶ ClusterState::build(&events[..=cursor]) ──▶ Topology
//! ```

pub mod address;
pub mod cluster;
pub mod event;
pub mod filter;
pub mod search;
pub mod snapshot;
pub mod trace;

pub use address::{classify, AddressInfo, MachineClass};
pub use cluster::{ClusterState, RoleInfo, Topology, Transition, Worker};
pub use event::TraceEvent;
pub use filter::{FilterConfig, FilterEdit, TimeRange};
pub use search::{search_backward, search_forward, Direction, SearchState, WildcardPattern};
pub use snapshot::{DbConfig, RecoveryState};
pub use trace::TraceData;
