//! # trace-scrubber
//!
//! A timeline engine and CLI for exploring FoundationDB trace logs.
//!
//! A trace is loaded once into an immutable, time-sorted [`TraceData`].
//! From there the crate answers point-in-time questions: which database
//! configuration and recovery state were in effect, which processes held
//! which roles, and which events a filter or search picks out.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌─────────┐    ┌─────────────┐    ┌──────────────────────┐  │
//! │  │ source  │───▶│ data::trace │───▶│ cluster / filter /   │  │
//! │  │ (input) │    │ (TraceData) │    │ search (queries)     │  │
//! │  └─────────┘    └──────┬──────┘    └──────────┬───────────┘  │
//! │                        │                      │              │
//! │                        ▼                      ▼              │
//! │                  ┌──────────┐          ┌────────────┐        │
//! │                  │   app    │─────────▶│   report   │        │
//! │                  │ (reduce) │          │ (text/json)│        │
//! │                  └──────────┘          └────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Trace loading ([`TraceSource`] trait) from XML or JSON-lines files
//!   or memory
//! - **[`data`]**: The event store, address classification, topology replay,
//!   filtering and wildcard search
//! - **[`app`]**: Navigation state and the pure [`reduce`] function
//! - **[`keys`]**: Default key bindings onto [`Action`]s
//! - **[`report`]**: Point-in-time reports for printing or export
//! - **[`settings`]**: Layered runtime settings
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Report the cluster as of t=12.5s
//! trace-scrubber trace.json --at 12.5
//!
//! # First Severity=40 event in datacenter 1, exported as JSON
//! trace-scrubber trace.json --dc 1 --search 'Severity=40' --export report.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use trace_scrubber::{reduce, Action, AppState, MemorySource, TraceEvent, TraceSource};
//!
//! let events = vec![
//!     TraceEvent::new(0.0, "Role")
//!         .with_machine("2.0.1.0:1")
//!         .with_id("a1")
//!         .with_attr("As", "StorageServer")
//!         .with_attr("Transition", "Begin"),
//!     TraceEvent::new(1.0, "SlowTask").with_severity("30"),
//! ];
//! let trace = MemorySource::new(events, "doc").load().unwrap();
//!
//! let state = reduce(&AppState::default(), &trace, Action::NextSeverity("30".into()));
//! assert_eq!(state.cursor, 1);
//!
//! let topology = trace.topology(state.cursor);
//! assert_eq!(topology.datacenters["0"][0].roles_string(), "StorageServer");
//! ```

pub mod app;
pub mod data;
pub mod error;
pub mod keys;
pub mod report;
pub mod settings;
pub mod source;

// Re-export main types for convenience
pub use app::{reduce, Action, AppState};
pub use data::{
    classify, ClusterState, DbConfig, Direction, FilterConfig, FilterEdit, MachineClass,
    RecoveryState, SearchState, Topology, TraceData, TraceEvent, WildcardPattern, Worker,
};
pub use error::{IngestError, PatternError};
pub use report::Report;
pub use settings::Settings;
pub use source::{FileSource, MemorySource, TraceSource};
