//! Trace source abstraction.
//!
//! A source turns some backing store into a ready-to-query [`TraceData`].
//! Loading happens once, up front; everything after that is in memory.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use std::fmt::Debug;

use crate::data::TraceData;
use crate::error::IngestError;

/// Trait for loading a trace from various backends.
///
/// # Example
///
/// ```no_run
/// use trace_scrubber::{FileSource, TraceSource};
///
/// let mut source = FileSource::new("trace.json");
/// let trace = source.load().unwrap();
/// println!("{} events from {}", trace.len(), source.description());
/// ```
pub trait TraceSource: Debug {
    /// Read every event and build the sorted trace.
    fn load(&mut self) -> Result<TraceData, IngestError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
