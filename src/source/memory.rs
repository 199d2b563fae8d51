//! In-memory trace source.

use super::TraceSource;
use crate::data::{TraceData, TraceEvent};
use crate::error::IngestError;

/// A source backed by events already in memory.
///
/// Useful for embedding and tests. Events may be in any order; loading
/// sorts them the same way a file would be.
///
/// # Example
///
/// ```
/// use trace_scrubber::{MemorySource, TraceEvent, TraceSource};
///
/// let mut source = MemorySource::new(vec![TraceEvent::new(1.0, "Start")], "inline");
/// let trace = source.load().unwrap();
/// assert_eq!(trace.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    events: Vec<TraceEvent>,
    description: String,
}

impl MemorySource {
    pub fn new(events: Vec<TraceEvent>, source_description: &str) -> Self {
        Self {
            events,
            description: format!("memory: {}", source_description),
        }
    }
}

impl TraceSource for MemorySource {
    fn load(&mut self) -> Result<TraceData, IngestError> {
        if self.events.is_empty() {
            return Err(IngestError::Empty(self.description.clone()));
        }
        Ok(TraceData::from_events(self.events.clone()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
