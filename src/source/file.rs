//! File-based trace source.
//!
//! Reads either trace format the trace writer emits: XML (the default, one
//! `<Event .../>` element per event with every field as an attribute) or
//! JSON lines (`--trace_format json`, one flat object per line). The format
//! is picked from the first non-blank character of the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::TraceSource;
use crate::data::{TraceData, TraceEvent};
use crate::error::IngestError;

/// A source that reads a trace file from disk.
///
/// In JSON-lines files, blank lines are ignored and lines that are not a
/// JSON object are skipped and counted. In XML files, `Event` elements with
/// bad attributes are skipped and counted, and reading stops at the first
/// syntax error, keeping every event before it; a trace still being
/// written usually ends mid-element. See [`skipped_lines`](Self::skipped_lines).
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    skipped_lines: usize,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            skipped_lines: 0,
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of malformed lines or elements skipped by the last load.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    fn parse(&mut self, content: &str) -> Vec<TraceEvent> {
        self.skipped_lines = 0;
        let body = content.trim_start_matches('\u{feff}').trim_start();
        if body.starts_with('<') {
            self.parse_xml(body)
        } else {
            self.parse_json_lines(content)
        }
    }

    fn parse_xml(&mut self, content: &str) -> Vec<TraceEvent> {
        let mut reader = Reader::from_str(content);
        let mut events = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Event" =>
                {
                    match attributes(&e) {
                        Ok(fields) => events.push(TraceEvent::from_fields(fields)),
                        Err(err) => {
                            self.skipped_lines += 1;
                            debug!(
                                position = reader.buffer_position(),
                                "bad event attributes: {}",
                                err
                            );
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    self.skipped_lines += 1;
                    warn!(
                        position = reader.buffer_position(),
                        events = events.len(),
                        "stopped reading XML trace: {}",
                        err
                    );
                    break;
                }
            }
        }

        events
    }

    fn parse_json_lines(&mut self, content: &str) -> Vec<TraceEvent> {
        let mut events = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Map<String, Value>>(line) {
                Ok(object) => events.push(TraceEvent::from_fields(flatten(object))),
                Err(e) => {
                    self.skipped_lines += 1;
                    debug!(line = line_no + 1, "unparseable trace line: {}", e);
                }
            }
        }

        events
    }
}

/// Collect an `Event` element's attributes, unescaped.
fn attributes(element: &BytesStart<'_>) -> Result<BTreeMap<String, String>, quick_xml::Error> {
    let mut fields = BTreeMap::new();
    for attr in element.attributes() {
        let attr = attr?;
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Convert a JSON object into name/value strings.
///
/// Trace writers emit every field as a string; anything else is kept in
/// its JSON spelling.
fn flatten(object: Map<String, Value>) -> BTreeMap<String, String> {
    object
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect()
}

impl TraceSource for FileSource {
    fn load(&mut self) -> Result<TraceData, IngestError> {
        let content = fs::read_to_string(&self.path).map_err(|source| IngestError::Io {
            path: self.path.clone(),
            source,
        })?;

        let events = self.parse(&content);
        if self.skipped_lines > 0 {
            warn!(
                skipped = self.skipped_lines,
                "skipped malformed lines in {}",
                self.path.display()
            );
        }
        if events.is_empty() {
            return Err(IngestError::Empty(self.path.display().to_string()));
        }

        info!(events = events.len(), "read {}", self.path.display());
        Ok(TraceData::from_events(events))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
