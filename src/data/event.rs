//! Trace events as delivered by the ingestion layer.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single structured record from a trace file.
///
/// Trace events carry a handful of well-known fields plus an open set of
/// attributes that depend on the event type. Events are immutable once
/// placed in a [`TraceData`](super::TraceData).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    /// Position in the time-sorted event sequence.
    pub index: usize,
    /// Parsed `Time` field, in seconds.
    pub time: f64,
    /// `Time` exactly as written in the trace.
    pub time_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date_time: String,
    pub severity: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Address of the process that emitted the event.
    pub machine: String,
    /// Role-change id (the `ID` field), when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Every other attribute, sorted by name.
    pub attrs: BTreeMap<String, String>,
}

impl TraceEvent {
    /// Create an event at `time` with the given type and no other fields.
    pub fn new(time: f64, event_type: impl Into<String>) -> Self {
        Self {
            index: 0,
            time,
            time_text: format!("{:.6}", time),
            date_time: String::new(),
            severity: String::new(),
            event_type: event_type.into(),
            machine: String::new(),
            id: None,
            attrs: BTreeMap::new(),
        }
    }

    /// Build an event from the flat name/value pairs of a trace record.
    ///
    /// Well-known fields are lifted out; everything else lands in `attrs`.
    /// An unparseable `Time` leaves the timestamp at zero.
    pub fn from_fields(fields: BTreeMap<String, String>) -> Self {
        let mut event = Self::new(0.0, String::new());
        event.time_text.clear();

        for (name, value) in fields {
            match name.as_str() {
                "Severity" => event.severity = value,
                "Time" => {
                    event.time = value.trim().parse().unwrap_or(0.0);
                    event.time_text = value;
                }
                "DateTime" => event.date_time = value,
                "Type" => event.event_type = value,
                "Machine" => event.machine = value,
                "ID" => event.id = Some(value).filter(|v| !v.is_empty()),
                _ => {
                    event.attrs.insert(name, value);
                }
            }
        }

        event
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = machine.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Deterministic `name=value` rendering of every field.
    ///
    /// Standard fields come first (`Time`, `Type`, `Severity`, `Machine`,
    /// `ID`, each only when non-empty), followed by all attributes in name
    /// order, separated by single spaces. Filters and searches match
    /// against this text.
    pub fn full_text(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5 + self.attrs.len());

        let standard = [
            ("Time", self.time_text.as_str()),
            ("Type", self.event_type.as_str()),
            ("Severity", self.severity.as_str()),
            ("Machine", self.machine.as_str()),
            ("ID", self.id.as_deref().unwrap_or("")),
        ];
        for (name, value) in standard {
            if !value.is_empty() {
                parts.push(format!("{}={}", name, value));
            }
        }

        for (name, value) in &self.attrs {
            parts.push(format!("{}={}", name, value));
        }

        parts.join(" ")
    }
}
