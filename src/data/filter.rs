//! Layered event filter.
//!
//! A filter has three categories that combine with AND:
//!
//! 1. **Time range**: the event timestamp lies in `[start, end]`.
//! 2. **Machine**: the event's address is selected, or its datacenter is.
//! 3. **Raw patterns**: the event's full text matches at least one
//!    wildcard pattern.
//!
//! Within a category the selections combine with OR, and an empty category
//! does not constrain anything. Two special cases sit on top:
//!
//! - **show-all** lets every event through while keeping the other
//!   categories around for when it is switched off again;
//! - with show-all off and nothing configured, *nothing* passes.

use std::collections::BTreeSet;

use tracing::warn;

use super::address::classify;
use super::event::TraceEvent;
use super::search::WildcardPattern;

/// Inclusive time window in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// A raw pattern as typed, plus its compiled form.
///
/// `compiled` is `None` when the pattern failed to compile; such a pattern
/// matches nothing.
#[derive(Debug, Clone, PartialEq)]
struct RawPattern {
    text: String,
    compiled: Option<WildcardPattern>,
}

impl RawPattern {
    fn new(text: String) -> Self {
        let compiled = match WildcardPattern::compile(&text) {
            Ok(p) => Some(p),
            Err(err) => {
                warn!("ignoring raw filter: {}", err);
                None
            }
        };
        Self { text, compiled }
    }

    fn matches(&self, full_text: &str) -> bool {
        self.compiled.as_ref().is_some_and(|p| p.is_match(full_text))
    }
}

/// An edit to the filter configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    ToggleShowAll,
    SetShowAll(bool),
    AddRawPattern(String),
    /// Remove the raw pattern at this position.
    RemoveRawPattern(usize),
    ToggleMachine(String),
    ToggleDatacenter(String),
    /// Select an address; selecting it again keeps it selected.
    SelectMachine(String),
    /// Select a datacenter id; selecting it again keeps it selected.
    SelectDatacenter(String),
    SetTimeRange(TimeRange),
    ClearTimeRange,
}

/// The filter configuration and its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    show_all: bool,
    raw_patterns: Vec<RawPattern>,
    machines: BTreeSet<String>,
    datacenters: BTreeSet<String>,
    time_range: Option<TimeRange>,
}

impl Default for FilterConfig {
    /// Shows every event.
    fn default() -> Self {
        Self {
            show_all: true,
            raw_patterns: Vec::new(),
            machines: BTreeSet::new(),
            datacenters: BTreeSet::new(),
            time_range: None,
        }
    }
}

impl FilterConfig {
    /// A filter with show-all off and no selections, which passes nothing
    /// until a category is configured.
    pub fn none() -> Self {
        Self {
            show_all: false,
            ..Self::default()
        }
    }

    pub fn with_raw_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.add_raw_pattern(pattern.into());
        self
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machines.insert(machine.into());
        self
    }

    pub fn with_datacenter(mut self, dc_id: impl Into<String>) -> Self {
        self.datacenters.insert(dc_id.into());
        self
    }

    pub fn with_time_range(mut self, start: f64, end: f64) -> Self {
        self.time_range = Some(TimeRange::new(start, end));
        self
    }

    /// Apply an edit.
    pub fn apply(&mut self, edit: FilterEdit) {
        match edit {
            FilterEdit::ToggleShowAll => self.show_all = !self.show_all,
            FilterEdit::SetShowAll(show_all) => self.show_all = show_all,
            FilterEdit::AddRawPattern(pattern) => self.add_raw_pattern(pattern),
            FilterEdit::RemoveRawPattern(index) => {
                self.remove_raw_pattern(index);
            }
            FilterEdit::ToggleMachine(machine) => toggle(&mut self.machines, machine),
            FilterEdit::ToggleDatacenter(dc_id) => toggle(&mut self.datacenters, dc_id),
            FilterEdit::SelectMachine(machine) => {
                self.machines.insert(machine);
            }
            FilterEdit::SelectDatacenter(dc_id) => {
                self.datacenters.insert(dc_id);
            }
            FilterEdit::SetTimeRange(range) => self.time_range = Some(range),
            FilterEdit::ClearTimeRange => self.time_range = None,
        }
    }

    /// Add a raw pattern. Empty patterns are ignored.
    pub fn add_raw_pattern(&mut self, pattern: String) {
        if !pattern.is_empty() {
            self.raw_patterns.push(RawPattern::new(pattern));
        }
    }

    /// Remove and return the raw pattern at `index`.
    pub fn remove_raw_pattern(&mut self, index: usize) -> Option<String> {
        (index < self.raw_patterns.len()).then(|| self.raw_patterns.remove(index).text)
    }

    pub fn is_show_all(&self) -> bool {
        self.show_all
    }

    pub fn raw_patterns(&self) -> impl Iterator<Item = &str> {
        self.raw_patterns.iter().map(|p| p.text.as_str())
    }

    pub fn machines(&self) -> &BTreeSet<String> {
        &self.machines
    }

    pub fn datacenters(&self) -> &BTreeSet<String> {
        &self.datacenters
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range
    }

    /// True if no category is configured.
    pub fn is_unconfigured(&self) -> bool {
        self.raw_patterns.is_empty()
            && self.machines.is_empty()
            && self.datacenters.is_empty()
            && self.time_range.is_none()
    }

    /// Decide whether `event` is visible under this filter.
    pub fn matches(&self, event: &TraceEvent) -> bool {
        if self.show_all {
            return true;
        }
        if self.is_unconfigured() {
            return false;
        }

        if let Some(range) = self.time_range {
            if !range.contains(event.time) {
                return false;
            }
        }

        if !self.machines.is_empty() || !self.datacenters.is_empty() {
            let selected = self.machines.contains(&event.machine)
                || classify(&event.machine)
                    .dc_id
                    .is_some_and(|dc| self.datacenters.contains(&dc));
            if !selected {
                return false;
            }
        }

        if !self.raw_patterns.is_empty() {
            let text = event.full_text();
            if !self.raw_patterns.iter().any(|p| p.matches(&text)) {
                return false;
            }
        }

        true
    }
}

fn toggle(set: &mut BTreeSet<String>, value: String) {
    if !set.remove(&value) {
        set.insert(value);
    }
}
