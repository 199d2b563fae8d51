//! Application state and navigation logic.
//!
//! All navigation goes through [`reduce`], which takes the current state
//! and an [`Action`] and returns the next state without touching the trace.
//! When an action has no target (no later recovery, no visible event, a
//! page jump off the end) the state comes back unchanged.

use tracing::debug;

use crate::data::{Direction, FilterConfig, FilterEdit, SearchState, TraceData, TraceEvent};
use crate::settings::Settings;

/// Everything a front end needs to remember between inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Index of the current event.
    pub cursor: usize,
    pub filter: FilterConfig,
    pub search: SearchState,
    /// Seconds moved by a page jump.
    pub page_seconds: f64,
    /// Status code that marks the start of a recovery.
    pub recovery_start_status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AppState {
    /// Create a state at the first event, showing everything.
    pub fn new(settings: &Settings) -> Self {
        Self {
            cursor: 0,
            filter: FilterConfig::default(),
            search: SearchState::default(),
            page_seconds: settings.page_seconds,
            recovery_start_status: settings.recovery_start_status.clone(),
        }
    }

    /// Timestamp of the current event, if the trace has one there.
    pub fn current_time(&self, trace: &TraceData) -> Option<f64> {
        trace.get(self.cursor).map(|e| e.time)
    }
}

/// A user input, decoupled from how it was entered.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Next visible event.
    NextEvent,
    /// Previous visible event.
    PrevEvent,
    /// First visible event.
    First,
    /// Last visible event.
    Last,
    PageForward,
    PageBackward,
    /// Nearest visible event to a timestamp.
    JumpToTime(f64),
    /// Nearest visible event at or after an index.
    JumpToIndex(usize),
    /// Previous recovery state of any status.
    PrevRecovery,
    /// Next recovery state of any status.
    NextRecovery,
    /// Previous recovery start.
    PrevRecoveryStart,
    /// Next recovery start.
    NextRecoveryStart,
    /// Previous visible event with this severity.
    PrevSeverity(String),
    /// Next visible event with this severity.
    NextSeverity(String),
    Search {
        pattern: String,
        direction: Direction,
    },
    /// Repeat the last search in its own direction.
    SearchNext,
    /// Repeat the last search in the opposite direction.
    SearchPrev,
    ClearSearch,
    Filter(FilterEdit),
}

/// Compute the state that follows `action`.
pub fn reduce(state: &AppState, trace: &TraceData, action: Action) -> AppState {
    let mut next = state.clone();
    let cursor = state.cursor;
    let filter = &state.filter;

    let target = match action {
        Action::NextEvent => cursor
            .checked_add(1)
            .and_then(|start| next_visible(trace, filter, start, |_| true)),
        Action::PrevEvent => cursor
            .checked_sub(1)
            .and_then(|start| prev_visible(trace, filter, start, |_| true)),
        Action::First => next_visible(trace, filter, 0, |_| true),
        Action::Last => trace
            .len()
            .checked_sub(1)
            .and_then(|last| prev_visible(trace, filter, last, |_| true)),
        Action::PageForward => state.current_time(trace).and_then(|now| {
            let to = now + state.page_seconds;
            (to <= trace.max_time())
                .then(|| trace.index_at_time(to))
                .flatten()
                .and_then(|idx| next_visible(trace, filter, idx, |_| true))
        }),
        Action::PageBackward => state.current_time(trace).and_then(|now| {
            let to = now - state.page_seconds;
            (to >= trace.min_time())
                .then(|| trace.index_at_time(to))
                .flatten()
                .and_then(|idx| prev_visible(trace, filter, idx, |_| true))
        }),
        Action::JumpToTime(time) => {
            if time < trace.min_time() || time > trace.max_time() {
                debug!(time, "time outside trace range");
                None
            } else {
                trace.index_at_time(time).and_then(|idx| nearest_visible(trace, filter, idx))
            }
        }
        Action::JumpToIndex(index) => {
            (index < trace.len()).then(|| nearest_visible(trace, filter, index)).flatten()
        }
        Action::PrevRecovery => trace.previous_recovery(cursor).map(|r| r.event_index),
        Action::NextRecovery => trace.next_recovery(cursor).map(|r| r.event_index),
        Action::PrevRecoveryStart => trace
            .previous_recovery_with_status(cursor, &state.recovery_start_status)
            .map(|r| r.event_index),
        Action::NextRecoveryStart => trace
            .next_recovery_with_status(cursor, &state.recovery_start_status)
            .map(|r| r.event_index),
        Action::PrevSeverity(severity) => cursor
            .checked_sub(1)
            .and_then(|start| prev_visible(trace, filter, start, |e| e.severity == severity)),
        Action::NextSeverity(severity) => cursor
            .checked_add(1)
            .and_then(|start| next_visible(trace, filter, start, |e| e.severity == severity)),
        Action::Search { pattern, direction } => {
            next.search.begin(trace.events(), cursor, &pattern, direction, filter)
        }
        Action::SearchNext => state.search.repeat(trace.events(), cursor, false, filter),
        Action::SearchPrev => state.search.repeat(trace.events(), cursor, true, filter),
        Action::ClearSearch => {
            next.search.clear();
            None
        }
        Action::Filter(edit) => {
            next.filter.apply(edit);
            None
        }
    };

    if let Some(index) = target {
        next.cursor = index;
    }
    next
}

/// First visible event at or after `start` that satisfies `pred`.
fn next_visible(
    trace: &TraceData,
    filter: &FilterConfig,
    start: usize,
    pred: impl Fn(&TraceEvent) -> bool,
) -> Option<usize> {
    trace
        .events()
        .get(start..)?
        .iter()
        .find(|e| pred(e) && filter.matches(e))
        .map(|e| e.index)
}

/// Last visible event at or before `start` that satisfies `pred`.
fn prev_visible(
    trace: &TraceData,
    filter: &FilterConfig,
    start: usize,
    pred: impl Fn(&TraceEvent) -> bool,
) -> Option<usize> {
    let end = start.saturating_add(1).min(trace.len());
    trace.events()[..end]
        .iter()
        .rev()
        .find(|e| pred(e) && filter.matches(e))
        .map(|e| e.index)
}

/// Visible event at or after `index`, falling back to the one before it.
fn nearest_visible(trace: &TraceData, filter: &FilterConfig, index: usize) -> Option<usize> {
    next_visible(trace, filter, index, |_| true)
        .or_else(|| prev_visible(trace, filter, index, |_| true))
}
