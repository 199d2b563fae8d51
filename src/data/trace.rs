//! The loaded trace and its time-indexed lookups.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::address::classify;
use super::cluster::{ClusterState, Topology};
use super::event::TraceEvent;
use super::snapshot::{DbConfig, RecoveryState};

/// Event type that carries recovery transitions and configuration payloads.
pub const RECOVERY_EVENT: &str = "MasterRecoveryState";

/// Fallback scrub step when the trace has fewer than two distinct times.
const DEFAULT_TIME_STEP: f64 = 0.1;

/// An immutable, time-sorted trace with derived snapshot indices.
///
/// All queries are read-only. Lookups that find nothing return `None` (or
/// an empty slice) rather than an error.
#[derive(Debug, Clone)]
pub struct TraceData {
    events: Vec<TraceEvent>,
    configs: Vec<DbConfig>,
    recovery_states: Vec<RecoveryState>,
    min_time: f64,
    max_time: f64,
    time_step: f64,
}

impl Default for TraceData {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }
}

impl TraceData {
    /// Wrap already-sorted arrays.
    ///
    /// `events` must be sorted by time with `index` equal to position,
    /// `configs` sorted by time, and `recovery_states` sorted by event index.
    pub fn new(
        events: Vec<TraceEvent>,
        configs: Vec<DbConfig>,
        recovery_states: Vec<RecoveryState>,
    ) -> Self {
        let min_time = events.first().map_or(0.0, |e| e.time);
        let max_time = events.last().map_or(0.0, |e| e.time);
        let time_step = smallest_gap(&events).unwrap_or(DEFAULT_TIME_STEP);

        Self {
            events,
            configs,
            recovery_states,
            min_time,
            max_time,
            time_step,
        }
    }

    /// Build a trace from events in file order.
    ///
    /// Sorts by time (stable, so equal timestamps keep their encounter
    /// order), renumbers the events, and derives the configuration and
    /// recovery-state indices from `MasterRecoveryState` events.
    pub fn from_events(mut events: Vec<TraceEvent>) -> Self {
        events.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut configs = Vec::new();
        let mut recovery_states = Vec::new();

        for (index, event) in events.iter_mut().enumerate() {
            event.index = index;
            if event.event_type != RECOVERY_EVENT {
                continue;
            }

            if let Some(payload) = event.attr("Conf") {
                match DbConfig::parse(payload, event.time) {
                    Some(config) => configs.push(config),
                    None => debug!(index, "skipping undecodable Conf payload"),
                }
            }

            if let (Some(code), Some(status)) = (event.attr("StatusCode"), event.attr("Status")) {
                if !code.is_empty() && !status.is_empty() {
                    recovery_states.push(RecoveryState {
                        time: event.time,
                        status_code: code.to_string(),
                        status: status.to_string(),
                        event_index: index,
                    });
                }
            }
        }

        // already in time order, since they were collected from sorted events
        let data = Self::new(events, configs, recovery_states);
        info!(
            events = data.events.len(),
            configs = data.configs.len(),
            recovery_states = data.recovery_states.len(),
            "built trace index ({:.2}s - {:.2}s)",
            data.min_time,
            data.max_time
        );
        data
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn configs(&self) -> &[DbConfig] {
        &self.configs
    }

    pub fn recovery_states(&self) -> &[RecoveryState] {
        &self.recovery_states
    }

    pub fn get(&self, index: usize) -> Option<&TraceEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    /// Smallest positive gap between consecutive events.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// All events with timestamp at or before `time`.
    pub fn events_up_to(&self, time: f64) -> &[TraceEvent] {
        let end = self.events.partition_point(|e| e.time <= time);
        &self.events[..end]
    }

    /// All events with index at or before `cursor`.
    pub fn events_through(&self, cursor: usize) -> &[TraceEvent] {
        let end = cursor.saturating_add(1).min(self.events.len());
        &self.events[..end]
    }

    /// Latest configuration recorded at or before `time`.
    pub fn latest_config_at(&self, time: f64) -> Option<&DbConfig> {
        let end = self.configs.partition_point(|c| c.time <= time);
        end.checked_sub(1).map(|i| &self.configs[i])
    }

    /// Latest recovery state whose event is at or before `index`.
    pub fn latest_recovery_at(&self, index: usize) -> Option<&RecoveryState> {
        let end = self.recovery_states.partition_point(|r| r.event_index <= index);
        end.checked_sub(1).map(|i| &self.recovery_states[i])
    }

    /// Nearest recovery state strictly before `index` with `status_code`.
    pub fn previous_recovery_with_status(
        &self,
        index: usize,
        status_code: &str,
    ) -> Option<&RecoveryState> {
        self.previous_recovery_where(index, |r| r.status_code == status_code)
    }

    /// Nearest recovery state strictly after `index` with `status_code`.
    pub fn next_recovery_with_status(
        &self,
        index: usize,
        status_code: &str,
    ) -> Option<&RecoveryState> {
        self.next_recovery_where(index, |r| r.status_code == status_code)
    }

    /// Nearest recovery state of any status strictly before `index`.
    pub fn previous_recovery(&self, index: usize) -> Option<&RecoveryState> {
        self.previous_recovery_where(index, |_| true)
    }

    /// Nearest recovery state of any status strictly after `index`.
    pub fn next_recovery(&self, index: usize) -> Option<&RecoveryState> {
        self.next_recovery_where(index, |_| true)
    }

    fn previous_recovery_where(
        &self,
        index: usize,
        pred: impl Fn(&RecoveryState) -> bool,
    ) -> Option<&RecoveryState> {
        let end = self.recovery_states.partition_point(|r| r.event_index < index);
        self.recovery_states[..end].iter().rev().find(|r| pred(r))
    }

    fn next_recovery_where(
        &self,
        index: usize,
        pred: impl Fn(&RecoveryState) -> bool,
    ) -> Option<&RecoveryState> {
        let start = self.recovery_states.partition_point(|r| r.event_index <= index);
        self.recovery_states[start..].iter().find(|r| pred(r))
    }

    /// Index of the event closest to `time`.
    ///
    /// An exact match wins; otherwise the nearer neighbour, with ties going
    /// to the later event. Times past the end clamp to the last event.
    /// Returns `None` only for an empty trace.
    pub fn index_at_time(&self, time: f64) -> Option<usize> {
        let last = self.events.len().checked_sub(1)?;
        let idx = self.events.partition_point(|e| e.time < time);
        if idx > last {
            return Some(last);
        }

        let at = self.events[idx].time;
        if at == time || idx == 0 {
            return Some(idx);
        }

        let prev_diff = time - self.events[idx - 1].time;
        let next_diff = at - time;
        Some(if prev_diff < next_diff { idx - 1 } else { idx })
    }

    /// Cluster topology after replaying every event up to `cursor`.
    pub fn cluster_state(&self, cursor: usize) -> ClusterState {
        ClusterState::build(self.events_through(cursor))
    }

    /// Display topology at `cursor`.
    pub fn topology(&self, cursor: usize) -> Topology {
        self.cluster_state(cursor).topology()
    }

    /// Every distinct process address in the trace, sorted.
    pub fn machines(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .events
            .iter()
            .map(|e| e.machine.as_str())
            .filter(|m| !m.is_empty())
            .collect();
        set.into_iter().collect()
    }

    /// Every datacenter id that appears in an address, sorted.
    pub fn datacenters(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .machines()
            .into_iter()
            .filter_map(|m| classify(m).dc_id)
            .collect();
        set.into_iter().collect()
    }
}

fn smallest_gap(events: &[TraceEvent]) -> Option<f64> {
    events
        .windows(2)
        .map(|w| w[1].time - w[0].time)
        .filter(|gap| *gap > 0.0)
        .min_by(f64::total_cmp)
}
