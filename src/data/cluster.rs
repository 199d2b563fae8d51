//! Cluster topology reconstruction.
//!
//! The topology at any point in the trace is rebuilt by replaying `Role`
//! events from the start of the trace up to the cursor. Replay only ever
//! looks at the prefix it is given, so the result for a cursor does not
//! depend on how the cursor got there.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use super::address::{classify, MachineClass};
use super::event::TraceEvent;

/// Event type carrying role transitions.
pub const ROLE_EVENT: &str = "Role";

/// Address used by events that are not tied to a real process.
pub const NULL_ADDRESS: &str = "0.0.0.0:0";

/// Generic membership role every worker process holds.
pub const WORKER_ROLE: &str = "Worker";

/// A role held by a process, e.g. `StorageServer` with its unique id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    pub name: String,
    /// Role instance id. Absent for name-only role records.
    pub id: Option<String>,
}

impl RoleInfo {
    pub fn new(name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// A process in the cluster and the roles it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worker {
    pub machine: String,
    /// Roles in the order they began.
    pub roles: Vec<RoleInfo>,
    pub class: MachineClass,
    pub dc_id: Option<String>,
}

impl Worker {
    fn new(machine: &str) -> Self {
        let info = classify(machine);
        Self {
            machine: machine.to_string(),
            roles: Vec::new(),
            class: info.class,
            dc_id: info.dc_id,
        }
    }

    /// Returns true if the worker has any roles assigned.
    pub fn has_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Returns true if the worker holds anything besides the membership role.
    pub fn has_non_worker_roles(&self) -> bool {
        self.roles.iter().any(|r| r.name != WORKER_ROLE)
    }

    /// Comma-separated role names.
    pub fn roles_string(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn begin(&mut self, role: RoleInfo) {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
    }

    fn end(&mut self, role: &RoleInfo) {
        self.roles.retain(|r| r != role);
    }
}

/// Role transition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    End,
    /// Re-asserts an existing role; carries no state change.
    Refresh,
}

impl Transition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Begin" => Some(Transition::Begin),
            "End" => Some(Transition::End),
            "Refresh" => Some(Transition::Refresh),
            _ => None,
        }
    }
}

/// Display-ready partition of the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    /// Main cluster members grouped by datacenter id, each group sorted by address.
    pub datacenters: BTreeMap<String, Vec<Worker>>,
    /// Tester processes sorted by address.
    pub testers: Vec<Worker>,
}

impl Topology {
    /// Total number of processes shown (main members plus testers).
    pub fn len(&self) -> usize {
        self.datacenters.values().map(Vec::len).sum::<usize>() + self.testers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live topology keyed by process address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterState {
    workers: BTreeMap<String, Worker>,
}

impl ClusterState {
    /// Create a new empty cluster state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every role transition in `events`, in order.
    pub fn build(events: &[TraceEvent]) -> Self {
        let mut state = Self::new();
        for event in events {
            state.apply(event);
        }
        trace!(events = events.len(), workers = state.workers.len(), "replayed cluster state");
        state
    }

    /// Apply a single event. Events other than role transitions are ignored.
    pub fn apply(&mut self, event: &TraceEvent) {
        if event.event_type != ROLE_EVENT || event.machine == NULL_ADDRESS {
            return;
        }

        let role_name = event.attr("As").unwrap_or_default();
        if role_name.is_empty() {
            return;
        }

        let worker = self
            .workers
            .entry(event.machine.clone())
            .or_insert_with(|| Worker::new(&event.machine));

        let role = RoleInfo::new(role_name, event.id.clone());
        match event.attr("Transition").and_then(Transition::parse) {
            Some(Transition::Begin) => worker.begin(role),
            Some(Transition::End) => worker.end(&role),
            Some(Transition::Refresh) | None => {}
        }
    }

    /// Look up a worker by address.
    pub fn get(&self, machine: &str) -> Option<&Worker> {
        self.workers.get(machine)
    }

    /// All tracked workers, sorted by address.
    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Main cluster members grouped by datacenter id.
    pub fn workers_by_dc(&self) -> BTreeMap<String, Vec<Worker>> {
        let mut by_dc: BTreeMap<String, Vec<Worker>> = BTreeMap::new();
        for worker in self.workers_of(MachineClass::Main) {
            if let Some(dc) = &worker.dc_id {
                by_dc.entry(dc.clone()).or_default().push(worker.clone());
            }
        }
        by_dc
    }

    /// All tester workers.
    pub fn testers(&self) -> Vec<Worker> {
        self.workers_of(MachineClass::Tester).cloned().collect()
    }

    /// Workers whose address could not be classified.
    pub fn unknown_workers(&self) -> Vec<Worker> {
        self.workers_of(MachineClass::Unknown).cloned().collect()
    }

    /// Snapshot of the display groups.
    pub fn topology(&self) -> Topology {
        Topology {
            datacenters: self.workers_by_dc(),
            testers: self.testers(),
        }
    }

    fn workers_of(&self, class: MachineClass) -> impl Iterator<Item = &Worker> {
        self.workers.values().filter(move |w| w.class == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn role(time: f64, machine: &str, transition: &str, name: &str, id: &str) -> TraceEvent {
        TraceEvent::new(time, ROLE_EVENT)
            .with_machine(machine)
            .with_id(id)
            .with_attr("As", name)
            .with_attr("Transition", transition)
    }

    const M1: &str = "2.0.1.0:1";

    #[test]
    fn test_begin_then_end_leaves_worker_listed_without_roles() {
        let events = vec![
            role(0.0, M1, "Begin", "Storage", "A"),
            role(1.0, M1, "End", "Storage", "A"),
        ];

        let at_zero = ClusterState::build(&events[..1]);
        let worker = at_zero.get(M1).unwrap();
        assert_eq!(worker.roles, vec![RoleInfo::new("Storage", Some("A".into()))]);

        let at_one = ClusterState::build(&events);
        let worker = at_one.get(M1).unwrap();
        assert!(!worker.has_roles());
        assert_eq!(at_one.topology().datacenters["0"].len(), 1);
    }

    #[test]
    fn test_second_end_is_a_no_op() {
        let events = vec![
            role(0.0, M1, "Begin", "Worker", "w"),
            role(0.1, M1, "Begin", "Storage", "A"),
            role(0.2, M1, "End", "Storage", "A"),
            role(0.3, M1, "End", "Storage", "A"),
        ];
        let state = ClusterState::build(&events);
        assert_eq!(state.get(M1).unwrap().roles_string(), "Worker");
    }

    #[test]
    fn test_duplicate_begin_is_idempotent() {
        let events = vec![
            role(0.0, M1, "Begin", "Storage", "A"),
            role(0.1, M1, "Begin", "Storage", "A"),
        ];
        let state = ClusterState::build(&events);
        assert_eq!(state.get(M1).unwrap().roles.len(), 1);
    }

    #[test]
    fn test_same_name_different_id_adds_second_entry() {
        let events = vec![
            role(0.0, M1, "Begin", "Storage", "A"),
            role(0.1, M1, "Begin", "Storage", "B"),
        ];
        let state = ClusterState::build(&events);
        assert_eq!(state.get(M1).unwrap().roles_string(), "Storage, Storage");
    }

    #[test]
    fn test_refresh_changes_nothing() {
        let events = vec![
            role(0.0, M1, "Begin", "Storage", "A"),
            role(0.1, M1, "Refresh", "Storage", "A"),
            role(0.2, M1, "Refresh", "TLog", "B"),
        ];
        let state = ClusterState::build(&events);
        assert_eq!(state.get(M1).unwrap().roles_string(), "Storage");
    }

    #[test]
    fn test_refresh_still_registers_the_process() {
        let events = vec![role(0.0, M1, "Refresh", "Storage", "A")];
        let state = ClusterState::build(&events);
        assert!(state.get(M1).is_some());
        assert!(!state.get(M1).unwrap().has_roles());
    }

    #[test]
    fn test_skips_null_address_empty_role_and_other_types() {
        let events = vec![
            role(0.0, NULL_ADDRESS, "Begin", "Storage", "A"),
            role(0.1, M1, "Begin", "", "A"),
            TraceEvent::new(0.2, "WorkerHealthMonitor").with_machine("2.0.2.0:1"),
        ];
        let state = ClusterState::build(&events);
        assert!(state.is_empty());
    }

    #[test]
    fn test_name_only_roles_use_absent_id() {
        let event = TraceEvent::new(0.0, ROLE_EVENT)
            .with_machine(M1)
            .with_attr("As", "Coordinator")
            .with_attr("Transition", "Begin");
        let state = ClusterState::build(&[event]);
        assert_eq!(state.get(M1).unwrap().roles, vec![RoleInfo::new("Coordinator", None)]);
    }

    #[test]
    fn test_topology_partitions_and_orders_workers() {
        let events = vec![
            role(0.0, "2.1.0.2:1", "Begin", "Worker", "a"),
            role(0.0, "2.1.0.1:1", "Begin", "Worker", "b"),
            role(0.0, "[abcd::2:0:1:0]:1", "Begin", "Worker", "c"),
            role(0.0, "3.0.0.9:1", "Begin", "Worker", "d"),
            role(0.0, "3.0.0.1:1", "Begin", "Worker", "e"),
            role(0.0, "garbage", "Begin", "Worker", "f"),
        ];
        let state = ClusterState::build(&events);
        let topology = state.topology();

        let dcs: Vec<&String> = topology.datacenters.keys().collect();
        assert_eq!(dcs, vec!["0", "1"]);
        let dc1: Vec<&str> = topology.datacenters["1"].iter().map(|w| w.machine.as_str()).collect();
        assert_eq!(dc1, vec!["2.1.0.1:1", "2.1.0.2:1"]);
        let testers: Vec<&str> = topology.testers.iter().map(|w| w.machine.as_str()).collect();
        assert_eq!(testers, vec!["3.0.0.1:1", "3.0.0.9:1"]);

        assert_eq!(topology.len(), 5);
        assert_eq!(state.unknown_workers().len(), 1);
        assert_eq!(state.len(), 6);
    }

    #[test]
    fn test_non_worker_roles() {
        let events = vec![role(0.0, M1, "Begin", "Worker", "w")];
        let mut state = ClusterState::build(&events);
        assert!(!state.get(M1).unwrap().has_non_worker_roles());

        state.apply(&role(0.1, M1, "Begin", "TLog", "t"));
        assert!(state.get(M1).unwrap().has_non_worker_roles());
    }

    fn arb_role_event() -> impl Strategy<Value = TraceEvent> {
        (
            prop::sample::select(vec!["2.0.1.0:1", "2.1.1.0:1", "3.0.0.1:1", "junk"]),
            prop::sample::select(vec!["Begin", "End", "Refresh"]),
            prop::sample::select(vec!["Worker", "Storage", "TLog", ""]),
            prop::sample::select(vec!["a", "b"]),
        )
            .prop_map(|(machine, transition, name, id)| role(0.0, machine, transition, name, id))
    }

    proptest! {
        #[test]
        fn test_replay_is_idempotent(events in prop::collection::vec(arb_role_event(), 0..40)) {
            prop_assert_eq!(ClusterState::build(&events), ClusterState::build(&events));
        }

        #[test]
        fn test_replay_is_path_independent(
            events in prop::collection::vec(arb_role_event(), 1..40),
            cursor in 0usize..40,
        ) {
            let cursor = cursor % events.len();
            let direct = ClusterState::build(&events[..=cursor]);

            let mut stepped = ClusterState::build(&events[..cursor]);
            stepped.apply(&events[cursor]);
            prop_assert_eq!(&direct, &stepped);

            // seek to the end, then back to the cursor
            let trace = crate::data::TraceData::from_events(events.clone());
            let last = events.len() - 1;
            prop_assert_eq!(trace.topology(last), ClusterState::build(&events).topology());
            prop_assert_eq!(trace.topology(cursor), direct.topology());
        }
    }
}
