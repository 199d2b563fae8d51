//! End-to-end tests: load a trace file, navigate it, inspect the cluster.

use std::io::Write;

use tempfile::NamedTempFile;

use trace_scrubber::data::search::literals;
use trace_scrubber::keys::action_for_key;
use trace_scrubber::{
    reduce, Action, AppState, Direction, FileSource, FilterEdit, MachineClass, Report,
    TraceSource,
};

const TRACE: &str = r#"
{"Severity":"10","Time":"0.000000","Type":"Role","Machine":"2.0.1.0:1","ID":"w1","As":"Worker","Transition":"Begin"}
{"Severity":"10","Time":"0.100000","Type":"Role","Machine":"2.1.1.0:1","ID":"w2","As":"Worker","Transition":"Begin"}
{"Severity":"10","Time":"0.200000","Type":"Role","Machine":"3.0.1.3:1","ID":"t1","As":"Tester","Transition":"Begin"}
{"Severity":"10","Time":"0.500000","Type":"MasterRecoveryState","Machine":"2.0.1.0:1","StatusCode":"0","Status":"reading_coordinated_state","Conf":"{&quot;redundancy_mode&quot;:&quot;double&quot;,&quot;logs&quot;:&quot;3&quot;}"}
{"Severity":"10","Time":"1.000000","Type":"Role","Machine":"2.0.1.0:1","ID":"A","As":"StorageServer","Transition":"Begin"}
{"Severity":"30","Time":"1.500000","Type":"SlowTask","Machine":"2.1.1.0:1"}
{"Severity":"10","Time":"2.000000","Type":"Role","Machine":"2.0.1.0:1","ID":"A","As":"StorageServer","Transition":"End"}
{"Severity":"10","Time":"2.000000","Type":"MasterRecoveryState","Machine":"2.0.1.0:1","StatusCode":"14","Status":"fully_recovered"}
truncated line {"Severity":
{"Severity":"40","Time":"3.000000","Type":"TLogError","Machine":"2.1.1.0:1"}
{"Severity":"10","Time":"3.500000","Type":"MasterRecoveryState","Machine":"2.0.1.0:1","StatusCode":"0","Status":"reading_coordinated_state","Conf":"{\"redundancy_mode\":\"triple\",\"logs\":5}"}
"#;

fn load() -> (NamedTempFile, trace_scrubber::TraceData, usize) {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", TRACE).unwrap();
    file.flush().unwrap();

    let mut source = FileSource::new(file.path());
    let trace = source.load().unwrap();
    let skipped = source.skipped_lines();
    (file, trace, skipped)
}

#[test]
fn test_load_skips_bad_lines_and_builds_indices() {
    let (_file, trace, skipped) = load();
    assert_eq!(skipped, 1);
    assert_eq!(trace.len(), 10);
    assert_eq!(trace.configs().len(), 2);
    assert_eq!(trace.recovery_states().len(), 3);
    assert_eq!(trace.datacenters(), vec!["0".to_string(), "1".to_string()]);

    // equal timestamps keep file order
    assert_eq!(trace.get(6).unwrap().event_type, "Role");
    assert_eq!(trace.get(7).unwrap().event_type, "MasterRecoveryState");
}

#[test]
fn test_role_begin_and_end_over_time() {
    let (_file, trace, _) = load();
    let m1 = "2.0.1.0:1";

    let storage_up = trace.cluster_state(4);
    let roles: Vec<&str> = storage_up
        .get(m1)
        .unwrap()
        .roles
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(roles, vec!["Worker", "StorageServer"]);

    let storage_down = trace.cluster_state(6);
    assert_eq!(storage_down.get(m1).unwrap().roles_string(), "Worker");
    assert!(!storage_down.get(m1).unwrap().has_non_worker_roles());

    let topology = trace.topology(6);
    assert_eq!(topology.datacenters.len(), 2);
    assert_eq!(topology.testers.len(), 1);
    assert_eq!(topology.testers[0].class, MachineClass::Tester);
}

#[test]
fn test_config_follows_time() {
    let (_file, trace, _) = load();
    assert!(trace.latest_config_at(0.4).is_none());

    let first = trace.latest_config_at(3.0).unwrap();
    assert_eq!(first.redundancy_mode.as_deref(), Some("double"));
    assert_eq!(first.logs, Some(3));

    let second = trace.latest_config_at(10.0).unwrap();
    assert_eq!(second.redundancy_mode.as_deref(), Some("triple"));
    assert_eq!(second.logs, Some(5));
}

#[test]
fn test_key_driven_navigation() {
    let (_file, trace, _) = load();
    let press = |state: &AppState, key: &str| {
        reduce(state, &trace, action_for_key(key).unwrap())
    };

    let state = AppState::default();
    let state = press(&state, "R");
    assert_eq!(state.cursor, 3);
    let state = press(&state, "R");
    assert_eq!(state.cursor, 9);
    let state = press(&state, "r");
    assert_eq!(state.cursor, 3);
    let state = press(&state, "E");
    assert_eq!(state.cursor, 7);
    let state = press(&state, "#");
    assert_eq!(state.cursor, 5);
    let state = press(&state, "4");
    assert_eq!(state.cursor, 8);
    let state = press(&state, "g");
    assert_eq!(state.cursor, 0);
    let state = press(&state, "G");
    assert_eq!(state.cursor, 9);
}

#[test]
fn test_filtered_search_wraps() {
    let (_file, trace, _) = load();
    let mut state = AppState::default();
    for edit in [
        FilterEdit::SetShowAll(false),
        FilterEdit::ToggleDatacenter("1".to_string()),
    ] {
        state = reduce(&state, &trace, Action::Filter(edit));
    }

    let state = reduce(
        &state,
        &trace,
        Action::Search {
            pattern: "Type=*Error Severity=4*".to_string(),
            direction: Direction::Forward,
        },
    );
    assert_eq!(state.cursor, 8);

    // the only match: repeating comes back around to it
    let again = reduce(&state, &trace, Action::SearchNext);
    assert_eq!(again.cursor, 8);
    assert_eq!(literals("Type=*Error Severity=4*"), vec!["Type=", "Error Severity=4"]);

    let report = Report::new(&again, &trace);
    assert_eq!(report.view.datacenters, vec!["1".to_string()]);
    assert_eq!(report.recovery.as_ref().unwrap().status_code, "14");
    assert!(report.to_string().contains("TLogError"));
}

const XML_TRACE: &str = r#"<?xml version="1.0"?>
<Trace>
<Event Severity="10" Time="0.000000" Type="Role" Machine="2.0.1.0:1" ID="w1" As="Worker" Transition="Begin" />
<Event Severity="10" Time="0.500000" Type="MasterRecoveryState" Machine="2.0.1.0:1" StatusCode="0" Status="reading_coordinated_state" Conf="{&quot;redundancy_mode&quot;:&quot;double&quot;,&quot;logs&quot;:&quot;3&quot;}" />
<Event Severity="10" Time="1.000000" Type="Role" Machine="2.0.1.0:1" ID="A" As="StorageServer" Transition="Begin" />
<Event Severity="30" Time="1.500000" Type="SlowTask" Machine="2.1.1.0:1" />
</Trace>
"#;

#[test]
fn test_xml_trace_matches_json_trace() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", XML_TRACE).unwrap();
    file.flush().unwrap();
    let xml = FileSource::new(file.path()).load().unwrap();

    assert_eq!(xml.len(), 4);
    assert_eq!(xml.configs()[0].redundancy_mode.as_deref(), Some("double"));
    assert_eq!(xml.configs()[0].logs, Some(3));

    let (_file, json, _) = load();
    let workers = |t: &trace_scrubber::TraceData, cursor| {
        t.cluster_state(cursor)
            .get("2.0.1.0:1")
            .map(|w| w.roles_string())
    };
    // XML index 2 and JSON index 4 are the same StorageServer begin
    assert_eq!(workers(&xml, 2), workers(&json, 4));

    let state = reduce(&AppState::default(), &xml, action_for_key("3").unwrap());
    assert_eq!(xml.get(state.cursor).unwrap().event_type, "SlowTask");
}
