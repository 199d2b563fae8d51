//! Point-in-time snapshots derived from trace events.
//!
//! Database configurations and recovery states are pulled out of
//! `MasterRecoveryState` events at load time and kept in their own sorted
//! arrays so they can be binary searched.

use html_escape::decode_html_entities;
use serde::Serialize;
use serde_json::{Map, Value};

/// Database configuration observed at a point in time.
///
/// Only the commonly inspected fields are lifted out; the full decoded
/// payload is kept in `raw`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbConfig {
    pub time: f64,
    pub redundancy_mode: Option<String>,
    pub usable_regions: Option<i64>,
    pub logs: Option<i64>,
    pub log_routers: Option<i64>,
    pub remote_logs: Option<i64>,
    /// `commit_proxies`, or the older `proxies` key.
    pub commit_proxies: Option<i64>,
    pub grv_proxies: Option<i64>,
    pub backup_worker_enabled: Option<i64>,
    pub storage_engine: Option<String>,
    pub remote_redundancy_mode: Option<String>,
    pub tenant_mode: Option<String>,
    pub raw: Map<String, Value>,
}

impl DbConfig {
    /// Decode a `Conf` payload.
    ///
    /// XML traces HTML-encode the embedded JSON (`&quot;` and friends), so a
    /// payload that does not parse as-is is unescaped and tried again.
    /// Returns `None` if neither form is a JSON object.
    pub fn parse(payload: &str, time: f64) -> Option<Self> {
        let raw: Map<String, Value> = serde_json::from_str(payload)
            .or_else(|_| serde_json::from_str(&decode_html_entities(payload)))
            .ok()?;

        let string = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| raw.get(key).and_then(as_integer);

        Some(Self {
            time,
            redundancy_mode: string("redundancy_mode"),
            usable_regions: number("usable_regions"),
            logs: number("logs"),
            log_routers: number("log_routers"),
            remote_logs: number("remote_logs"),
            commit_proxies: number("commit_proxies").or_else(|| number("proxies")),
            grv_proxies: number("grv_proxies"),
            backup_worker_enabled: number("backup_worker_enabled"),
            storage_engine: string("storage_engine"),
            remote_redundancy_mode: string("remote_redundancy_mode"),
            tenant_mode: string("tenant_mode"),
            raw,
        })
    }
}

/// Accept integers written as JSON numbers or as numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A `MasterRecoveryState` transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryState {
    pub time: f64,
    /// Small integer status code, kept as written (e.g. `"0"`, `"14"`).
    pub status_code: String,
    /// Human-readable status label (e.g. `"reading_coordinated_state"`).
    pub status: String,
    /// Index of the originating event in the event sequence.
    pub event_index: usize,
}
