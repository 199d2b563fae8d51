//! Point-in-time reports.
//!
//! A [`Report`] captures what a viewer shows for one cursor position: the
//! event under the cursor, the database configuration and recovery state
//! in effect, and the cluster topology. It renders as text for the
//! terminal and serializes to JSON for export.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::AppState;
use crate::data::{DbConfig, RecoveryState, Topology, TraceData, TraceEvent, Worker};

/// Trace-wide figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSummary {
    pub events: usize,
    pub configs: usize,
    pub recovery_states: usize,
    pub min_time: f64,
    pub max_time: f64,
}

/// Filter and search settings active when the report was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub show_all: bool,
    pub raw_patterns: Vec<String>,
    pub machines: Vec<String>,
    pub datacenters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Everything visible at one cursor position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub trace: TraceSummary,
    pub view: ViewSummary,
    pub cursor: usize,
    pub event: Option<TraceEvent>,
    pub config: Option<DbConfig>,
    pub recovery: Option<RecoveryState>,
    pub topology: Topology,
}

impl Report {
    /// Build the report for `state` over `trace`.
    pub fn new(state: &AppState, trace: &TraceData) -> Self {
        let event = trace.get(state.cursor).cloned();
        let config = event
            .as_ref()
            .and_then(|e| trace.latest_config_at(e.time))
            .cloned();
        let filter = &state.filter;

        Self {
            trace: TraceSummary {
                events: trace.len(),
                configs: trace.configs().len(),
                recovery_states: trace.recovery_states().len(),
                min_time: trace.min_time(),
                max_time: trace.max_time(),
            },
            view: ViewSummary {
                show_all: filter.is_show_all(),
                raw_patterns: filter.raw_patterns().map(str::to_string).collect(),
                machines: filter.machines().iter().cloned().collect(),
                datacenters: filter.datacenters().iter().cloned().collect(),
                time_range: filter.time_range().map(|r| (r.start, r.end)),
                search: state.search.pattern().map(str::to_string),
            },
            cursor: state.cursor,
            event,
            config,
            recovery: trace.latest_recovery_at(state.cursor).cloned(),
            topology: trace.topology(state.cursor),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn export(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn write_worker(f: &mut fmt::Formatter<'_>, worker: &Worker) -> fmt::Result {
    if worker.has_roles() {
        writeln!(f, "    {}  {}", worker.machine, worker.roles_string())
    } else {
        writeln!(f, "    {}  (no roles)", worker.machine)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trace: {} events, {:.6}s - {:.6}s",
            self.trace.events, self.trace.min_time, self.trace.max_time
        )?;

        match &self.event {
            Some(event) => {
                writeln!(f, "Event #{} at {}s", self.cursor, event.time_text)?;
                writeln!(f, "  {}", event.full_text())?;
            }
            None => writeln!(f, "Event #{} (none)", self.cursor)?,
        }

        writeln!(f)?;
        writeln!(f, "DB configuration:")?;
        match &self.config {
            Some(config) => {
                let fields = [
                    ("redundancy_mode", config.redundancy_mode.clone()),
                    ("usable_regions", config.usable_regions.map(|v| v.to_string())),
                    ("logs", config.logs.map(|v| v.to_string())),
                    ("log_routers", config.log_routers.map(|v| v.to_string())),
                    ("remote_logs", config.remote_logs.map(|v| v.to_string())),
                    ("commit_proxies", config.commit_proxies.map(|v| v.to_string())),
                    ("grv_proxies", config.grv_proxies.map(|v| v.to_string())),
                    ("storage_engine", config.storage_engine.clone()),
                ];
                for (name, value) in fields {
                    if let Some(value) = value {
                        writeln!(f, "  {}: {}", name, value)?;
                    }
                }
            }
            None => writeln!(f, "  (unknown)")?,
        }

        writeln!(f)?;
        match &self.recovery {
            Some(r) => writeln!(f, "Recovery state: {} [{}]", r.status, r.status_code)?,
            None => writeln!(f, "Recovery state: (none)")?,
        }

        writeln!(f)?;
        writeln!(f, "Topology ({} processes):", self.topology.len())?;
        for (dc, workers) in &self.topology.datacenters {
            writeln!(f, "  DC {}", dc)?;
            for worker in workers {
                write_worker(f, worker)?;
            }
        }
        if !self.topology.testers.is_empty() {
            writeln!(f, "  Testers")?;
            for worker in &self.topology.testers {
                write_worker(f, worker)?;
            }
        }

        Ok(())
    }
}
