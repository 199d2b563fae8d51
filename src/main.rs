use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trace_scrubber::data::TimeRange;
use trace_scrubber::{
    reduce, Action, AppState, Direction, FileSource, FilterEdit, Report, Settings, TraceSource,
};

#[derive(Parser, Debug)]
#[command(name = "trace-scrubber")]
#[command(about = "Explore a FoundationDB trace at a point in time")]
struct Args {
    /// Path to a trace file (XML or JSON lines)
    trace: PathBuf,

    /// Move to the event nearest this time (seconds)
    #[arg(long, conflicts_with = "index")]
    at: Option<f64>,

    /// Move to this event index
    #[arg(long)]
    index: Option<usize>,

    /// Show only events whose text matches this wildcard pattern (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Show only events from this process address (repeatable)
    #[arg(short, long = "machine")]
    machines: Vec<String>,

    /// Show only events from this datacenter id (repeatable)
    #[arg(long = "dc")]
    datacenters: Vec<String>,

    /// Start of the visible time range (seconds)
    #[arg(long, requires = "to")]
    from: Option<f64>,

    /// End of the visible time range (seconds)
    #[arg(long, requires = "from")]
    to: Option<f64>,

    /// Move to the next event matching this wildcard pattern
    #[arg(short, long)]
    search: Option<String>,

    /// Search backward instead of forward
    #[arg(long, requires = "search")]
    backward: bool,

    /// Settings file (TOML or JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Export the report to a JSON file instead of printing it
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = Settings::load(args.settings.as_deref()).context("loading settings")?;

    let mut source = FileSource::new(&args.trace);
    let trace = source
        .load()
        .with_context(|| format!("loading {}", source.description()))?;
    info!(
        events = trace.len(),
        skipped = source.skipped_lines(),
        "loaded trace"
    );

    let mut state = AppState::new(&settings);
    for action in filter_actions(&args) {
        state = reduce(&state, &trace, action);
    }
    if !state.filter.is_show_all() {
        state = reduce(&state, &trace, Action::First);
    }

    if let Some(time) = args.at {
        state = reduce(&state, &trace, Action::JumpToTime(time));
    } else if let Some(index) = args.index {
        state = reduce(&state, &trace, Action::JumpToIndex(index));
    }

    if let Some(pattern) = &args.search {
        let direction = if args.backward {
            Direction::Backward
        } else {
            Direction::Forward
        };
        let before = state.cursor;
        state = reduce(
            &state,
            &trace,
            Action::Search {
                pattern: pattern.clone(),
                direction,
            },
        );
        if state.cursor == before {
            warn!("no other event matches `{}`", pattern);
        }
    }

    let report = Report::new(&state, &trace);
    match &args.export {
        Some(path) => {
            report.export(path)?;
            println!("Exported report to: {}", path.display());
        }
        None => print!("{}", report),
    }

    Ok(())
}

/// Filter edits requested on the command line.
fn filter_actions(args: &Args) -> Vec<Action> {
    let mut edits = Vec::new();
    edits.extend(args.filters.iter().cloned().map(FilterEdit::AddRawPattern));
    edits.extend(args.machines.iter().cloned().map(FilterEdit::SelectMachine));
    edits.extend(args.datacenters.iter().cloned().map(FilterEdit::SelectDatacenter));
    if let (Some(from), Some(to)) = (args.from, args.to) {
        edits.push(FilterEdit::SetTimeRange(TimeRange::new(from, to)));
    }

    if !edits.is_empty() {
        edits.insert(0, FilterEdit::SetShowAll(false));
    }
    edits.into_iter().map(Action::Filter).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_scrubber::TraceData;

    fn apply(args: &[&str]) -> AppState {
        let args = Args::parse_from(args);
        let trace = TraceData::default();
        filter_actions(&args)
            .into_iter()
            .fold(AppState::default(), |state, action| reduce(&state, &trace, action))
    }

    #[test]
    fn test_no_filter_flags_keep_show_all() {
        let args = Args::parse_from(["trace-scrubber", "t.json"]);
        assert!(filter_actions(&args).is_empty());
    }

    #[test]
    fn test_repeated_dc_flag_stays_selected() {
        let state = apply(&["trace-scrubber", "t.json", "--dc", "1", "--dc", "1"]);
        assert!(!state.filter.is_show_all());
        assert!(state.filter.datacenters().contains("1"));
        assert!(!state.filter.is_unconfigured());
    }

    #[test]
    fn test_repeated_machine_flag_stays_selected() {
        let state = apply(&[
            "trace-scrubber",
            "t.json",
            "-m",
            "2.0.1.0:1",
            "--machine",
            "2.0.1.0:1",
        ]);
        assert_eq!(state.filter.machines().len(), 1);
        assert!(state.filter.machines().contains("2.0.1.0:1"));
    }
}
