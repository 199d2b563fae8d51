//! Error types for loading traces and compiling patterns.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a trace.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the trace failed.
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The trace contained no parseable events.
    #[error("no events found in {0}")]
    Empty(String),
}

/// A filter or search pattern that could not be compiled.
#[derive(Debug, Error)]
#[error("invalid pattern `{pattern}`: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}
