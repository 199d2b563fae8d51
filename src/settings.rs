//! Layered runtime settings.
//!
//! Built-in defaults, then an optional settings file (TOML, JSON, or any
//! format `config` recognises by extension), then `SCRUBBER_*` environment
//! variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Default jump for page navigation, in seconds.
pub const DEFAULT_PAGE_SECONDS: f64 = 1.0;

/// Status code of the first recovery phase.
pub const DEFAULT_RECOVERY_START_STATUS: &str = "0";

/// Tunables for navigation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Seconds moved by a page jump.
    pub page_seconds: f64,
    /// Recovery status code that marks the start of a recovery.
    pub recovery_start_status: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_seconds: DEFAULT_PAGE_SECONDS,
            recovery_start_status: DEFAULT_RECOVERY_START_STATUS.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, layering `path` (if any) and the environment over the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("page_seconds", DEFAULT_PAGE_SECONDS)?
            .set_default("recovery_start_status", DEFAULT_RECOVERY_START_STATUS)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix("SCRUBBER"))
            .build()?
            .try_deserialize()
    }
}
