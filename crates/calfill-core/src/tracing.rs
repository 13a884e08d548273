//! Log output for calfill.
//!
//! Logs always go to stderr; stdout is reserved for rendered artifacts.
//! `RUST_LOG`, when set and valid, replaces the preset's `calfill=<level>`
//! directive.

use std::io;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
};

/// A global subscriber was already installed.
#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct TracingError(#[from] TryInitError);

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One short human-readable line per event, no timestamps.
    #[default]
    Compact,
    /// One JSON object per event, with timestamps and span close events.
    Json,
}

/// Log level, format and verbosity for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Adds file, line and target to every line.
    pub include_location: bool,
}

impl Default for TracingConfig {
    /// Warnings only, so normal runs print nothing but the artifacts.
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: TracingOutputFormat::Compact,
            include_location: false,
        }
    }
}

impl TracingConfig {
    /// `--debug`: every split, fallback and resolution decision.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            format: TracingOutputFormat::Compact,
            include_location: true,
        }
    }

    /// `--log-json`, for runs whose stderr is collected by another tool.
    #[must_use]
    pub fn structured(debug: bool) -> Self {
        Self {
            level: if debug { Level::DEBUG } else { Level::INFO },
            format: TracingOutputFormat::Json,
            include_location: true,
        }
    }

    /// Filter used when `RUST_LOG` is unset. The `calfill` prefix matches
    /// both `calfill_core` and `calfill_cli` targets.
    pub fn default_directive(&self) -> String {
        format!("calfill={}", self.level)
    }
}

/// Installs the global subscriber. Call once, before any work is logged.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));
    let location = config.include_location;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        TracingOutputFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_writer(io::stderr)
            .with_file(location)
            .with_line_number(location)
            .with_target(location)
            .with_filter(filter)
            .boxed(),
        TracingOutputFormat::Json => fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_file(location)
            .with_line_number(location)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
