//! CLI error types.

use std::io;
use std::path::PathBuf;

use calfill_core::OptionsError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that end a `calfill` run with a failure exit code.
///
/// Artifacts that cannot be produced are not errors at this level; they are
/// reported alongside the output.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Pipeline options rejected by validation.
    #[error("invalid pipeline option: {0}")]
    Options(#[from] OptionsError),

    /// Malformed UTC offset from `--offset` or `utc_offset`.
    #[error("invalid UTC offset {0:?}: expected Z, +HH:MM, -HH:MM or +HHMM")]
    Offset(String),

    /// Input could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Other IO error (stdin, stdout).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Input is not a JSON event record.
    #[error("invalid event record: {0}")]
    Record(#[source] serde_json::Error),

    /// JSON output could not be produced.
    #[error("failed to serialize output: {0}")]
    Output(#[source] serde_json::Error),
}
