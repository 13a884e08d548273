//! Command-line interface definition.

use std::path::PathBuf;

use calfill_core::ArtifactRequest;
use clap::{Parser, Subcommand};

/// calfill - turn an extracted event record into a calendar link and an
/// iCalendar file
#[derive(Debug, Parser)]
#[command(name = "calfill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "CALFILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// JSON event record to read; `-` or nothing reads stdin
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    // --- Artifact selection ---
    /// Only build the calendar link
    #[arg(long, group = "artifacts")]
    pub link_only: bool,

    /// Only build the calendar file fragment
    #[arg(long, group = "artifacts")]
    pub file_only: bool,

    // --- Output ---
    /// Print the artifacts as JSON
    #[arg(long)]
    pub json: bool,

    /// Write a complete .ics calendar to this path when a fragment was built
    #[arg(long, value_name = "PATH")]
    pub write_ics: Option<PathBuf>,

    // --- Pipeline overrides ---
    /// UTC offset for dates and times that carry none (e.g. +09:00)
    #[arg(long, value_name = "+HH:MM", allow_hyphen_values = true)]
    pub offset: Option<String>,

    /// Title used when the record has none
    #[arg(long)]
    pub placeholder_title: Option<String>,

    /// Length of timed events without a usable end, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub default_duration: Option<i64>,

    /// Calendar endpoint the link parameters are appended to
    #[arg(long, value_name = "URL")]
    pub link_base: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the artifacts selected by the flags.
    pub fn artifact_request(&self) -> ArtifactRequest {
        if self.link_only {
            ArtifactRequest::link_only()
        } else if self.file_only {
            ArtifactRequest::file_only()
        } else {
            ArtifactRequest::all()
        }
    }

    /// Returns the input path, or `None` for stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|path| path.as_os_str() != "-")
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
