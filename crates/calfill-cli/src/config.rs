//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/calfill/config.toml` by default:
//!
//! ```toml
//! [pipeline]
//! placeholder_title = "(untitled event)"
//! default_duration_minutes = 60
//! link_base_url = "https://calendar.google.com/calendar/render"
//! utc_offset = "+09:00"
//!
//! [output]
//! json = false
//! prodid = "-//calfill//calfill//EN"
//! ```
//!
//! Every key is optional. Without `utc_offset` the machine's local time zone
//! is used.

use std::path::{Path, PathBuf};

use calfill_core::{DEFAULT_PRODID, PipelineOptions};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Configuration for the calfill CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Pipeline settings.
    pub pipeline: PipelineSettings,

    /// Output settings.
    pub output: OutputSettings,
}

/// Pipeline options plus the time zone they run in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    #[serde(flatten)]
    pub options: PipelineOptions,

    /// Fixed UTC offset such as `+09:00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Print JSON instead of text.
    pub json: bool,

    /// PRODID written into `--write-ics` calendars.
    pub prodid: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            json: false,
            prodid: DEFAULT_PRODID.to_string(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calfill")
    }

    /// Returns the configured fixed offset, if any.
    pub fn utc_offset(&self) -> CliResult<Option<FixedOffset>> {
        self.pipeline
            .utc_offset
            .as_deref()
            .map(parse_utc_offset)
            .transpose()
    }

    /// Checks the pipeline options and the offset.
    pub fn validate(&self) -> CliResult<()> {
        self.pipeline.options.validate()?;
        self.utc_offset()?;
        if self.output.prodid.trim().is_empty() {
            return Err(CliError::Config("output.prodid must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Parses `Z`, `UTC`, `+09:00`, `-05:30`, `+0900` or `+09`.
pub fn parse_utc_offset(text: &str) -> CliResult<FixedOffset> {
    let invalid = || CliError::Offset(text.to_string());
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.split_at_checked(1).ok_or_else(invalid)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return Err(invalid()),
    };
    let digits = rest.replace(':', "");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.as_str(), "0"),
        4 => digits.split_at(2),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
