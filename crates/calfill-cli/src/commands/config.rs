//! Configuration commands.

use std::path::Path;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &CliConfig, source: Option<&Path>) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    let path = source.map_or_else(CliConfig::default_path, Path::to_path_buf);
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &CliConfig) -> CliResult<()> {
    config.validate()?;
    match config.utc_offset()? {
        Some(offset) => println!("Offset-less times resolve in UTC{offset}."),
        None => println!("Offset-less times resolve in the local time zone."),
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(source: Option<&Path>) -> CliResult<()> {
    let config_path = source.map_or_else(CliConfig::default_path, Path::to_path_buf);
    println!("config: {}", config_path.display());
    Ok(())
}
