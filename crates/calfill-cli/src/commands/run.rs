//! The default command: read a record, build and print its artifacts.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use calfill_core::{
    CalendarArtifacts, Pipeline, PipelineOptions, RawEventRecord, wrap_calendar,
};
use chrono::{FixedOffset, Local};
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{CliConfig, parse_utc_offset};
use crate::error::{CliError, CliResult};

/// Runs the pipeline and prints the result.
pub fn run(cli: &Cli, config: &CliConfig) -> CliResult<()> {
    let artifacts = execute(cli, config)?;

    if cli.json || config.output.json {
        let json = serde_json::to_string_pretty(&artifacts).map_err(CliError::Output)?;
        println!("{json}");
    } else {
        print!("{}", render_text(&artifacts));
    }
    for error in &artifacts.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

/// Builds the artifacts and writes `--write-ics`, without printing.
pub fn execute(cli: &Cli, config: &CliConfig) -> CliResult<CalendarArtifacts> {
    let options = effective_options(cli, config);
    options.validate()?;
    let offset = effective_offset(cli, config)?;

    let record = read_record(cli.input_path().map(|p| p.as_path()))?;
    let pipeline = Pipeline::new(options);
    let request = cli.artifact_request();

    let artifacts = match offset {
        Some(offset) => {
            debug!(%offset, "resolving in fixed offset");
            pipeline.run(&record, request, &offset)
        }
        None => {
            debug!("resolving in local time zone");
            pipeline.run(&record, request, &Local)
        }
    };

    if let Some(ref path) = cli.write_ics {
        match artifacts.file_fragment {
            Some(ref fragment) => write_calendar(path, fragment, &config.output.prodid)?,
            None => warn!(path = %path.display(), "no calendar file fragment, nothing written"),
        }
    }

    Ok(artifacts)
}

/// Config file options with command-line overrides applied.
pub fn effective_options(cli: &Cli, config: &CliConfig) -> PipelineOptions {
    let mut options = config.pipeline.options.clone();
    if let Some(ref title) = cli.placeholder_title {
        options = options.with_placeholder_title(title);
    }
    if let Some(minutes) = cli.default_duration {
        options = options.with_default_duration_minutes(minutes);
    }
    if let Some(ref url) = cli.link_base {
        options = options.with_link_base_url(url);
    }
    options
}

/// `--offset` if given, else `utc_offset` from the config, else `None` for
/// the local time zone.
pub fn effective_offset(cli: &Cli, config: &CliConfig) -> CliResult<Option<FixedOffset>> {
    match cli.offset.as_deref() {
        Some(text) => parse_utc_offset(text).map(Some),
        None => config.utc_offset(),
    }
}

/// Reads a JSON record from `path`, or stdin when `None`.
pub fn read_record(path: Option<&Path>) -> CliResult<RawEventRecord> {
    let text = match path {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_record(&text)
}

/// Parses a JSON record. Unknown keys are ignored.
pub fn parse_record(text: &str) -> CliResult<RawEventRecord> {
    serde_json::from_str(text).map_err(CliError::Record)
}

/// Plain-text rendering: event text, then the link, then the fragment.
pub fn render_text(artifacts: &CalendarArtifacts) -> String {
    let mut out = String::new();
    out.push_str(&artifacts.event_text);
    out.push('\n');
    if let Some(ref link) = artifacts.calendar_link {
        out.push('\n');
        out.push_str(link);
        out.push('\n');
    }
    if let Some(ref fragment) = artifacts.file_fragment {
        out.push('\n');
        out.push_str(&fragment.replace("\r\n", "\n"));
    }
    out
}

fn write_calendar(path: &Path, fragment: &str, prodid: &str) -> CliResult<()> {
    let calendar = wrap_calendar(fragment, prodid);
    fs::write(path, calendar).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote calendar file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn write_input(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("event.json");
        fs::write(&path, json).unwrap();
        path
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("calfill").chain(args.iter().copied()))
    }

    mod records {
        use super::*;

        #[test]
        fn parses_camel_case_record() {
            let record = parse_record(
                r#"{"title": "Sync", "start": "2025-12-16", "allDay": true, "extra": [1, 2]}"#,
            )
            .unwrap();
            assert_eq!(record, RawEventRecord::new("Sync", "2025-12-16").with_all_day(true));
        }

        #[test]
        fn rejects_non_object() {
            assert!(matches!(parse_record("42"), Err(CliError::Record(_))));
            assert!(matches!(parse_record(r#""2025-12-16""#), Err(CliError::Record(_))));
            assert!(matches!(parse_record("not json"), Err(CliError::Record(_))));
        }

        #[test]
        fn missing_input_file() {
            let dir = tempfile::tempdir().unwrap();
            let result = read_record(Some(&dir.path().join("missing.json")));
            assert!(matches!(result, Err(CliError::Read { .. })));
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn flags_override_config() {
            let mut config = CliConfig::default();
            config.pipeline.options.default_duration_minutes = 30;
            config.pipeline.utc_offset = Some("+09:00".to_string());

            let cli = cli(&["--default-duration", "90", "--offset", "-05:00"]);
            assert_eq!(effective_options(&cli, &config).default_duration_minutes, 90);
            assert_eq!(
                effective_offset(&cli, &config).unwrap(),
                FixedOffset::west_opt(5 * 3600)
            );
        }

        #[test]
        fn config_applies_without_flags() {
            let mut config = CliConfig::default();
            config.pipeline.utc_offset = Some("+09:00".to_string());
            config.pipeline.options.placeholder_title = "TBD".to_string();

            let cli = cli(&[]);
            assert_eq!(effective_options(&cli, &config).placeholder_title, "TBD");
            assert_eq!(
                effective_offset(&cli, &config).unwrap(),
                FixedOffset::east_opt(9 * 3600)
            );
        }

        #[test]
        fn no_offset_means_local() {
            assert_eq!(effective_offset(&cli(&[]), &CliConfig::default()).unwrap(), None);
        }
    }

    mod execution {
        use super::*;

        #[test]
        fn builds_all_artifacts_and_writes_calendar() {
            let dir = tempfile::tempdir().unwrap();
            let input = write_input(
                dir.path(),
                r#"{"title": "Sync", "start": "2025-12-16 14:00〜15:00"}"#,
            );
            let ics = dir.path().join("sync.ics");
            let cli = cli(&[
                "--offset",
                "+09:00",
                "--write-ics",
                ics.to_str().unwrap(),
                input.to_str().unwrap(),
            ]);

            let artifacts = execute(&cli, &CliConfig::default()).unwrap();
            assert!(artifacts.errors.is_empty());
            assert!(
                artifacts
                    .calendar_link
                    .unwrap()
                    .contains("dates=20251216T050000Z%2F20251216T060000Z")
            );

            let written = fs::read_to_string(&ics).unwrap();
            assert!(written.starts_with("BEGIN:VCALENDAR\r\n"));
            assert!(written.contains("DTSTART:20251216T050000Z\r\n"));
            assert!(written.ends_with("END:VCALENDAR\r\n"));
        }

        #[test]
        fn unparseable_date_is_not_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let input = write_input(dir.path(), r#"{"title": "Drinks", "start": "来週"}"#);
            let ics = dir.path().join("drinks.ics");
            let cli = cli(&["--write-ics", ics.to_str().unwrap(), input.to_str().unwrap()]);

            let artifacts = execute(&cli, &CliConfig::default()).unwrap();
            assert_eq!(artifacts.errors.len(), 2);
            assert!(artifacts.event_text.contains("Drinks"));
            assert!(!ics.exists());
        }

        #[test]
        fn link_only_skips_fragment() {
            let dir = tempfile::tempdir().unwrap();
            let input = write_input(dir.path(), r#"{"title": "Sync", "start": "2025-12-16"}"#);
            let cli = cli(&["--link-only", "--offset", "Z", input.to_str().unwrap()]);

            let artifacts = execute(&cli, &CliConfig::default()).unwrap();
            assert!(artifacts.calendar_link.is_some());
            assert!(artifacts.file_fragment.is_none());
        }

        #[test]
        fn invalid_option_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let input = write_input(dir.path(), r#"{"title": "Sync", "start": "2025-12-16"}"#);
            let cli = cli(&["--default-duration", "0", input.to_str().unwrap()]);

            let result = execute(&cli, &CliConfig::default());
            assert!(matches!(result, Err(CliError::Options(_))));
        }

        #[test]
        fn invalid_offset_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let input = write_input(dir.path(), r#"{"title": "Sync", "start": "2025-12-16"}"#);
            let cli = cli(&["--offset", "JST", input.to_str().unwrap()]);

            let result = execute(&cli, &CliConfig::default());
            assert!(matches!(result, Err(CliError::Offset(_))));
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn text_output_sections() {
            let artifacts = CalendarArtifacts {
                event_text: "Title: Sync\nWhen: 2025-12-16".to_string(),
                calendar_link: Some("https://example.com/?a=b".to_string()),
                file_fragment: Some("BEGIN:VEVENT\r\nEND:VEVENT\r\n".to_string()),
                errors: Vec::new(),
            };
            assert_eq!(
                render_text(&artifacts),
                "Title: Sync\nWhen: 2025-12-16\n\nhttps://example.com/?a=b\n\nBEGIN:VEVENT\nEND:VEVENT\n"
            );
        }

        #[test]
        fn text_output_without_artifacts() {
            let artifacts = CalendarArtifacts {
                event_text: "Title: Drinks\nWhen: (no date)".to_string(),
                calendar_link: None,
                file_fragment: None,
                errors: vec!["boom".to_string()],
            };
            assert_eq!(render_text(&artifacts), "Title: Drinks\nWhen: (no date)\n");
        }
    }
}
