//! The end-to-end pipeline: normalize, split, resolve, render.
//!
//! [`Pipeline::run`] turns an untrusted [`RawEventRecord`] into
//! [`CalendarArtifacts`]. The event text is always produced; the calendar
//! link and file fragment need a resolved [`DateRange`] and each reports its
//! own failure without affecting the other.
//!
//! # Example
//!
//! ```
//! use calfill_core::{ArtifactRequest, Pipeline, PipelineOptions, RawEventRecord};
//! use chrono::FixedOffset;
//!
//! let tz = FixedOffset::east_opt(9 * 3600).unwrap();
//! let record = RawEventRecord::new("Design review", "2025-12-16 14:00〜15:00");
//! let artifacts = Pipeline::new(PipelineOptions::default())
//!     .run(&record, ArtifactRequest::all(), &tz);
//!
//! assert!(artifacts.errors.is_empty());
//! assert!(artifacts.calendar_link.unwrap().contains("20251216T050000Z%2F20251216T060000Z"));
//! ```

use chrono::{Duration, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};
use url::Url;

use crate::error::{ArtifactError, ArtifactKind, OptionsError};
use crate::ics::event_fragment;
use crate::link::{DEFAULT_LINK_BASE, calendar_link};
use crate::range::{DEFAULT_EVENT_DURATION_MINUTES, DateRange, RangeResolver};
use crate::record::{DEFAULT_TITLE, NormalizedEvent, RawEventRecord, normalize};
use crate::split::{RangeSplitter, SplitOutcome};


/// Tunable pipeline behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Title substituted for blank titles.
    pub placeholder_title: String,
    /// Duration of timed events without a usable end.
    pub default_duration_minutes: i64,
    /// Endpoint the calendar link parameters are appended to.
    pub link_base_url: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            placeholder_title: DEFAULT_TITLE.to_string(),
            default_duration_minutes: DEFAULT_EVENT_DURATION_MINUTES,
            link_base_url: DEFAULT_LINK_BASE.to_string(),
        }
    }
}

impl PipelineOptions {
    /// Builder: set the placeholder title.
    #[must_use]
    pub fn with_placeholder_title(mut self, title: impl Into<String>) -> Self {
        self.placeholder_title = title.into();
        self
    }

    /// Builder: set the default duration in minutes.
    #[must_use]
    pub fn with_default_duration_minutes(mut self, minutes: i64) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Builder: set the calendar link endpoint.
    #[must_use]
    pub fn with_link_base_url(mut self, url: impl Into<String>) -> Self {
        self.link_base_url = url.into();
        self
    }

    /// Checks the options for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid option found.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.placeholder_title.trim().is_empty() {
            return Err(OptionsError::PlaceholderTitle);
        }
        if self.default_duration_minutes <= 0 {
            return Err(OptionsError::DefaultDuration(self.default_duration_minutes));
        }
        let url = Url::parse(&self.link_base_url).map_err(|e| OptionsError::LinkBaseUrl {
            url: self.link_base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OptionsError::LinkBaseUrl {
                url: self.link_base_url.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        Ok(())
    }
}

/// Which optional artifacts the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRequest {
    pub link: bool,
    pub file: bool,
}

impl Default for ArtifactRequest {
    fn default() -> Self {
        Self::all()
    }
}

impl ArtifactRequest {
    /// Both the link and the file fragment.
    pub fn all() -> Self {
        Self {
            link: true,
            file: true,
        }
    }

    /// Only the event text.
    pub fn text_only() -> Self {
        Self {
            link: false,
            file: false,
        }
    }

    pub fn link_only() -> Self {
        Self {
            link: true,
            file: false,
        }
    }

    pub fn file_only() -> Self {
        Self {
            link: false,
            file: true,
        }
    }
}

/// Everything produced for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarArtifacts {
    /// Human-readable summary, always present.
    pub event_text: String,
    /// Present when requested and a range was resolved.
    pub calendar_link: Option<String>,
    /// Present when requested and a range was resolved.
    pub file_fragment: Option<String>,
    /// One message per requested artifact that could not be produced.
    pub errors: Vec<String>,
}

/// Intermediate state of the pipeline for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedEvent {
    /// Fields after trimming and defaulting, before splitting.
    pub normalized: NormalizedEvent,
    /// The normalized event with start/end/all-day revised by the splitter.
    pub split: NormalizedEvent,
    /// Rule that split the start field, if any.
    pub split_rule: Option<&'static str>,
    /// The resolved range, if any.
    pub range: Option<DateRange>,
}

impl PreparedEvent {
    /// Renders the human-readable event text.
    pub fn event_text(&self) -> String {
        event_text(&self.normalized)
    }

    /// Builds the calendar link, or reports why it cannot be built.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::UnresolvedDate`] when no range was resolved.
    pub fn calendar_link(&self, base_url: &str) -> Result<String, ArtifactError> {
        let range = self.require_range(ArtifactKind::CalendarLink)?;
        Ok(calendar_link(base_url, &self.split.details(), range))
    }

    /// Builds the iCalendar `VEVENT` fragment, or reports why it cannot be built.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::UnresolvedDate`] when no range was resolved.
    pub fn file_fragment(&self) -> Result<String, ArtifactError> {
        let range = self.require_range(ArtifactKind::CalendarFile)?;
        Ok(event_fragment(&self.split.details(), range))
    }

    fn require_range(&self, artifact: ArtifactKind) -> Result<&DateRange, ArtifactError> {
        self.range.as_ref().ok_or_else(|| {
            ArtifactError::unresolved_date(
                artifact,
                self.normalized.start.as_str(),
                self.normalized.end.as_deref(),
            )
        })
    }
}

/// The configured pipeline. Cheap to build and stateless between calls.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    splitter: RangeSplitter,
    resolver: RangeResolver,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl Pipeline {
    /// Creates a pipeline with the default splitting rules.
    ///
    /// A non-positive default duration falls back to one hour; use
    /// [`PipelineOptions::validate`] to reject such options up front.
    pub fn new(options: PipelineOptions) -> Self {
        let minutes = if options.default_duration_minutes > 0 {
            options.default_duration_minutes
        } else {
            DEFAULT_EVENT_DURATION_MINUTES
        };
        let resolver = RangeResolver::new().with_default_duration(Duration::minutes(minutes));
        Self {
            options,
            splitter: RangeSplitter::default(),
            resolver,
        }
    }

    /// Builder: replace the splitter, e.g. to add custom rules.
    #[must_use]
    pub fn with_splitter(mut self, splitter: RangeSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Normalizes, splits and resolves a record without rendering anything.
    ///
    /// Offset-less dates and times are interpreted in `tz`.
    pub fn prepare<Tz: TimeZone>(&self, raw: &RawEventRecord, tz: &Tz) -> PreparedEvent {
        let normalized = normalize(raw, &self.options.placeholder_title);

        let SplitOutcome { fields, rule } = self.splitter.split(
            &normalized.start,
            normalized.end.as_deref(),
            normalized.all_day,
        );
        let split = NormalizedEvent {
            start: fields.start,
            end: fields.end,
            all_day: fields.all_day,
            ..normalized.clone()
        };

        let range = match self
            .resolver
            .resolve(&split.start, split.end.as_deref(), split.all_day, tz)
        {
            Ok(range) => Some(range),
            Err(e) => {
                debug!(error = %e, start = %split.start, end = ?split.end, "no date range resolved");
                None
            }
        };

        PreparedEvent {
            normalized,
            split,
            split_rule: rule,
            range,
        }
    }

    /// Runs the whole pipeline and renders the requested artifacts.
    pub fn run<Tz: TimeZone>(
        &self,
        raw: &RawEventRecord,
        request: ArtifactRequest,
        tz: &Tz,
    ) -> CalendarArtifacts {
        let _span = info_span!("calfill_pipeline").entered();
        let prepared = self.prepare(raw, tz);

        let mut errors = Vec::new();
        let calendar_link = if request.link {
            collect(prepared.calendar_link(&self.options.link_base_url), &mut errors)
        } else {
            None
        };
        let file_fragment = if request.file {
            collect(prepared.file_fragment(), &mut errors)
        } else {
            None
        };

        debug!(
            split_rule = ?prepared.split_rule,
            resolved = prepared.range.is_some(),
            errors = errors.len(),
            "pipeline finished"
        );

        CalendarArtifacts {
            event_text: prepared.event_text(),
            calendar_link,
            file_fragment,
            errors,
        }
    }
}

fn collect(result: Result<String, ArtifactError>, errors: &mut Vec<String>) -> Option<String> {
    result.map_err(|e| errors.push(e.to_string())).ok()
}

/// Renders the human-readable summary of an event.
///
/// Uses the trimmed fields exactly as received, so it never depends on
/// whether the dates could be parsed.
pub fn event_text(event: &NormalizedEvent) -> String {
    let when = match (event.start.as_str(), event.end.as_deref()) {
        ("", None) => "(no date)".to_string(),
        ("", Some(end)) => format!("(no date) - {end}"),
        (start, None) => start.to_string(),
        (start, Some(end)) => format!("{start} - {end}"),
    };

    let mut lines = vec![format!("Title: {}", event.title), format!("When: {when}")];
    if let Some(ref location) = event.location {
        lines.push(format!("Location: {location}"));
    }
    if let Some(ref description) = event.description {
        lines.push(format!("Description: {description}"));
    }
    if event.all_day == Some(true) {
        lines.push("All day: yes".to_string());
    }
    lines.join("\n")
}
