//! Core error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a start/end pair could not be turned into a [`DateRange`](crate::range::DateRange).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The start field was empty after trimming.
    #[error("start is empty")]
    EmptyStart,

    /// The start field matched no known date or time shape.
    #[error("start could not be parsed: {0:?}")]
    UnparseableStart(String),

    /// The resolved range falls outside the representable calendar.
    #[error("date range is out of range: {0:?}")]
    OutOfRange(String),
}

/// The artifacts the pipeline can produce from a resolved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Pre-filled web calendar link.
    CalendarLink,
    /// iCalendar `VEVENT` fragment.
    CalendarFile,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalendarLink => f.write_str("calendar link"),
            Self::CalendarFile => f.write_str("calendar file"),
        }
    }
}

/// A requested artifact that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// No date range could be resolved from the event's start/end text.
    #[error(
        "Could not create the {artifact}: the date could not be parsed (start: {start:?}, end: {})",
        end.as_deref().map_or_else(|| "none".to_string(), |end| format!("{end:?}"))
    )]
    UnresolvedDate {
        artifact: ArtifactKind,
        start: String,
        end: Option<String>,
    },
}

impl ArtifactError {
    /// Creates an unresolved-date error echoing the raw start/end values.
    pub fn unresolved_date(
        artifact: ArtifactKind,
        start: impl Into<String>,
        end: Option<impl Into<String>>,
    ) -> Self {
        Self::UnresolvedDate {
            artifact,
            start: start.into(),
            end: end.map(Into::into),
        }
    }

    /// Returns the artifact this error belongs to.
    pub fn artifact(&self) -> ArtifactKind {
        match self {
            Self::UnresolvedDate { artifact, .. } => *artifact,
        }
    }
}

/// Invalid pipeline options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// The link base is not an absolute http(s) URL.
    #[error("invalid calendar link base URL {url:?}: {reason}")]
    LinkBaseUrl { url: String, reason: String },

    /// The default duration is zero or negative.
    #[error("default duration must be positive, got {0} minutes")]
    DefaultDuration(i64),

    /// The placeholder title is blank.
    #[error("placeholder title must not be blank")]
    PlaceholderTitle,
}
