//! Core of calfill: event records in, calendar artifacts out.
//!
//! A raw record is normalized, its start field is split when it carries a
//! whole range, the range is resolved against a caller-supplied time zone,
//! and the result is rendered as display text, a calendar link and an
//! iCalendar `VEVENT` fragment.

pub mod artifacts;
pub mod error;
pub mod ics;
pub mod link;
pub mod parse;
pub mod range;
pub mod record;
pub mod split;
pub mod tracing;

pub use artifacts::{
    ArtifactRequest, CalendarArtifacts, Pipeline, PipelineOptions, PreparedEvent, event_text,
};
pub use error::{ArtifactError, ArtifactKind, OptionsError, ResolveError};
pub use ics::{DEFAULT_PRODID, event_fragment, wrap_calendar};
pub use link::{DEFAULT_LINK_BASE, calendar_link};
pub use parse::{ParsedValue, Shape, parse_value};
pub use range::{AllDaySpan, DateRange, RangeResolver, TimedSpan};
pub use record::{DEFAULT_TITLE, EventDetails, NormalizedEvent, RawEventRecord, normalize};
pub use split::{RangeSplitter, SplitOutcome, SplitRule};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
