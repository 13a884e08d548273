//! Canonical event ranges and their resolution from text fields.
//!
//! A [`DateRange`] is either an all-day span with an exclusive end date or
//! a timed span between two UTC instants. Both span types refuse empty or
//! inverted intervals at construction, so every range handed to the
//! artifact generators is well formed.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::parse::{ParsedValue, Shape, parse_value, shape_of};

/// Duration applied when a timed event has no usable end.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;

/// An all-day span: `[start, end_exclusive)` in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllDaySpan {
    start: NaiveDate,
    end_exclusive: NaiveDate,
}

impl AllDaySpan {
    /// Creates a span, or `None` unless `end_exclusive` is after `start`.
    pub fn new(start: NaiveDate, end_exclusive: NaiveDate) -> Option<Self> {
        (end_exclusive > start).then_some(Self {
            start,
            end_exclusive,
        })
    }

    /// Creates a span covering only `date`.
    pub fn single_day(date: NaiveDate) -> Option<Self> {
        Self::new(date, date.succ_opt()?)
    }

    /// First included day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The day after the last included day.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end_exclusive
    }

    /// Last included day.
    pub fn last_day(&self) -> NaiveDate {
        self.end_exclusive.pred_opt().unwrap_or(self.start)
    }

    /// Number of included days, at least one.
    pub fn days(&self) -> i64 {
        (self.end_exclusive - self.start).num_days()
    }
}

/// A timed span: `[start, end)` as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimedSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimedSpan {
    /// Creates a span, or `None` unless `end` is strictly after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The resolved range of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateRange {
    /// A date span with an exclusive end date.
    AllDay(AllDaySpan),
    /// An instant span in UTC.
    Timed(TimedSpan),
}

impl DateRange {
    /// Returns `true` for all-day ranges.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the all-day span, if this is one.
    pub fn as_all_day(&self) -> Option<&AllDaySpan> {
        match self {
            Self::AllDay(span) => Some(span),
            Self::Timed(_) => None,
        }
    }

    /// Returns the timed span, if this is one.
    pub fn as_timed(&self) -> Option<&TimedSpan> {
        match self {
            Self::Timed(span) => Some(span),
            Self::AllDay(_) => None,
        }
    }
}

/// Resolves start/end/all-day text fields into a [`DateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeResolver {
    default_duration: Duration,
}

impl Default for RangeResolver {
    fn default() -> Self {
        Self {
            default_duration: Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES),
        }
    }
}

impl RangeResolver {
    /// Creates a resolver with the default one hour duration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the duration used when a timed event has no usable end.
    #[must_use]
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Resolves the fields into a range.
    ///
    /// - `all_day == Some(true)` forces an all-day range, `Some(false)` a
    ///   timed one; `None` picks all-day only when `start` and any end are
    ///   dates.
    /// - A provided all-day end is the last included day.
    /// - A timed end that is missing, unparseable, or not after the start is
    ///   replaced by `start + default_duration`.
    /// - Offset-less values are interpreted in `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when `start` is blank or unparseable.
    pub fn resolve<Tz: TimeZone>(
        &self,
        start: &str,
        end: Option<&str>,
        all_day: Option<bool>,
        tz: &Tz,
    ) -> Result<DateRange, ResolveError> {
        let start_text = start.trim();
        if start_text.is_empty() {
            return Err(ResolveError::EmptyStart);
        }

        let start_value = parse_value(start_text, tz)
            .ok_or_else(|| ResolveError::UnparseableStart(start_text.to_string()))?;
        let end_value = end
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .and_then(|text| parse_end(text, tz));

        let all_day = all_day.unwrap_or_else(|| {
            start_value.is_date_only() && end_value.is_none_or(|end| end.is_date_only())
        });

        let range = if all_day {
            self.resolve_all_day(&start_value, end_value.as_ref())
        } else {
            self.resolve_timed(&start_value, end_value.as_ref(), tz)
        };
        range.ok_or_else(|| ResolveError::OutOfRange(start_text.to_string()))
    }

    fn resolve_all_day(&self, start: &ParsedValue, end: Option<&ParsedValue>) -> Option<DateRange> {
        let start_date = start.date();
        let explicit = end.and_then(|end| {
            let span = end
                .date()
                .succ_opt()
                .and_then(|end_exclusive| AllDaySpan::new(start_date, end_exclusive));
            if span.is_none() {
                debug!(start = %start_date, end = %end.date(), "all-day end precedes start, using a single day");
            }
            span
        });
        explicit
            .or_else(|| AllDaySpan::single_day(start_date))
            .map(DateRange::AllDay)
    }

    fn resolve_timed<Tz: TimeZone>(
        &self,
        start: &ParsedValue,
        end: Option<&ParsedValue>,
        tz: &Tz,
    ) -> Option<DateRange> {
        let start_instant = start.to_instant(tz)?;
        let end_instant = match end.and_then(|end| end.to_instant(tz)) {
            Some(end_instant) if end_instant > start_instant => end_instant,
            Some(end_instant) => {
                debug!(
                    start = %start_instant,
                    end = %end_instant,
                    "end is not after start, applying default duration"
                );
                start_instant.checked_add_signed(self.default_duration)?
            }
            None => start_instant.checked_add_signed(self.default_duration)?,
        };
        TimedSpan::new(start_instant, end_instant).map(DateRange::Timed)
    }
}

/// Parses a caller-supplied end, dropping values that cannot be used.
fn parse_end<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<ParsedValue> {
    if shape_of(text) == Some(Shape::Time) {
        // A bare time has no date to attach to outside of a split.
        warn!(end = text, "ignoring time-only end without a date");
        return None;
    }
    let value = parse_value(text, tz);
    if value.is_none() {
        warn!(end = text, "ignoring unparseable end");
    }
    value
}
