//! Date and time parsing for loosely formatted event fields.
//!
//! Upstream extractors mix ISO-8601 instants, space separated date-times,
//! slash dates and Japanese `年月日` dates. Everything here returns `None`
//! on malformed input; a parse failure is an ordinary outcome, not an error.
//!
//! Accepted shapes, tried in order:
//! - RFC 3339 instants (`2025-12-16T14:00:00+09:00`)
//! - `YYYY-MM-DD[T| ]HH:MM[:SS][offset]`, where the date part may also be
//!   `YYYY/MM/DD` or `YYYY年M月D日`; without an offset the wall time is
//!   resolved in the injected time zone. Numeric offsets are only read
//!   after a `T`, so `2025-12-16 14:00-15:00` stays a range.
//! - date-only `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY年M月D日`
//! - time-only `H:MM[:SS]`, only through [`parse_time_only`] / [`shape_of`]

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::trace;

/// The date part shared by every date-bearing pattern.
const DATE_PATTERN: &str = r"(?P<year>\d{4})(?:[-/](?P<month>\d{1,2})[-/](?P<day>\d{1,2})|年\s*(?P<jmonth>\d{1,2})\s*月\s*(?P<jday>\d{1,2})\s*日)";

/// The clock part shared by date-time and time-only patterns.
const TIME_PATTERN: &str = r"(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2})(?:\.\d+)?)?";

static DATE_ONLY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{DATE_PATTERN}$")).expect("Invalid date regex"));

static DATE_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^{DATE_PATTERN}(?P<sep>[Tt]|\s*){TIME_PATTERN}\s*(?P<offset>[Zz]|[+-]\d{{2}}:?\d{{2}})?$"
    ))
    .expect("Invalid date-time regex")
});

static TIME_ONLY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{TIME_PATTERN}$")).expect("Invalid time regex"));

static DATE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{DATE_PATTERN}")).expect("Invalid date prefix regex"));

/// A successfully parsed date or date-time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParsedValue {
    /// A calendar date without a time component.
    Date(NaiveDate),
    /// A date-time, keeping the offset it was written in (or resolved to).
    DateTime(DateTime<FixedOffset>),
}

impl ParsedValue {
    /// Returns `true` if the value has no time component.
    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the calendar date as written.
    ///
    /// For date-times this is the wall-clock date in the value's own offset,
    /// not the UTC date.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(dt) => dt.date_naive(),
        }
    }

    /// Converts the value to an absolute instant.
    ///
    /// Dates become local midnight in `tz`. Returns `None` when midnight does
    /// not exist in `tz` on that date.
    pub fn to_instant<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt.with_timezone(&Utc)),
            Self::Date(date) => resolve_local(date.and_time(NaiveTime::MIN), tz)
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// The syntactic shape of a field, independent of any time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A date without time.
    Date,
    /// A date with a clock time, with or without offset.
    DateTime,
    /// A clock time with no date.
    Time,
}

/// Intermediate parse result before time zone resolution.
enum Naive {
    Date(NaiveDate),
    DateTime(NaiveDateTime, Option<FixedOffset>),
    Instant(DateTime<FixedOffset>),
    Time(NaiveTime),
}

/// Parses a field into a date or date-time.
///
/// Offset-less date-times are interpreted in `tz`. Time-only values are
/// rejected here; use [`parse_time_only`] where a bare time is meaningful.
pub fn parse_value<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<ParsedValue> {
    let value = match parse_naive(text)? {
        Naive::Instant(dt) => ParsedValue::DateTime(dt),
        Naive::DateTime(naive, Some(offset)) => {
            ParsedValue::DateTime(offset.from_local_datetime(&naive).single()?)
        }
        Naive::DateTime(naive, None) => match resolve_local(naive, tz) {
            Some(dt) => ParsedValue::DateTime(dt),
            None => {
                trace!(text, "local time does not exist in the processing time zone");
                return None;
            }
        },
        Naive::Date(date) => ParsedValue::Date(date),
        Naive::Time(_) => {
            trace!(text, "time-only value outside of a time-only context");
            return None;
        }
    };
    Some(value)
}

/// Parses a bare clock time such as `15:00` or `9:30:15`.
pub fn parse_time_only(text: &str) -> Option<NaiveTime> {
    let caps = TIME_ONLY_REGEX.captures(text.trim())?;
    time_from_captures(&caps)
}

/// Classifies a field without resolving it against a time zone.
///
/// Returns `None` when the text matches no known shape or names an
/// impossible date or time (`2025-02-30`, `25:00`).
pub fn shape_of(text: &str) -> Option<Shape> {
    match parse_naive(text)? {
        Naive::Date(_) => Some(Shape::Date),
        Naive::DateTime(..) | Naive::Instant(_) => Some(Shape::DateTime),
        Naive::Time(_) => Some(Shape::Time),
    }
}

/// Returns the leading date portion of a date or date-time string.
///
/// `"2025-12-16 14:00"` yields `"2025-12-16"`; text that does not start with
/// a valid date yields `None`.
pub fn date_prefix(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let caps = DATE_PREFIX_REGEX.captures(text)?;
    date_from_captures(&caps)?;
    caps.get(0).map(|m| m.as_str())
}

fn parse_naive(text: &str) -> Option<Naive> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // chrono also accepts a space here, which would turn `10:00:00-11:00`
    // into a UTC-11 instant.
    if has_rfc3339_separator(text)
        && let Ok(dt) = DateTime::parse_from_rfc3339(text)
    {
        trace!(text, "parsed RFC 3339 instant");
        return Some(Naive::Instant(dt));
    }

    if let Some(caps) = DATE_TIME_REGEX.captures(text) {
        let date = date_from_captures(&caps)?;
        let time = time_from_captures(&caps)?;
        let offset = match caps.name("offset") {
            Some(m) if is_numeric_offset(m.as_str()) && !has_iso_separator(&caps) => {
                trace!(text, "numeric suffix without T separator");
                return None;
            }
            Some(m) => Some(parse_offset(m.as_str())?),
            None => None,
        };
        trace!(text, has_offset = offset.is_some(), "parsed date-time");
        return Some(Naive::DateTime(date.and_time(time), offset));
    }

    if let Some(caps) = DATE_ONLY_REGEX.captures(text) {
        trace!(text, "parsed date");
        return date_from_captures(&caps).map(Naive::Date);
    }

    if let Some(caps) = TIME_ONLY_REGEX.captures(text) {
        trace!(text, "parsed time-only value");
        return time_from_captures(&caps).map(Naive::Time);
    }

    trace!(text, "no date or time shape matched");
    None
}

/// Resolves a wall-clock time in `tz`, taking the earlier instant on folds.
fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

fn date_from_captures(caps: &Captures<'_>) -> Option<NaiveDate> {
    let year = caps.name("year")?.as_str().parse().ok()?;
    let month = caps
        .name("month")
        .or_else(|| caps.name("jmonth"))?
        .as_str()
        .parse()
        .ok()?;
    let day = caps
        .name("day")
        .or_else(|| caps.name("jday"))?
        .as_str()
        .parse()
        .ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn time_from_captures(caps: &Captures<'_>) -> Option<NaiveTime> {
    let hour = caps.name("hour")?.as_str().parse().ok()?;
    let minute = caps.name("minute")?.as_str().parse().ok()?;
    let second = match caps.name("second") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// `YYYY-MM-DD` followed by `T` or `t`.
fn has_rfc3339_separator(text: &str) -> bool {
    matches!(text.as_bytes().get(10), Some(b'T' | b't'))
}

fn is_numeric_offset(text: &str) -> bool {
    !text.eq_ignore_ascii_case("z")
}

fn has_iso_separator(caps: &Captures<'_>) -> bool {
    caps.name("sep")
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("t"))
}

/// Parses `Z`, `+09:00` or `-0530`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, digits) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits = digits.replace(':', "");
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod parse_value {
        use super::*;

        #[test]
        fn rfc3339_with_offset() {
            let value = parse_value("2025-12-16T14:00:00+09:00", &Utc).unwrap();
            assert!(!value.is_date_only());
            assert_eq!(value.date(), date(2025, 12, 16));
            assert_eq!(value.to_instant(&Utc), Some(utc(2025, 12, 16, 5, 0, 0)));
        }

        #[test]
        fn rfc3339_utc_suffix() {
            let value = parse_value("2025-12-16T05:00:00Z", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 16, 5, 0, 0)));
        }

        #[test]
        fn offset_without_seconds() {
            let value = parse_value("2025-12-16T14:00+09:00", &Utc).unwrap();
            assert_eq!(value.to_instant(&Utc), Some(utc(2025, 12, 16, 5, 0, 0)));
        }

        #[test]
        fn space_separated_uses_injected_zone() {
            let value = parse_value("2025-12-16 14:00", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 16, 5, 0, 0)));

            let value = parse_value("2025-12-16 14:00", &Utc).unwrap();
            assert_eq!(value.to_instant(&Utc), Some(utc(2025, 12, 16, 14, 0, 0)));
        }

        #[test]
        fn seconds_are_kept() {
            let value = parse_value("2025-12-16 14:00:30", &Utc).unwrap();
            let ParsedValue::DateTime(dt) = value else {
                panic!("expected date-time");
            };
            assert_eq!(dt.second(), 30);
        }

        #[test]
        fn slash_and_japanese_date_times() {
            let expected = Some(utc(2025, 12, 16, 5, 0, 0));
            let slash = parse_value("2025/12/16 14:00", &jst()).unwrap();
            assert_eq!(slash.to_instant(&jst()), expected);

            let japanese = parse_value("2025年12月16日 14:00", &jst()).unwrap();
            assert_eq!(japanese.to_instant(&jst()), expected);

            let japanese_tight = parse_value("2025年12月16日14:00", &jst()).unwrap();
            assert_eq!(japanese_tight.to_instant(&jst()), expected);
        }

        #[test]
        fn date_only_forms() {
            for text in ["2025-12-16", "2025/12/16", "2025年12月16日", "2025年 12月 16日"] {
                let value = parse_value(text, &jst()).unwrap();
                assert_eq!(value, ParsedValue::Date(date(2025, 12, 16)), "{text}");
            }
        }

        #[test]
        fn unpadded_date() {
            let value = parse_value("2025-1-5", &Utc).unwrap();
            assert_eq!(value, ParsedValue::Date(date(2025, 1, 5)));
        }

        #[test]
        fn date_only_instant_is_local_midnight() {
            let value = parse_value("2025-12-16", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 15, 15, 0, 0)));
        }

        #[test]
        fn surrounding_whitespace_is_ignored() {
            let value = parse_value("  2025-12-16  ", &Utc).unwrap();
            assert_eq!(value, ParsedValue::Date(date(2025, 12, 16)));
        }

        #[test]
        fn rejects_time_only() {
            assert_eq!(parse_value("15:00", &Utc), None);
        }

        #[test]
        fn rejects_free_text() {
            assert_eq!(parse_value("来週のいつか", &Utc), None);
            assert_eq!(parse_value("next tuesday", &Utc), None);
            assert_eq!(parse_value("", &Utc), None);
            assert_eq!(parse_value("   ", &Utc), None);
        }

        #[test]
        fn rejects_impossible_values() {
            assert_eq!(parse_value("2025-02-30", &Utc), None);
            assert_eq!(parse_value("2025-13-01", &Utc), None);
            assert_eq!(parse_value("2025-12-16 25:00", &Utc), None);
            assert_eq!(parse_value("2025-12-16 14:61", &Utc), None);
        }

        #[test]
        fn rejects_unfinished_ranges() {
            assert_eq!(parse_value("2025-12-16 14:00〜15:00", &Utc), None);
            assert_eq!(parse_value("2025-12-16 14:00-15:00", &Utc), None);
            assert_eq!(parse_value("2025/12/16 9:00 - 10:00", &Utc), None);
            assert_eq!(parse_value("2025-12-16 - 2025-12-17", &Utc), None);
        }
    }

    mod shapes {
        use super::*;

        #[test]
        fn classifies_each_shape() {
            assert_eq!(shape_of("2025-12-16"), Some(Shape::Date));
            assert_eq!(shape_of("2025年12月16日"), Some(Shape::Date));
            assert_eq!(shape_of("2025-12-16 14:00"), Some(Shape::DateTime));
            assert_eq!(shape_of("2025-12-16T14:00:00Z"), Some(Shape::DateTime));
            assert_eq!(shape_of("15:00"), Some(Shape::Time));
            assert_eq!(shape_of("9:05:30"), Some(Shape::Time));
            assert_eq!(shape_of("afternoon"), None);
            assert_eq!(shape_of("24:30"), None);
        }

        #[test]
        fn time_only() {
            assert_eq!(parse_time_only("15:00"), NaiveTime::from_hms_opt(15, 0, 0));
            assert_eq!(parse_time_only(" 9:30:15 "), NaiveTime::from_hms_opt(9, 30, 15));
            assert_eq!(parse_time_only("2025-12-16 15:00"), None);
            assert_eq!(parse_time_only("15"), None);
        }
    }

    mod prefix {
        use super::*;

        #[test]
        fn extracts_leading_date() {
            assert_eq!(date_prefix("2025-12-16 14:00"), Some("2025-12-16"));
            assert_eq!(date_prefix("2025/12/16 14:00"), Some("2025/12/16"));
            assert_eq!(date_prefix("2025年12月16日 14:00"), Some("2025年12月16日"));
            assert_eq!(date_prefix("2025-12-16T14:00:00"), Some("2025-12-16"));
        }

        #[test]
        fn rejects_missing_or_invalid_date() {
            assert_eq!(date_prefix("14:00"), None);
            assert_eq!(date_prefix("tomorrow 14:00"), None);
            assert_eq!(date_prefix("2025-02-30 14:00"), None);
        }
    }

    mod offsets {
        use super::*;

        #[test]
        fn parses_offset_spellings() {
            assert_eq!(parse_offset("Z"), FixedOffset::east_opt(0));
            assert_eq!(parse_offset("+09:00"), FixedOffset::east_opt(9 * 3600));
            assert_eq!(parse_offset("-0530"), FixedOffset::west_opt(5 * 3600 + 30 * 60));
            assert_eq!(parse_offset("+25:00"), None);
            assert_eq!(parse_offset("09:00"), None);
        }

        #[test]
        fn explicit_offset_overrides_injected_zone() {
            let value = parse_value("2025-12-16T14:00 -05:00", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 16, 19, 0, 0)));

            let value = parse_value("2025-12-16 14:00Z", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 16, 14, 0, 0)));
        }

        #[test]
        fn numeric_suffix_needs_iso_separator() {
            assert_eq!(shape_of("2025-12-16 14:00-17:00"), None);
            assert_eq!(shape_of("2025-12-16 10:00:00-11:00"), None);
            assert_eq!(shape_of("2025-12-16 10:00:00+09:00"), None);
            assert_eq!(shape_of("2025-12-16T14:00-05:00"), Some(Shape::DateTime));
            assert_eq!(shape_of("2025-12-16t10:00:00-11:00"), Some(Shape::DateTime));
        }

        #[test]
        fn space_separated_utc_suffix_still_parses() {
            let value = parse_value("2025-12-16 10:00:00Z", &jst()).unwrap();
            assert_eq!(value.to_instant(&jst()), Some(utc(2025, 12, 16, 10, 0, 0)));
        }
    }
}
