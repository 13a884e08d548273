//! Pre-filled "create event" links for web calendars.
//!
//! The link carries `action=TEMPLATE`, `text`, `dates=<start>/<end>` and the
//! optional `details` and `location` parameters. Date tokens are `YYYYMMDD`
//! for all-day ranges (end exclusive) and `YYYYMMDDTHHMMSSZ` in UTC for
//! timed ranges.
//!
//! # Example
//!
//! ```
//! use calfill_core::link::{calendar_link, DEFAULT_LINK_BASE};
//! use calfill_core::range::{AllDaySpan, DateRange};
//! use calfill_core::EventDetails;
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2025, 12, 16).unwrap();
//! let range = DateRange::AllDay(AllDaySpan::single_day(day).unwrap());
//! let details = EventDetails::new("Offsite");
//! let link = calendar_link(DEFAULT_LINK_BASE, &details, &range);
//! assert!(link.ends_with("dates=20251216%2F20251217"));
//! ```

use urlencoding::encode;

use crate::range::DateRange;
use crate::record::{DEFAULT_TITLE, EventDetails};

/// Google Calendar's event template endpoint.
pub const DEFAULT_LINK_BASE: &str = "https://calendar.google.com/calendar/render";

const ALL_DAY_TOKEN_FORMAT: &str = "%Y%m%d";
const TIMED_TOKEN_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Formats the `(start, end)` tokens of the `dates` parameter.
pub fn date_tokens(range: &DateRange) -> (String, String) {
    match range {
        DateRange::AllDay(span) => (
            span.start().format(ALL_DAY_TOKEN_FORMAT).to_string(),
            span.end_exclusive().format(ALL_DAY_TOKEN_FORMAT).to_string(),
        ),
        DateRange::Timed(span) => (
            span.start().format(TIMED_TOKEN_FORMAT).to_string(),
            span.end().format(TIMED_TOKEN_FORMAT).to_string(),
        ),
    }
}

/// Builds a calendar link for `details` over `range`.
///
/// Every parameter value is percent-encoded. A blank title falls back to
/// [`DEFAULT_TITLE`]; blank location and description are omitted.
pub fn calendar_link(base_url: &str, details: &EventDetails<'_>, range: &DateRange) -> String {
    let title = match details.title.trim() {
        "" => DEFAULT_TITLE,
        title => title,
    };
    let (start, end) = date_tokens(range);

    let mut params = vec![
        ("action", "TEMPLATE".to_string()),
        ("text", title.to_string()),
        ("dates", format!("{start}/{end}")),
    ];
    if let Some(description) = non_blank(details.description) {
        params.push(("details", description.to_string()));
    }
    if let Some(location) = non_blank(details.location) {
        params.push(("location", location.to_string()));
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{query}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
