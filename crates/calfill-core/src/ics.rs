//! iCalendar (RFC 5545) event fragments.
//!
//! [`event_fragment`] builds a single `VEVENT` with the `icalendar` crate and
//! returns its block with CRLF line endings. All-day ranges use `VALUE=DATE`
//! with an exclusive `DTEND`; timed ranges use UTC date-times. Text escaping
//! and line folding are done by `icalendar`.

use std::hash::{DefaultHasher, Hash, Hasher};

use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::range::DateRange;
use crate::record::{DEFAULT_TITLE, EventDetails};

const CRLF: &str = "\r\n";

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Product identifier used by [`wrap_calendar`] callers that have none.
pub const DEFAULT_PRODID: &str = "-//calfill//calfill//EN";

/// Renders a `BEGIN:VEVENT` … `END:VEVENT` block.
///
/// The output depends only on the arguments: `UID` is derived from the
/// range and the text fields, and `DTSTAMP` is pinned to the start.
pub fn event_fragment(details: &EventDetails<'_>, range: &DateRange) -> String {
    let title = match details.title.trim() {
        "" => DEFAULT_TITLE,
        title => title,
    };
    let location = non_blank(details.location);
    let description = non_blank(details.description);

    let (start, end, all_day) = match range {
        DateRange::AllDay(span) => (
            span.start().format(DATE_FORMAT).to_string(),
            span.end_exclusive().format(DATE_FORMAT).to_string(),
            true,
        ),
        DateRange::Timed(span) => (
            span.start().format(DATE_TIME_FORMAT).to_string(),
            span.end().format(DATE_TIME_FORMAT).to_string(),
            false,
        ),
    };

    let mut hasher = DefaultHasher::new();
    (title, location, description).hash(&mut hasher);
    let uid = format!("{start}-{end}-{:016x}@calfill", hasher.finish());
    let stamp = if all_day {
        format!("{start}T000000Z")
    } else {
        start.clone()
    };

    let mut event = icalendar::Event::new();
    event.uid(&uid);
    event.add_property("DTSTAMP", &stamp);
    add_date_property(&mut event, "DTSTART", start, all_day);
    add_date_property(&mut event, "DTEND", end, all_day);
    event.summary(&text_value(title));
    if let Some(location) = location {
        event.location(&text_value(location));
    }
    if let Some(description) = description {
        event.description(&text_value(description));
    }

    let mut calendar = Calendar::new();
    calendar.push(event.done());
    component_block(&calendar.to_string(), "VEVENT")
}

/// Wraps one or more `VEVENT` fragments in a `VCALENDAR` envelope.
///
/// The envelope comes from `icalendar`; only its `PRODID` is replaced.
pub fn wrap_calendar(fragment: &str, prodid: &str) -> String {
    let prodid = prodid.replace(['\r', '\n'], " ");
    let envelope = Calendar::new().done().to_string();

    let mut out = String::with_capacity(envelope.len() + fragment.len());
    for line in envelope.lines() {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(&prodid);
            out.push_str(CRLF);
            continue;
        }
        if line == "END:VCALENDAR" {
            out.push_str(fragment);
            if !fragment.is_empty() && !fragment.ends_with(CRLF) {
                out.push_str(CRLF);
            }
        }
        out.push_str(line);
        out.push_str(CRLF);
    }
    out
}

fn add_date_property(event: &mut icalendar::Event, name: &str, value: String, all_day: bool) {
    if all_day {
        let mut prop = Property::new(name, value);
        prop.append_parameter(ValueType::Date);
        event.append_property(prop);
    } else {
        event.add_property(name, value);
    }
}

/// Lines from `BEGIN:<kind>` through `END:<kind>`, CRLF terminated.
fn component_block(ics: &str, kind: &str) -> String {
    let begin = format!("BEGIN:{kind}");
    let end = format!("END:{kind}");

    let mut out = String::with_capacity(ics.len());
    let mut inside = false;
    for line in ics.lines() {
        if line == begin {
            inside = true;
        }
        if inside {
            out.push_str(line);
            out.push_str(CRLF);
        }
        if line == end {
            inside = false;
        }
    }
    out
}

/// `icalendar` escapes `\n` only, so every line break is handed over in
/// that form.
fn text_value(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
