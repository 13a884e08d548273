//! Raw event records and field normalization.
//!
//! [`RawEventRecord`] is whatever the upstream extractor produced. It is
//! deserialized leniently: missing keys, `null`, numbers where strings were
//! expected and non-boolean `allDay` values are all tolerated.
//! [`normalize`] trims every text field and turns the record into a
//! [`NormalizedEvent`] that always has a title.

use serde::{Deserialize, Deserializer, Serialize};

/// Title used when the record has none.
pub const DEFAULT_TITLE: &str = "(untitled event)";

/// An event record as produced by the extraction step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end: Option<String>,
    /// Only a JSON boolean is kept; anything else reads as unspecified.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub all_day: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

impl RawEventRecord {
    /// Creates a record with a title and start text.
    pub fn new(title: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            start: Some(start.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    #[must_use]
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An event with trimmed text fields and a strict all-day flag.
///
/// `title` is never empty. `start` may be empty, in which case resolution
/// fails later. Optional fields are never `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    /// `Some(true)` for all-day, `None` to infer from the dates.
    ///
    /// Normalization never yields `Some(false)`; direct callers of the
    /// splitter and resolver may pass it to force a timed event.
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl NormalizedEvent {
    /// Borrows the descriptive fields used by the artifact generators.
    pub fn details(&self) -> EventDetails<'_> {
        EventDetails {
            title: &self.title,
            location: self.location.as_deref(),
            description: self.description.as_deref(),
        }
    }
}

/// The descriptive fields rendered into calendar artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDetails<'a> {
    pub title: &'a str,
    pub location: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> EventDetails<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            location: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<&'a str>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<&'a str>) -> Self {
        self.description = description;
        self
    }
}

impl From<&NormalizedEvent> for RawEventRecord {
    fn from(event: &NormalizedEvent) -> Self {
        Self {
            title: Some(event.title.clone()),
            start: Some(event.start.clone()),
            end: event.end.clone(),
            all_day: event.all_day,
            location: event.location.clone(),
            description: event.description.clone(),
        }
    }
}

/// Normalizes a raw record. This never fails.
///
/// A blank title becomes `placeholder_title` (or [`DEFAULT_TITLE`] if that
/// is blank too). `all_day` keeps only an explicit `true`.
pub fn normalize(raw: &RawEventRecord, placeholder_title: &str) -> NormalizedEvent {
    let title = trimmed(raw.title.as_deref())
        .or_else(|| trimmed(Some(placeholder_title)))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    NormalizedEvent {
        title,
        start: trimmed(raw.start.as_deref()).unwrap_or_default(),
        end: trimmed(raw.end.as_deref()),
        all_day: (raw.all_day == Some(true)).then_some(true),
        location: trimmed(raw.location.as_deref()),
        description: trimmed(raw.description.as_deref()),
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Text>::deserialize(deserializer)? {
        Some(Text::Str(s)) => Some(s),
        Some(Text::Int(n)) => Some(n.to_string()),
        Some(Text::Float(n)) => Some(n.to_string()),
        Some(Text::Bool(b)) => Some(b.to_string()),
        Some(Text::Other(_)) | None => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(json: &str) -> RawEventRecord {
        serde_json::from_str(json).unwrap()
    }

    mod deserialize {
        use super::*;

        #[test]
        fn camel_case_keys() {
            let raw = from_json(
                r#"{"title":"Standup","start":"2025-12-16","end":"2025-12-17","allDay":true,"location":"Room 1","description":"Daily"}"#,
            );
            assert_eq!(
                raw,
                RawEventRecord::new("Standup", "2025-12-16")
                    .with_end("2025-12-17")
                    .with_all_day(true)
                    .with_location("Room 1")
                    .with_description("Daily")
            );
        }

        #[test]
        fn missing_and_null_fields() {
            assert_eq!(from_json("{}"), RawEventRecord::default());
            assert_eq!(
                from_json(r#"{"title":null,"start":null,"allDay":null}"#),
                RawEventRecord::default()
            );
        }

        #[test]
        fn non_boolean_all_day_is_unspecified() {
            for value in [r#""true""#, "1", "[]", r#"{"x":1}"#] {
                let raw = from_json(&format!(r#"{{"allDay":{value}}}"#));
                assert_eq!(raw.all_day, None, "allDay = {value}");
            }
            assert_eq!(from_json(r#"{"allDay":false}"#).all_day, Some(false));
        }

        #[test]
        fn scalar_text_is_stringified() {
            let raw = from_json(r#"{"title":2025,"location":["a"],"description":true}"#);
            assert_eq!(raw.title.as_deref(), Some("2025"));
            assert_eq!(raw.location, None);
            assert_eq!(raw.description.as_deref(), Some("true"));
        }
    }

    mod normalization {
        use super::*;

        #[test]
        fn trims_every_field() {
            let raw = RawEventRecord::new("  Review  ", " 2025-12-16 14:00 ")
                .with_end(" 2025-12-16 15:00\n")
                .with_location("\tRoom 2 ")
                .with_description("  agenda  ");
            let event = normalize(&raw, DEFAULT_TITLE);
            assert_eq!(event.title, "Review");
            assert_eq!(event.start, "2025-12-16 14:00");
            assert_eq!(event.end.as_deref(), Some("2025-12-16 15:00"));
            assert_eq!(event.location.as_deref(), Some("Room 2"));
            assert_eq!(event.description.as_deref(), Some("agenda"));
        }

        #[test]
        fn blank_title_uses_placeholder() {
            let raw = RawEventRecord::new("   ", "2025-12-16");
            assert_eq!(normalize(&raw, DEFAULT_TITLE).title, "(untitled event)");
            assert_eq!(normalize(&raw, "無題").title, "無題");
            assert_eq!(normalize(&raw, "  ").title, DEFAULT_TITLE);
        }

        #[test]
        fn blank_optionals_become_absent() {
            let raw = RawEventRecord::new("x", "  ")
                .with_end(" ")
                .with_location("")
                .with_description("\n");
            let event = normalize(&raw, DEFAULT_TITLE);
            assert_eq!(event.start, "");
            assert_eq!(event.end, None);
            assert_eq!(event.location, None);
            assert_eq!(event.description, None);
        }

        #[test]
        fn all_day_keeps_only_true() {
            let base = RawEventRecord::new("x", "2025-12-16");
            assert_eq!(normalize(&base.clone().with_all_day(true), DEFAULT_TITLE).all_day, Some(true));
            assert_eq!(normalize(&base.clone().with_all_day(false), DEFAULT_TITLE).all_day, None);
            assert_eq!(normalize(&base, DEFAULT_TITLE).all_day, None);
        }

        #[test]
        fn empty_record_does_not_fail() {
            let event = normalize(&RawEventRecord::default(), DEFAULT_TITLE);
            assert_eq!(event.title, DEFAULT_TITLE);
            assert_eq!(event.start, "");
        }

        #[test]
        fn normalization_is_idempotent() {
            let records = [
                RawEventRecord::new(" a ", " 2025-12-16 ").with_all_day(true),
                RawEventRecord::new("", "x").with_end("  ").with_description(" d "),
                RawEventRecord::default(),
            ];
            for raw in records {
                let once = normalize(&raw, DEFAULT_TITLE);
                let twice = normalize(&RawEventRecord::from(&once), DEFAULT_TITLE);
                assert_eq!(once, twice);
            }
        }
    }
}
