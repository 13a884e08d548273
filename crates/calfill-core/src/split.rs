//! Recovery of date/time ranges crammed into a single start field.
//!
//! Extractors frequently emit `start = "2025-12-16 14:00〜15:00"` and leave
//! `end` empty. The splitter walks an ordered list of [`SplitRule`]s; the
//! first rule whose matcher finds a separator decides the outcome. Its
//! candidate is then classified:
//!
//! 1. both sides are dates: an all-day range
//! 2. the left side starts with a date and the right side is a bare time:
//!    the end inherits the left side's date
//! 3. the right side is a full date-time: a timed range
//!
//! A candidate that fits none of these is discarded and the input passes
//! through untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::parse::{Shape, date_prefix, shape_of};

/// Wave dash, fullwidth tilde, tilde, en dash, em dash.
static WAVE_DASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[〜～~–—]\s*").expect("Invalid wave dash regex"));

/// A hyphen with whitespace on both sides, so dates like `2025-12-16` are left alone.
static SPACED_HYPHEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+-\s+").expect("Invalid spaced hyphen regex"));

/// `<anything ending in a clock time>-<clock time>`.
static TIME_RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<left>.*\d{1,2}:\d{2}(?::\d{2})?)\s*-\s*(?P<right>\d{1,2}:\d{2}(?::\d{2})?)$")
        .expect("Invalid time range regex")
});

/// Finds a separator and returns the trimmed `(left, right)` halves.
pub type Matcher = fn(&str) -> Option<(String, String)>;

/// Turns a matched candidate into revised fields, or rejects it.
pub type Classifier = fn(&SplitCandidate, Option<bool>) -> Option<SplitFields>;

/// One splitting heuristic: a separator matcher paired with a classifier.
#[derive(Debug, Clone, Copy)]
pub struct SplitRule {
    /// Name reported when this rule splits a field.
    pub name: &'static str,
    /// Separator detection.
    pub matcher: Matcher,
    /// Classification of the matched halves.
    pub classifier: Classifier,
}

/// The rules applied by [`RangeSplitter::default`], in priority order.
pub const DEFAULT_RULES: &[SplitRule] = &[
    SplitRule {
        name: "wave-dash",
        matcher: split_on_wave_dash,
        classifier: classify_candidate,
    },
    SplitRule {
        name: "spaced-hyphen",
        matcher: split_on_spaced_hyphen,
        classifier: classify_candidate,
    },
    SplitRule {
        name: "time-range",
        matcher: split_on_time_range,
        classifier: classify_candidate,
    },
];

/// The two halves found by a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCandidate {
    pub left: String,
    pub right: String,
}

/// Start/end/all-day fields after a successful classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitFields {
    pub start: String,
    pub end: Option<String>,
    pub all_day: Option<bool>,
}

/// Result of running the splitter over one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutcome {
    /// The possibly revised fields.
    #[serde(flatten)]
    pub fields: SplitFields,
    /// Name of the rule that split the start field, if any.
    pub rule: Option<&'static str>,
}

impl SplitOutcome {
    fn unchanged(start: &str, end: Option<&str>, all_day: Option<bool>) -> Self {
        Self {
            fields: SplitFields {
                start: start.to_string(),
                end: end.map(str::to_string),
                all_day,
            },
            rule: None,
        }
    }

    /// Returns `true` if a rule rewrote the fields.
    pub fn was_split(&self) -> bool {
        self.rule.is_some()
    }
}

/// Ordered set of splitting rules.
#[derive(Debug, Clone)]
pub struct RangeSplitter {
    rules: Vec<SplitRule>,
}

impl Default for RangeSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl RangeSplitter {
    /// Creates a splitter with the given rules, highest priority first.
    pub fn new(rules: Vec<SplitRule>) -> Self {
        Self { rules }
    }

    /// Appends a rule with the lowest priority.
    #[must_use]
    pub fn with_rule(mut self, rule: SplitRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the rules in priority order.
    pub fn rules(&self) -> &[SplitRule] {
        &self.rules
    }

    /// Splits `start` into a range when `end` is absent.
    ///
    /// When `end` is present, `start` is blank, or `start` already reads as
    /// a single date or date-time, the fields are returned unchanged.
    pub fn split(&self, start: &str, end: Option<&str>, all_day: Option<bool>) -> SplitOutcome {
        if end.is_some() || start.trim().is_empty() {
            return SplitOutcome::unchanged(start, end, all_day);
        }
        // `2025-12-16T14:00:00-05:00` would otherwise look like a time range.
        if matches!(shape_of(start), Some(Shape::Date | Shape::DateTime)) {
            return SplitOutcome::unchanged(start, end, all_day);
        }

        for rule in &self.rules {
            let Some((left, right)) = (rule.matcher)(start) else {
                continue;
            };
            let candidate = SplitCandidate { left, right };
            return match (rule.classifier)(&candidate, all_day) {
                Some(fields) => {
                    debug!(
                        rule = rule.name,
                        start = %fields.start,
                        end = ?fields.end,
                        all_day = ?fields.all_day,
                        "split range out of start field"
                    );
                    SplitOutcome {
                        fields,
                        rule: Some(rule.name),
                    }
                }
                None => {
                    debug!(
                        rule = rule.name,
                        left = %candidate.left,
                        right = %candidate.right,
                        "discarded unusable split candidate"
                    );
                    SplitOutcome::unchanged(start, end, all_day)
                }
            };
        }

        SplitOutcome::unchanged(start, end, all_day)
    }
}

/// Splits on the first wave dash, tilde, en dash or em dash.
pub fn split_on_wave_dash(text: &str) -> Option<(String, String)> {
    split_at_regex(&WAVE_DASH_REGEX, text)
}

/// Splits on the first `" - "`.
pub fn split_on_spaced_hyphen(text: &str) -> Option<(String, String)> {
    split_at_regex(&SPACED_HYPHEN_REGEX, text)
}

/// Splits `"... 14:00-15:00"` at the hyphen between the two clock times.
pub fn split_on_time_range(text: &str) -> Option<(String, String)> {
    let caps = TIME_RANGE_REGEX.captures(text.trim())?;
    let left = caps.name("left")?.as_str().trim();
    let right = caps.name("right")?.as_str().trim();
    Some((left.to_string(), right.to_string()))
}

fn split_at_regex(regex: &Regex, text: &str) -> Option<(String, String)> {
    let found = regex.find(text)?;
    let left = text[..found.start()].trim();
    let right = text[found.end()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}

/// The default classification shared by every built-in rule.
pub fn classify_candidate(
    candidate: &SplitCandidate,
    all_day: Option<bool>,
) -> Option<SplitFields> {
    let left = candidate.left.as_str();
    let right = candidate.right.as_str();
    let right_shape = shape_of(right);

    if shape_of(left) == Some(Shape::Date) && right_shape == Some(Shape::Date) {
        return Some(SplitFields {
            start: left.to_string(),
            end: Some(right.to_string()),
            // An explicit `false` from the caller wins over inference.
            all_day: Some(all_day.unwrap_or(true)),
        });
    }

    if right_shape == Some(Shape::Time)
        && let Some(prefix) = date_prefix(left)
    {
        return Some(SplitFields {
            start: left.to_string(),
            end: Some(format!("{prefix} {right}")),
            all_day,
        });
    }

    if right_shape == Some(Shape::DateTime) {
        return Some(SplitFields {
            start: left.to_string(),
            end: Some(right.to_string()),
            all_day,
        });
    }

    None
}
