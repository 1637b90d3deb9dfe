//! Date parsing for `datetime` fields

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Turns free-form date text into a moment with a known offset
pub trait DateParser {
    fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>>;
}

impl<F> DateParser for F
where
    F: Fn(&str) -> Option<DateTime<FixedOffset>>,
{
    fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        self(text)
    }
}

/// Formats carrying their own offset
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
];

/// Formats without an offset, read as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
];

/// Date-only formats, read as midnight UTC
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

/// Default parser: RFC 3339, RFC 2822, then a list of common layouts
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateParser;

impl DateParser for ChronoDateParser {
    fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Some(dt);
        }

        for format in ZONED_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, format) {
                return Some(dt);
            }
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(as_utc(naive));
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return date.and_hms_opt(0, 0, 0).map(as_utc);
            }
        }

        None
    }
}

fn as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

/// ISO-8601 rendering with an explicit offset, e.g. `2024-03-01T09:30:00+00:00`
pub fn to_iso8601(moment: &DateTime<FixedOffset>) -> String {
    moment.to_rfc3339()
}
