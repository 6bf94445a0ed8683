//! Localized date labels for feed entries.
//!
//! Weekday and month names come from chrono's locale tables, which keep them
//! in lower case; the first letter of every label is upper-cased afterwards.
use crate::model::{DateLabel, EventSchedule};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Locale {
    #[serde(rename = "is")]
    Icelandic,
    #[serde(rename = "da")]
    Danish,
}

impl Locale {
    fn chrono(&self) -> chrono::Locale {
        match self {
            Locale::Icelandic => chrono::Locale::is_IS,
            Locale::Danish => chrono::Locale::da_DK,
        }
    }

    fn format(&self, at: &DateTime<FixedOffset>, fmt: &str) -> String {
        at.format_localized(fmt, self.chrono()).to_string()
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse an epoch-seconds field. Fractional seconds are truncated.
pub fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let secs = raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
    Utc.timestamp_opt(secs.trunc() as i64, 0).single()
}

/// `{"Mánudagur 3. mars", "14:00"}` style pair.
pub fn event_label(at: DateTime<Utc>, offset: FixedOffset, locale: Locale) -> DateLabel {
    let local = at.with_timezone(&offset);
    DateLabel {
        date: capitalize(&locale.format(&local, "%A %-d. %B")),
        time: local.format("%H:%M").to_string(),
    }
}

/// Start label plus an end label only when the end is on another calendar day.
pub fn event_schedule(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    offset: FixedOffset,
    locale: Locale,
) -> EventSchedule {
    let start = event_label(start, offset, locale);
    let end = end
        .map(|end| event_label(end, offset, locale))
        .filter(|end| end.date != start.date);
    EventSchedule { start, end }
}

/// Long publication label, e.g. `Fredag d. 3. marts 2023 kl. 14:00`.
pub fn long_label(at: DateTime<FixedOffset>, offset: FixedOffset, locale: Locale) -> String {
    let local = at.with_timezone(&offset);
    let fmt = match locale {
        Locale::Danish => "%A d. %-d. %B %Y kl. %H:%M",
        Locale::Icelandic => "%A, %-d. %B %Y kl. %-H:%M",
    };
    let raw = locale.format(&local, fmt);
    capitalize(&raw)
}

/// Accepts RFC 2822 (`pubDate`) and RFC 3339 timestamps.
pub fn parse_published(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}
