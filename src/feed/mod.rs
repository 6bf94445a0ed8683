//! RSS feed normalization.
//!
//! [`normalize`] turns a raw RSS 2.0 payload into a [`FeedEntrySequence`].
//! Both errors it can return mean "nothing to show": callers degrade them to an
//! empty sequence (see [`degrade`]) and still complete the slide.
use crate::model::{FeedEntry, FeedEntrySequence};
use chrono::{FixedOffset, Offset, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, warn};

pub mod client;
pub mod dates;

pub use client::{FeedClient, HttpFeedClient};
pub use dates::Locale;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed has no channel or no items")]
    Empty,
    #[error("malformed feed: {0}")]
    Malformed(String),
}

/// Timezone and locales used for the entry date labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    pub offset: FixedOffset,
    pub event_locale: Locale,
    pub published_locale: Locale,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            event_locale: Locale::Icelandic,
            published_locale: Locale::Danish,
        }
    }
}

/// A parsed channel: its title and every titled item, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    pub title: Option<String>,
    pub entries: FeedEntrySequence,
}

pub fn normalize(raw: &str, max_entries: usize) -> Result<FeedEntrySequence, FeedError> {
    normalize_with(raw, max_entries, &FeedOptions::default())
}

pub fn normalize_with(
    raw: &str,
    max_entries: usize,
    options: &FeedOptions,
) -> Result<FeedEntrySequence, FeedError> {
    Ok(parse_channel(raw, options)?.entries.truncated(max_entries))
}

/// Degrade-and-complete: any feed error becomes an empty sequence.
pub fn degrade(result: Result<FeedEntrySequence, FeedError>) -> FeedEntrySequence {
    result.unwrap_or_else(|err| {
        warn!(%err, "feed unusable; showing no entries");
        FeedEntrySequence::new()
    })
}

#[derive(Debug, Default)]
struct RawItem {
    title: Option<String>,
    description: Option<String>,
    encoded: Option<String>,
    subheadline: Option<String>,
    location: Option<String>,
    starts_at: Option<String>,
    ends_at: Option<String>,
    pub_date: Option<String>,
    media_content: Option<String>,
    enclosure: Option<String>,
    thumbnail: Option<String>,
}

impl RawItem {
    fn set_field(&mut self, name: &str, text: String) {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "content:encoded" => &mut self.encoded,
            "content-rss:subheadline" => &mut self.subheadline,
            "content-rss:arrangement-location" => &mut self.location,
            "content-rss:arrangement-starttime" => &mut self.starts_at,
            "content-rss:arrangement-endtime" => &mut self.ends_at,
            "pubDate" => &mut self.pub_date,
            _ => return,
        };
        *slot = Some(text);
    }

    fn take_media(&mut self, name: &str, element: &BytesStart<'_>) -> Result<(), FeedError> {
        let slot = match name {
            "media:content" => &mut self.media_content,
            "enclosure" => &mut self.enclosure,
            "media:thumbnail" => &mut self.thumbnail,
            _ => return Ok(()),
        };
        if slot.is_some() {
            return Ok(());
        }
        for attr in element.attributes() {
            let attr = attr.map_err(|e| FeedError::Malformed(format!("attribute error: {}", e)))?;
            if attr.key.as_ref() == b"url" {
                let url = attr
                    .unescape_value()
                    .map_err(|e| FeedError::Malformed(e.to_string()))?;
                if !url.trim().is_empty() {
                    *slot = Some(url.trim().to_string());
                }
            }
        }
        Ok(())
    }

    fn into_entry(self, options: &FeedOptions) -> Option<FeedEntry> {
        let title = non_empty(self.title)?;
        let schedule = self
            .starts_at
            .as_deref()
            .and_then(dates::parse_epoch)
            .map(|start| {
                let end = self.ends_at.as_deref().and_then(dates::parse_epoch);
                dates::event_schedule(start, end, options.offset, options.event_locale)
            });
        let published = self
            .pub_date
            .as_deref()
            .and_then(dates::parse_published)
            .map(|at| dates::long_label(at, options.offset, options.published_locale));
        Some(FeedEntry {
            title,
            subtitle: non_empty(self.subheadline),
            body: non_empty(self.description).or(non_empty(self.encoded)),
            image_url: self.media_content.or(self.enclosure).or(self.thumbnail),
            schedule,
            location: non_empty(self.location),
            published,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_path(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

/// Parse the whole channel without truncation.
pub fn parse_channel(raw: &str, options: &FeedOptions) -> Result<Channel, FeedError> {
    // Whitespace is kept so inline markup inside a field keeps its word
    // spacing; fields are trimmed when the entry is built.
    let mut reader = Reader::from_str(raw);

    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_channel = false;
    let mut channel_closed = false;
    let mut title = None;
    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedError::Malformed(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(ref e) => {
                let name = element_name(e);
                if is_path(&stack, &["rss"]) && name == "channel" {
                    saw_channel = true;
                }
                let field_start = is_path(&stack, &["rss", "channel"])
                    || is_path(&stack, &["rss", "channel", "item"]);
                if is_path(&stack, &["rss", "channel"]) && name == "item" && !channel_closed {
                    current = Some(RawItem::default());
                }
                if let Some(item) = current.as_mut() {
                    item.take_media(&name, e)?;
                }
                stack.push(name);
                if field_start {
                    text.clear();
                }
            }
            Event::Empty(ref e) => {
                let name = element_name(e);
                if is_path(&stack, &["rss"]) && name == "channel" {
                    saw_channel = true;
                }
                if let Some(item) = current.as_mut() {
                    item.take_media(&name, e)?;
                }
            }
            Event::Text(ref t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| FeedError::Malformed(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    return Err(FeedError::Malformed("unexpected closing tag".into()));
                };
                if is_path(&stack, &["rss", "channel", "item"]) {
                    let field = std::mem::take(&mut text);
                    if let Some(item) = current.as_mut() {
                        item.set_field(&name, field);
                    }
                } else if is_path(&stack, &["rss", "channel"]) {
                    let field = std::mem::take(&mut text);
                    match name.as_str() {
                        "item" => items.extend(current.take()),
                        "title" if !channel_closed => title = non_empty(Some(field)),
                        _ => {}
                    }
                } else if is_path(&stack, &["rss"]) && name == "channel" {
                    // Only the first channel of a document is shown.
                    channel_closed = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Malformed(format!("unclosed element <{}>", open)));
    }
    if !saw_channel || items.is_empty() {
        return Err(FeedError::Empty);
    }

    let total = items.len();
    let entries: FeedEntrySequence = items
        .into_iter()
        .filter_map(|item| item.into_entry(options))
        .collect();
    if entries.len() < total {
        debug!(dropped = total - entries.len(), "dropped untitled feed items");
    }
    Ok(Channel { title, entries })
}
