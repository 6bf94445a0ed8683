use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Unique id of one activation of a slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for a new activation.
    pub fn generate() -> Self {
        Self(format!("slide-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Media id -> asset descriptor, as handed over by the host with each slide.
pub type MediaData = HashMap<String, MediaAsset>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    #[serde(default)]
    pub assets: Option<AssetFiles>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetFiles {
    #[serde(default)]
    pub uri: Option<String>,
}

fn default_duration_ms() -> u64 {
    15_000
}

/// One playback unit, owned by the host player. Templates only ever see a
/// read-only snapshot of it per activation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slide {
    pub id: String,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub execution_id: ExecutionId,
    #[serde(default)]
    pub theme_css: Option<String>,
    #[serde(default)]
    pub media: MediaData,
}

impl Slide {
    pub fn new(id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            duration_ms,
            execution_id: ExecutionId::default(),
            theme_css: None,
            media: MediaData::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Copy of this slide bound to a specific activation.
    pub fn activate(&self, execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            ..self.clone()
        }
    }
}

/// Localized `{date, time}` label pair, e.g. `Mánudagur 3. mars` / `14:00`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateLabel {
    pub date: String,
    pub time: String,
}

impl DateLabel {
    pub fn full(&self) -> String {
        format!("{} kl. {}", self.date, self.time)
    }
}

/// Start/end labels of a time-bounded entry. `end` is omitted when it falls on
/// the same calendar day as `start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSchedule {
    pub start: DateLabel,
    pub end: Option<DateLabel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub schedule: Option<EventSchedule>,
    pub location: Option<String>,
    pub published: Option<String>,
}

impl FeedEntry {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Entries in source order, never re-sorted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FeedEntrySequence(Vec<FeedEntry>);

impl FeedEntrySequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Keep the first `cap` entries.
    pub fn truncated(mut self, cap: usize) -> Self {
        self.0.truncate(cap);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeedEntry> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeedEntry> {
        self.0.iter()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.title.as_str()).collect()
    }
}

impl From<Vec<FeedEntry>> for FeedEntrySequence {
    fn from(entries: Vec<FeedEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<FeedEntry> for FeedEntrySequence {
    fn from_iter<I: IntoIterator<Item = FeedEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_defaults_from_yaml() {
        let slide: Slide = serde_yaml::from_str("id: intro\n").unwrap();
        assert_eq!(slide.duration_ms, 15_000);
        assert!(slide.execution_id.is_empty());
        assert!(slide.media.is_empty());
    }

    #[test]
    fn activate_keeps_content_and_sets_execution() {
        let slide = Slide::new("intro", 5000);
        let id = ExecutionId::generate();
        let active = slide.activate(id.clone());
        assert_eq!(active.execution_id, id);
        assert_eq!(active.duration(), Duration::from_secs(5));
        assert!(id.as_str().starts_with("slide-"));
    }

    #[test]
    fn sequence_truncation_keeps_order() {
        let seq: FeedEntrySequence = ["a", "b", "c"].into_iter().map(FeedEntry::titled).collect();
        assert_eq!(seq.truncated(2).titles(), vec!["a", "b"]);
    }
}
