use crate::feed::dates;
use crate::feed::FeedOptions;
use crate::host::CompletionLatch;
use crate::media;
use crate::model::{ExecutionId, FeedEntry, FeedEntrySequence, Slide};
use crate::scheduler::{EntryScheduler, RotationState};
use crate::templates::SlideTemplate;
use crate::theme::ScopedTheme;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One item of feed data the host already fetched for the slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RssItem {
    pub title: Option<String>,
    /// RFC 2822 or RFC 3339 timestamp.
    pub last_modified: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RssFeedData {
    pub title: Option<String>,
    pub entries: Vec<RssItem>,
}

fn default_entry_duration_secs() -> u64 {
    10
}

fn default_number_of_entries() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RssContent {
    #[serde(default)]
    pub feed: RssFeedData,
    /// Seconds each entry stays on screen.
    #[serde(default = "default_entry_duration_secs")]
    pub entry_duration_secs: u64,
    /// Entries shown before the slide completes.
    #[serde(default = "default_number_of_entries")]
    pub number_of_entries: usize,
    /// Media ids; the first resolvable one is the background.
    #[serde(default)]
    pub image: Vec<String>,
}

impl Default for RssContent {
    fn default() -> Self {
        Self {
            feed: RssFeedData::default(),
            entry_duration_secs: default_entry_duration_secs(),
            number_of_entries: default_number_of_entries(),
            image: Vec::new(),
        }
    }
}

impl RssContent {
    pub fn entries(&self, options: &FeedOptions) -> FeedEntrySequence {
        self.feed
            .entries
            .iter()
            .filter_map(|item| {
                let title = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
                Some(FeedEntry {
                    title: title.to_string(),
                    body: item.content.clone().filter(|c| !c.trim().is_empty()),
                    published: item
                        .last_modified
                        .as_deref()
                        .and_then(dates::parse_published)
                        .map(|at| dates::long_label(at, options.offset, options.published_locale)),
                    ..Default::default()
                })
            })
            .collect::<FeedEntrySequence>()
            .truncated(self.number_of_entries)
    }
}

/// Rotates through the first `number_of_entries` items, one per
/// `entry_duration_secs`, then completes the slide.
pub struct RssTemplate {
    slide: Slide,
    feed_title: Option<String>,
    background: Option<String>,
    theme: Option<ScopedTheme>,
    scheduler: EntryScheduler,
    latch: Arc<CompletionLatch>,
}

impl RssTemplate {
    pub fn new(
        slide: Slide,
        content: RssContent,
        latch: Arc<CompletionLatch>,
        options: &FeedOptions,
    ) -> Self {
        let entries = content.entries(options);
        debug!(entries = entries.len(), slide = %slide.id, "rss entries prepared");
        let scheduler = EntryScheduler::new(
            entries,
            Duration::from_secs(content.entry_duration_secs),
            latch.callback(),
        );
        Self {
            background: media::first_media_url(&slide.media, &content.image),
            theme: ScopedTheme::compose(slide.theme_css.as_deref(), &slide.execution_id),
            feed_title: content.feed.title,
            slide,
            scheduler,
            latch,
        }
    }

    pub fn feed_title(&self) -> Option<&str> {
        self.feed_title.as_deref()
    }

    pub fn background_url(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn progress_label(&self) -> Option<String> {
        self.scheduler.state().progress_label()
    }
}

impl SlideTemplate for RssTemplate {
    fn kind(&self) -> &'static str {
        "rss"
    }

    fn execution_id(&self) -> &ExecutionId {
        &self.slide.execution_id
    }

    fn set_run(&mut self, run: bool) {
        if run {
            self.scheduler.begin();
        } else {
            self.scheduler.cancel();
        }
    }

    fn theme(&self) -> Option<&ScopedTheme> {
        self.theme.as_ref()
    }

    fn rotation(&self) -> Option<RotationState> {
        Some(self.scheduler.state())
    }

    fn current_entry(&self) -> Option<FeedEntry> {
        self.scheduler.current_entry()
    }
}

impl Drop for RssTemplate {
    fn drop(&mut self) {
        self.latch.disarm();
        self.scheduler.cancel();
    }
}
