//! Slide templates. Each template instance belongs to exactly one activation
//! (execution id): it is built when the activation starts and torn down by
//! dropping it.
use crate::feed::{FeedClient, FeedOptions};
use crate::host::CompletionLatch;
use crate::model::{ExecutionId, FeedEntry, Slide};
use crate::scheduler::RotationState;
use crate::theme::ScopedTheme;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod event;
pub mod image_text;
pub mod rss;
pub mod table;

pub use event::{EventContent, EventTemplate};
pub use image_text::{ImageTextContent, ImageTextTemplate};
pub use rss::{RssContent, RssTemplate};
pub use table::{TableContent, TableTemplate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum SlideContent {
    ImageText(ImageTextContent),
    Table(TableContent),
    Rss(RssContent),
    Event(EventContent),
}

impl SlideContent {
    pub fn kind(&self) -> &'static str {
        match self {
            SlideContent::ImageText(_) => "image_text",
            SlideContent::Table(_) => "table",
            SlideContent::Rss(_) => "rss",
            SlideContent::Event(_) => "event",
        }
    }

    /// Whether the slide's own `duration` decides when it is done.
    pub fn is_fixed_duration(&self) -> bool {
        matches!(self, SlideContent::ImageText(_) | SlideContent::Table(_))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        match self {
            SlideContent::Rss(rss) if rss.entry_duration_secs == 0 => {
                Err("rss.entry_duration_secs must be > 0")
            }
            SlideContent::Event(event) if event.feed.trim().is_empty() => {
                Err("event.feed must be non-empty")
            }
            SlideContent::Event(event) if event.page_duration_ms == 0 => {
                Err("event.page_duration_ms must be > 0")
            }
            _ => Ok(()),
        }
    }
}

/// Shared services handed to templates when they are built.
#[derive(Clone)]
pub struct TemplateContext {
    pub feeds: Arc<dyn FeedClient>,
    pub feed_options: FeedOptions,
}

pub trait SlideTemplate: Send {
    fn kind(&self) -> &'static str;

    fn execution_id(&self) -> &ExecutionId;

    /// The host flipped the `run` flag of this activation.
    fn set_run(&mut self, run: bool);

    fn theme(&self) -> Option<&ScopedTheme>;

    /// Rotation progress for paginated templates.
    fn rotation(&self) -> Option<RotationState> {
        None
    }

    fn current_entry(&self) -> Option<FeedEntry> {
        None
    }
}

pub fn build(
    slide: Slide,
    content: &SlideContent,
    latch: Arc<CompletionLatch>,
    ctx: &TemplateContext,
) -> Box<dyn SlideTemplate> {
    match content {
        SlideContent::ImageText(c) => Box::new(ImageTextTemplate::new(slide, c.clone(), latch)),
        SlideContent::Table(c) => Box::new(TableTemplate::new(slide, c.clone(), latch)),
        SlideContent::Rss(c) => Box::new(RssTemplate::new(slide, c.clone(), latch, &ctx.feed_options)),
        SlideContent::Event(c) => Box::new(EventTemplate::new(slide, c.clone(), latch, ctx)),
    }
}
