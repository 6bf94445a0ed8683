//! Event listing slide fed by a remote RSS feed.
//!
//! The feed is requested as soon as the activation is built. Each request gets
//! a generation number; a response is applied only if its generation is still
//! current and the template has not been torn down. Rotation starts once the
//! entries are in and `run` is set, in whichever order those happen.
use crate::feed::{self, FeedClient, FeedOptions};
use crate::host::CompletionLatch;
use crate::layout::{Layout, LayoutTracker};
use crate::model::{ExecutionId, FeedEntry, FeedEntrySequence, Slide};
use crate::scheduler::{EntryScheduler, RotationState};
use crate::templates::{SlideTemplate, TemplateContext};
use crate::theme::ScopedTheme;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

fn default_amount() -> usize {
    5
}

fn default_page_duration_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventContent {
    /// URL of the events RSS feed.
    #[serde(default)]
    pub feed: String,
    /// Maximum number of events shown.
    #[serde(default = "default_amount")]
    pub amount: usize,
    /// Milliseconds each event stays on screen.
    #[serde(default = "default_page_duration_ms")]
    pub page_duration_ms: u64,
}

impl EventContent {
    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            amount: default_amount(),
            page_duration_ms: default_page_duration_ms(),
        }
    }
}

struct EventState {
    generation: u64,
    run: bool,
    torn_down: bool,
    entries: Option<FeedEntrySequence>,
    scheduler: Option<EntryScheduler>,
    page_duration: Duration,
    latch: Arc<CompletionLatch>,
}

impl EventState {
    /// Start rotating if both data and the run flag are present.
    fn maybe_begin(&mut self) {
        if !self.run || self.torn_down || self.scheduler.is_some() {
            return;
        }
        let Some(entries) = self.entries.clone() else {
            debug!("run requested before feed arrived; waiting");
            return;
        };
        let scheduler = EntryScheduler::new(entries, self.page_duration, self.latch.callback());
        scheduler.begin();
        self.scheduler = Some(scheduler);
    }
}

fn lock(state: &Mutex<EventState>) -> MutexGuard<'_, EventState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct EventTemplate {
    slide: Slide,
    content: EventContent,
    state: Arc<Mutex<EventState>>,
    cancel: CancellationToken,
    layout: LayoutTracker,
    theme: Option<ScopedTheme>,
}

impl EventTemplate {
    /// Builds the template and starts fetching its feed. Must be called from
    /// within a Tokio runtime.
    pub fn new(
        slide: Slide,
        content: EventContent,
        latch: Arc<CompletionLatch>,
        ctx: &TemplateContext,
    ) -> Self {
        let state = EventState {
            generation: 0,
            run: false,
            torn_down: false,
            entries: None,
            scheduler: None,
            page_duration: Duration::from_millis(content.page_duration_ms),
            latch,
        };
        let template = Self {
            theme: ScopedTheme::compose(slide.theme_css.as_deref(), &slide.execution_id),
            slide,
            content,
            state: Arc::new(Mutex::new(state)),
            cancel: CancellationToken::new(),
            layout: LayoutTracker::new(),
        };
        template.request_feed(ctx.feeds.clone(), ctx.feed_options);
        template
    }

    /// Fetch the feed, superseding any request still in flight.
    pub fn request_feed(&self, feeds: Arc<dyn FeedClient>, options: FeedOptions) {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.generation
        };
        let weak = Arc::downgrade(&self.state);
        let token = self.cancel.child_token();
        let url = self.content.feed.clone();
        let amount = self.content.amount;
        tokio::spawn(async move {
            let entries = tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "feed request cancelled");
                    return;
                }
                entries = load_entries(feeds.as_ref(), &url, amount, &options) => entries,
            };
            Self::apply(weak, generation, entries);
        });
    }

    fn apply(state: Weak<Mutex<EventState>>, generation: u64, entries: FeedEntrySequence) {
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if state.torn_down || state.generation != generation {
            debug!(generation, current = state.generation, "discarding stale feed response");
            return;
        }
        info!(entries = entries.len(), "event feed loaded");
        state.entries = Some(entries);
        state.maybe_begin();
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.state).entries.is_some()
    }

    /// Number of entries loaded so far, `None` while the feed is pending.
    pub fn entry_count(&self) -> Option<usize> {
        lock(&self.state).entries.as_ref().map(FeedEntrySequence::len)
    }

    /// Container resized; returns true when the layout variant changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.layout.resize(width, height)
    }

    pub fn layout(&self) -> Layout {
        self.layout.layout()
    }

    pub fn live_timers(&self) -> usize {
        lock(&self.state)
            .scheduler
            .as_ref()
            .map_or(0, EntryScheduler::live_timers)
    }
}

#[instrument(skip(feeds, options))]
async fn load_entries(
    feeds: &dyn FeedClient,
    url: &str,
    amount: usize,
    options: &FeedOptions,
) -> FeedEntrySequence {
    match feeds.fetch(url).await {
        Ok(raw) => feed::degrade(feed::normalize_with(&raw, amount, options)),
        Err(err) => {
            warn!(?err, "feed fetch failed; showing no entries");
            FeedEntrySequence::new()
        }
    }
}

impl SlideTemplate for EventTemplate {
    fn kind(&self) -> &'static str {
        "event"
    }

    fn execution_id(&self) -> &ExecutionId {
        &self.slide.execution_id
    }

    fn set_run(&mut self, run: bool) {
        let mut state = lock(&self.state);
        state.run = run;
        if run {
            state.maybe_begin();
        } else if let Some(scheduler) = state.scheduler.take() {
            scheduler.cancel();
        }
    }

    fn theme(&self) -> Option<&ScopedTheme> {
        self.theme.as_ref()
    }

    fn rotation(&self) -> Option<RotationState> {
        lock(&self.state).scheduler.as_ref().map(EntryScheduler::state)
    }

    fn current_entry(&self) -> Option<FeedEntry> {
        lock(&self.state)
            .scheduler
            .as_ref()
            .and_then(EntryScheduler::current_entry)
    }
}

impl Drop for EventTemplate {
    fn drop(&mut self) {
        self.cancel.cancel();
        let mut state = lock(&self.state);
        state.torn_down = true;
        state.generation += 1;
        state.latch.disarm();
        if let Some(scheduler) = state.scheduler.take() {
            scheduler.cancel();
        }
    }
}
