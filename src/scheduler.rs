//! Per-entry rotation for paginated slides (RSS items, event listings).
use crate::execution::DoneCallback;
use crate::model::{FeedEntry, FeedEntrySequence};
use crate::timer::TimerSlot;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RotationState {
    pub current_index: usize,
    pub total: usize,
    pub active: bool,
}

impl RotationState {
    /// 1-based `"i / total"`, or `None` when there is nothing to count.
    pub fn progress_label(&self) -> Option<String> {
        (self.total > 0).then(|| format!("{} / {}", self.current_index + 1, self.total))
    }
}

struct Inner {
    entries: FeedEntrySequence,
    per_entry: Duration,
    state: RotationState,
    timer: TimerSlot,
    notify: watch::Sender<RotationState>,
}

impl Inner {
    fn publish(&self) {
        self.notify.send_replace(self.state);
    }
}

pub struct EntryScheduler {
    inner: Arc<Mutex<Inner>>,
    on_all_done: DoneCallback,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EntryScheduler {
    pub fn new(entries: FeedEntrySequence, per_entry: Duration, on_all_done: DoneCallback) -> Self {
        let state = RotationState {
            current_index: 0,
            total: entries.len(),
            active: false,
        };
        let (notify, _) = watch::channel(state);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries,
                per_entry,
                state,
                timer: TimerSlot::new(),
                notify,
            })),
            on_all_done,
        }
    }

    /// Expose entry 0 and arm the first timer. With no entries the rotation
    /// completes immediately. Calling it again restarts the rotation.
    pub fn begin(&self) {
        let weak = Arc::downgrade(&self.inner);
        let on_all_done = self.on_all_done.clone();
        let mut inner = lock(&self.inner);
        inner.timer.cancel();
        inner.state.current_index = 0;
        if inner.state.total == 0 {
            inner.state.active = false;
            inner.publish();
            drop(inner);
            info!("rotation has no entries; completing immediately");
            on_all_done();
            return;
        }
        inner.state.active = true;
        inner.publish();
        let per_entry = inner.per_entry;
        inner
            .timer
            .arm(per_entry, move |generation| Self::advance(weak, generation, on_all_done));
        debug!(total = inner.state.total, "rotation started");
    }

    /// Clear any armed timer. Idempotent.
    pub fn cancel(&self) {
        let mut inner = lock(&self.inner);
        inner.timer.cancel();
        if inner.state.active {
            inner.state.active = false;
            inner.publish();
            debug!(index = inner.state.current_index, "rotation cancelled");
        }
    }

    pub fn state(&self) -> RotationState {
        lock(&self.inner).state
    }

    pub fn current_entry(&self) -> Option<FeedEntry> {
        let inner = lock(&self.inner);
        if !inner.state.active {
            return None;
        }
        inner.entries.get(inner.state.current_index).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<RotationState> {
        lock(&self.inner).notify.subscribe()
    }

    pub fn live_timers(&self) -> usize {
        lock(&self.inner).timer.live_timers()
    }

    fn advance(inner: Weak<Mutex<Inner>>, generation: u64, on_all_done: DoneCallback) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut guard = lock(&inner);
        if !guard.state.active || !guard.timer.is_current(generation) {
            debug!(generation, "stale rotation timer ignored");
            return;
        }
        guard.timer.fired();
        let next = guard.state.current_index + 1;
        if next < guard.state.total {
            guard.state.current_index = next;
            guard.publish();
            let per_entry = guard.per_entry;
            let weak = Arc::downgrade(&inner);
            guard
                .timer
                .arm(per_entry, move |generation| Self::advance(weak, generation, on_all_done));
            debug!(index = next, "rotation advanced");
            return;
        }
        guard.state.active = false;
        guard.publish();
        drop(guard);
        info!("rotation finished");
        on_all_done();
    }
}

impl Drop for EntryScheduler {
    fn drop(&mut self) {
        lock(&self.inner).timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn entries(n: usize) -> FeedEntrySequence {
        (0..n).map(|i| FeedEntry::titled(format!("entry {i}"))).collect()
    }

    fn counter() -> (Arc<AtomicUsize>, DoneCallback) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        (calls, Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn empty_sequence_completes_immediately() {
        let (done, cb) = counter();
        let scheduler = EntryScheduler::new(entries(0), Duration::from_secs(10), cb);
        scheduler.begin();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.live_timers(), 0);
        assert!(scheduler.current_entry().is_none());
        assert_eq!(scheduler.state().progress_label(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn walks_every_entry_then_completes_once() {
        let (done, cb) = counter();
        let scheduler = EntryScheduler::new(entries(3), Duration::from_secs(10), cb);
        let mut rx = scheduler.subscribe();
        scheduler.begin();
        assert_eq!(scheduler.current_entry().unwrap().title, "entry 0");
        assert_eq!(scheduler.state().progress_label().as_deref(), Some("1 / 3"));

        let mut seen = vec![rx.borrow_and_update().current_index];
        for _ in 0..2 {
            rx.changed().await.unwrap();
            seen.push(rx.borrow_and_update().current_index);
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(done.load(Ordering::SeqCst), 0);

        rx.changed().await.unwrap();
        assert!(!rx.borrow().active);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_held_for_its_full_duration() {
        let (_done, cb) = counter();
        let scheduler = EntryScheduler::new(entries(2), Duration::from_secs(10), cb);
        scheduler.begin();
        sleep(Duration::from_millis(9_999)).await;
        assert_eq!(scheduler.state().current_index, 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(scheduler.state().current_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn begin_twice_does_not_stack_timers() {
        let (done, cb) = counter();
        let scheduler = EntryScheduler::new(entries(1), Duration::from_secs(10), cb);
        scheduler.begin();
        sleep(Duration::from_secs(4)).await;
        scheduler.begin();
        sleep(Duration::from_millis(1)).await;
        assert!(scheduler.live_timers() <= 1);
        sleep(Duration::from_secs(7)).await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
        sleep(Duration::from_secs(4)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_rotation() {
        let (done, cb) = counter();
        let scheduler = EntryScheduler::new(entries(3), Duration::from_secs(1), cb);
        scheduler.cancel();
        scheduler.begin();
        sleep(Duration::from_millis(1500)).await;
        scheduler.cancel();
        scheduler.cancel();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(scheduler.state().current_index, 1);
        assert!(!scheduler.state().active);
        assert_eq!(done.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.live_timers(), 0);
    }
}
