//! Single-shot timer slot shared by the execution controller and the entry
//! scheduler.
//!
//! A slot holds at most one armed timer. Every `arm`/`cancel` bumps the slot
//! generation; a firing timer hands its generation to the callback, which must
//! check [`TimerSlot::is_current`] under the owner's lock before touching
//! state. Aborting the task alone is not enough: a timer whose sleep already
//! elapsed may be waiting on that lock while the owner re-arms.
use crate::error::PlaybackError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::trace;

#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<AbortHandle>,
    generation: u64,
    live: Arc<AtomicUsize>,
}

/// Decrements the live counter when the timer task finishes or is aborted.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(live)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any armed timer and arm a new one. Must be called from within a
    /// Tokio runtime. Returns the generation the callback will receive.
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let guard = LiveGuard::new(self.live.clone());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            drop(guard);
            on_fire(generation);
        });
        self.handle = Some(task.abort_handle());
        trace!(generation, delay_ms = delay.as_millis() as u64, "timer armed");
        generation
    }

    /// Abort the armed timer, if any. Idempotent.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Forget the handle of a timer that has fired, keeping its generation.
    pub fn fired(&mut self) {
        self.handle = None;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Timer tasks spawned by this slot that have neither fired nor been
    /// dropped by the runtime yet.
    pub fn live_timers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn audit(&self) -> Result<(), PlaybackError> {
        match self.live_timers() {
            0 | 1 => Ok(()),
            live => Err(PlaybackError::TimerLeak { live }),
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
