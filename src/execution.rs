//! Slide-level duration timer used by every fixed-duration template.
use crate::timer::TimerSlot;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// Invoked when a slide (or a rotation) has finished playing.
pub type DoneCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Done,
}

struct Inner {
    state: ExecutionState,
    timer: TimerSlot,
}

/// Identity-stable execution handle for one activation.
///
/// `start` has restart semantics: a second call cancels the first timer. `stop`
/// suppresses the pending completion for good. Dropping the handle stops it.
pub struct SlideExecution {
    inner: Arc<Mutex<Inner>>,
    on_done: DoneCallback,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SlideExecution {
    pub fn new(on_done: DoneCallback) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ExecutionState::Idle,
                timer: TimerSlot::new(),
            })),
            on_done,
        }
    }

    pub fn start(&self, duration: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let on_done = self.on_done.clone();
        let mut inner = lock(&self.inner);
        inner.state = ExecutionState::Running;
        let generation = inner
            .timer
            .arm(duration, move |generation| Self::fire(weak, generation, on_done));
        debug!(generation, duration_ms = duration.as_millis() as u64, "slide execution started");
    }

    pub fn stop(&self) {
        let mut inner = lock(&self.inner);
        inner.timer.cancel();
        if inner.state != ExecutionState::Idle {
            debug!(from = ?inner.state, "slide execution stopped");
        }
        inner.state = ExecutionState::Idle;
    }

    pub fn state(&self) -> ExecutionState {
        lock(&self.inner).state
    }

    pub fn live_timers(&self) -> usize {
        lock(&self.inner).timer.live_timers()
    }

    fn fire(inner: Weak<Mutex<Inner>>, generation: u64, on_done: DoneCallback) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        {
            let mut guard = lock(&inner);
            if guard.state != ExecutionState::Running || !guard.timer.is_current(generation) {
                debug!(generation, "stale execution timer ignored");
                return;
            }
            guard.timer.fired();
            guard.state = ExecutionState::Done;
        }
        info!("slide duration elapsed");
        on_done();
    }
}

impl Drop for SlideExecution {
    fn drop(&mut self) {
        lock(&self.inner).timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Instant};

    fn counter() -> (Arc<AtomicUsize>, DoneCallback) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        (calls, Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_duration() {
        let (calls, cb) = counter();
        let exec = SlideExecution::new(cb);
        assert_eq!(exec.state(), ExecutionState::Idle);
        exec.start(Duration::from_millis(1000));
        assert_eq!(exec.state(), ExecutionState::Running);
        sleep(Duration::from_millis(999)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(exec.state(), ExecutionState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_fire_suppresses_callback() {
        let (calls, cb) = counter();
        let exec = SlideExecution::new(cb);
        exec.start(Duration::from_millis(1000));
        sleep(Duration::from_millis(500)).await;
        exec.stop();
        exec.stop();
        sleep(Duration::from_millis(2000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(exec.state(), ExecutionState::Idle);
        assert_eq!(exec.live_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_fires_once_timed_from_second_start() {
        let (calls, cb) = counter();
        let exec = SlideExecution::new(cb);
        let begin = Instant::now();
        exec.start(Duration::from_millis(1000));
        sleep(Duration::from_millis(300)).await;
        exec.start(Duration::from_millis(1000));
        sleep(Duration::from_millis(800)).await;
        // 1100ms since the first start, 800ms since the second.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(begin.elapsed() >= Duration::from_millis(1300));
        sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn can_start_again_after_done() {
        let (calls, cb) = counter();
        let exec = SlideExecution::new(cb);
        exec.start(Duration::from_millis(10));
        sleep(Duration::from_millis(20)).await;
        exec.start(Duration::from_millis(10));
        sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_timer() {
        let (calls, cb) = counter();
        let exec = SlideExecution::new(cb);
        exec.start(Duration::from_millis(100));
        drop(exec);
        sleep(Duration::from_millis(500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
