use thiserror::Error;

/// Playback-level failures. None of these reach the host as a failure: an
/// unresolved resource renders without the visual, and a timer leak is a
/// programming error surfaced by [`crate::timer::TimerSlot::audit`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("media reference {0:?} has no resolvable url")]
    ResourceUnresolved(String),
    #[error("timer leak: {live} timers live on a single handle")]
    TimerLeak { live: usize },
}
