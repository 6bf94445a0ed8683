//! The host player contract: every activation reports `slide_done` exactly once.
use crate::execution::DoneCallback;
use crate::model::Slide;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Implemented by the player that owns the playlist. `slide_done` is called
/// from timer tasks and must not block or call back into the template.
pub trait HostPlayer: Send + Sync {
    fn slide_done(&self, slide: &Slide);
}

/// Forwards at most one completion per activation to the host.
pub struct CompletionLatch {
    host: Arc<dyn HostPlayer>,
    slide: Slide,
    fired: AtomicBool,
}

impl CompletionLatch {
    pub fn new(host: Arc<dyn HostPlayer>, slide: Slide) -> Arc<Self> {
        Arc::new(Self {
            host,
            slide,
            fired: AtomicBool::new(false),
        })
    }

    /// Returns false when the activation already completed or was torn down.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!(
                slide = %self.slide.id,
                execution = %self.slide.execution_id,
                "duplicate completion suppressed"
            );
            return false;
        }
        info!(slide = %self.slide.id, execution = %self.slide.execution_id, "slide done");
        self.host.slide_done(&self.slide);
        true
    }

    /// Teardown: no completion may reach the host after this.
    pub fn disarm(&self) {
        self.fired.store(true, Ordering::SeqCst);
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn slide(&self) -> &Slide {
        &self.slide
    }

    pub fn callback(self: &Arc<Self>) -> DoneCallback {
        let latch = self.clone();
        Arc::new(move || {
            latch.fire();
        })
    }
}

/// Host that forwards completed slides over a channel.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<Slide>,
}

impl ChannelHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Slide>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostPlayer for ChannelHost {
    fn slide_done(&self, slide: &Slide) {
        if self.tx.send(slide.clone()).is_err() {
            warn!(slide = %slide.id, "host receiver gone; completion dropped");
        }
    }
}
