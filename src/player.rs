use crate::host::{CompletionLatch, HostPlayer};
use crate::model::Slide;
use crate::templates::{self, SlideContent, SlideTemplate, TemplateContext};
use std::sync::Arc;
use tracing::{debug, info};

/// Keeps one template per activation key. Showing the same execution id again
/// only forwards the `run` flag; a new execution id tears down the previous
/// template before the next one is built.
pub struct SlidePlayer {
    ctx: TemplateContext,
    host: Arc<dyn HostPlayer>,
    current: Option<Box<dyn SlideTemplate>>,
}

impl SlidePlayer {
    pub fn new(ctx: TemplateContext, host: Arc<dyn HostPlayer>) -> Self {
        Self {
            ctx,
            host,
            current: None,
        }
    }

    pub fn show(&mut self, slide: &Slide, content: &SlideContent, run: bool) {
        if let Some(template) = self.current.as_mut() {
            if template.execution_id() == &slide.execution_id {
                debug!(execution = %slide.execution_id, run, "run flag updated");
                template.set_run(run);
                return;
            }
        }
        self.stop();
        info!(
            slide = %slide.id,
            execution = %slide.execution_id,
            template = content.kind(),
            "activating slide"
        );
        let latch = CompletionLatch::new(self.host.clone(), slide.clone());
        let mut template = templates::build(slide.clone(), content, latch, &self.ctx);
        template.set_run(run);
        self.current = Some(template);
    }

    /// Tear down the current activation, if any.
    pub fn stop(&mut self) {
        if let Some(old) = self.current.take() {
            debug!(execution = %old.execution_id(), kind = old.kind(), "tearing down slide");
        }
    }

    pub fn current(&self) -> Option<&dyn SlideTemplate> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedClient, FeedOptions};
    use crate::host::ChannelHost;
    use crate::model::ExecutionId;
    use crate::templates::ImageTextContent;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::sleep;

    struct NoFeed;

    #[async_trait]
    impl FeedClient for NoFeed {
        async fn fetch(&self, _url: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    fn player() -> (SlidePlayer, tokio::sync::mpsc::UnboundedReceiver<Slide>) {
        let (host, rx) = ChannelHost::new();
        let ctx = TemplateContext {
            feeds: Arc::new(NoFeed),
            feed_options: FeedOptions::default(),
        };
        (SlidePlayer::new(ctx, Arc::new(host)), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn same_execution_id_keeps_the_template() {
        let (mut player, mut rx) = player();
        let content = SlideContent::ImageText(ImageTextContent::default());
        let slide = Slide::new("a", 1000).activate(ExecutionId::new("e1"));

        player.show(&slide, &content, true);
        sleep(Duration::from_millis(600)).await;
        // Toggling run on the same activation restarts its timer.
        player.show(&slide, &content, false);
        player.show(&slide, &content, true);
        sleep(Duration::from_millis(600)).await;
        assert!(rx.try_recv().is_err());
        sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.try_recv().unwrap().execution_id.as_str(), "e1");
        assert_eq!(player.current().unwrap().kind(), "image_text");
    }

    #[tokio::test(start_paused = true)]
    async fn new_activation_tears_down_the_old_one() {
        let (mut player, mut rx) = player();
        let content = SlideContent::ImageText(ImageTextContent::default());
        let first = Slide::new("a", 1000).activate(ExecutionId::new("e1"));
        let second = Slide::new("a", 1000).activate(ExecutionId::new("e2"));

        player.show(&first, &content, true);
        sleep(Duration::from_millis(900)).await;
        player.show(&second, &content, true);
        sleep(Duration::from_millis(1500)).await;

        let done = rx.try_recv().unwrap();
        assert_eq!(done.execution_id.as_str(), "e2");
        assert!(rx.try_recv().is_err());

        player.stop();
        assert!(player.current().is_none());
    }
}
