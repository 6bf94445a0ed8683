use crate::execution::{ExecutionState, SlideExecution};
use crate::host::CompletionLatch;
use crate::media;
use crate::model::{ExecutionId, Slide};
use crate::templates::SlideTemplate;
use crate::theme::ScopedTheme;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageTextContent {
    pub title: Option<String>,
    pub text: Option<String>,
    /// Media id of the background image.
    pub image: Option<String>,
}

/// Fixed-duration slide: title, text and an optional background image.
pub struct ImageTextTemplate {
    slide: Slide,
    content: ImageTextContent,
    background: Option<String>,
    theme: Option<ScopedTheme>,
    execution: SlideExecution,
    latch: Arc<CompletionLatch>,
}

impl ImageTextTemplate {
    pub fn new(slide: Slide, content: ImageTextContent, latch: Arc<CompletionLatch>) -> Self {
        let background = content
            .image
            .as_deref()
            .and_then(|id| media::resolve(&slide.media, id).ok());
        let theme = ScopedTheme::compose(slide.theme_css.as_deref(), &slide.execution_id);
        let execution = SlideExecution::new(latch.callback());
        Self {
            slide,
            content,
            background,
            theme,
            execution,
            latch,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.content.title.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.content.text.as_deref()
    }

    pub fn background_url(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn state(&self) -> ExecutionState {
        self.execution.state()
    }
}

impl SlideTemplate for ImageTextTemplate {
    fn kind(&self) -> &'static str {
        "image_text"
    }

    fn execution_id(&self) -> &ExecutionId {
        &self.slide.execution_id
    }

    fn set_run(&mut self, run: bool) {
        if run {
            self.execution.start(self.slide.duration());
        } else {
            self.execution.stop();
        }
    }

    fn theme(&self) -> Option<&ScopedTheme> {
        self.theme.as_ref()
    }
}

impl Drop for ImageTextTemplate {
    fn drop(&mut self) {
        self.latch.disarm();
        self.execution.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelHost;
    use crate::model::{AssetFiles, MediaAsset};
    use std::time::Duration;
    use tokio::time::sleep;

    fn slide() -> Slide {
        let mut slide = Slide::new("welcome", 2000).activate(ExecutionId::new("exec-1"));
        slide.theme_css = Some("#SLIDE_ID h1 { color: red }".into());
        slide.media.insert(
            "bg".into(),
            MediaAsset {
                assets: Some(AssetFiles {
                    uri: Some("https://cdn/bg.jpg".into()),
                }),
                url: None,
            },
        );
        slide
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_slide_duration() {
        let (host, mut rx) = ChannelHost::new();
        let slide = slide();
        let latch = CompletionLatch::new(Arc::new(host), slide.clone());
        let content = ImageTextContent {
            title: Some("Hello".into()),
            text: None,
            image: Some("bg".into()),
        };
        let mut template = ImageTextTemplate::new(slide, content, latch);
        assert_eq!(template.background_url(), Some("https://cdn/bg.jpg"));
        assert_eq!(template.theme().unwrap().css(), "#exec-1 h1 { color: red }");
        assert_eq!(template.title(), Some("Hello"));

        template.set_run(true);
        sleep(Duration::from_millis(1999)).await;
        assert!(rx.try_recv().is_err());
        sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().unwrap().id, "welcome");
        assert_eq!(template.state(), ExecutionState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_image_renders_without_background() {
        let (host, _rx) = ChannelHost::new();
        let slide = slide();
        let latch = CompletionLatch::new(Arc::new(host), slide.clone());
        let content = ImageTextContent {
            image: Some("missing".into()),
            ..Default::default()
        };
        let template = ImageTextTemplate::new(slide, content, latch);
        assert_eq!(template.background_url(), None);
        assert_eq!(template.text(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn run_false_and_teardown_never_complete() {
        let (host, mut rx) = ChannelHost::new();
        let slide = slide();
        let latch = CompletionLatch::new(Arc::new(host), slide.clone());
        let mut template = ImageTextTemplate::new(slide, ImageTextContent::default(), latch);
        template.set_run(true);
        sleep(Duration::from_millis(500)).await;
        template.set_run(false);
        assert_eq!(template.state(), ExecutionState::Idle);
        template.set_run(true);
        sleep(Duration::from_millis(500)).await;
        drop(template);
        sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
