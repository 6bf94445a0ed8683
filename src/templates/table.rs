use crate::execution::{ExecutionState, SlideExecution};
use crate::host::CompletionLatch;
use crate::media;
use crate::model::{ExecutionId, Slide};
use crate::templates::SlideTemplate;
use crate::theme::ScopedTheme;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableColumn {
    pub title: String,
    /// Key looked up in each row.
    pub field: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableContent {
    pub title: Option<String>,
    pub text: Option<String>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<HashMap<String, String>>,
    pub background_image: Vec<String>,
}

impl TableContent {
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.title.as_str()).collect()
    }

    /// Row-major cells in column order; missing fields are blank.
    pub fn cells(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| row.get(&c.field).map(String::as_str).unwrap_or(""))
                    .collect()
            })
            .collect()
    }
}

pub struct TableTemplate {
    slide: Slide,
    content: TableContent,
    background: Option<String>,
    images: Vec<String>,
    theme: Option<ScopedTheme>,
    execution: SlideExecution,
    latch: Arc<CompletionLatch>,
}

impl TableTemplate {
    pub fn new(slide: Slide, content: TableContent, latch: Arc<CompletionLatch>) -> Self {
        let background = media::first_media_url(&slide.media, &content.background_image);
        let images = media::all_media_urls(&slide.media, &content.background_image);
        let theme = ScopedTheme::compose(slide.theme_css.as_deref(), &slide.execution_id);
        let execution = SlideExecution::new(latch.callback());
        Self {
            slide,
            content,
            background,
            images,
            theme,
            execution,
            latch,
        }
    }

    pub fn content(&self) -> &TableContent {
        &self.content
    }

    pub fn background_url(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// Every resolvable background image, for hosts that preload them.
    pub fn image_urls(&self) -> &[String] {
        &self.images
    }

    pub fn state(&self) -> ExecutionState {
        self.execution.state()
    }
}

impl SlideTemplate for TableTemplate {
    fn kind(&self) -> &'static str {
        "table"
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

impl Drop for TableTemplate {
    fn drop(&mut self) {
        self.latch.disarm();
        self.execution.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ChannelHost;
    use crate::model::MediaAsset;
    use std::time::Duration;

    const TABLE: &str = r#"
title: Opening hours
columns:
  - { title: Day, field: day }
  - { title: Hours, field: hours }
rows:
  - { day: Monday, hours: "9-17" }
  - { day: Sunday }
background_image: [missing]
"#;

    #[test]
    fn cells_follow_column_order() {
        let content: TableContent = serde_yaml::from_str(TABLE).unwrap();
        assert_eq!(content.header(), vec!["Day", "Hours"]);
        assert_eq!(
            content.cells(),
            vec![vec!["Monday", "9-17"], vec!["Sunday", ""]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completes_once_after_duration() {
        let (host, mut rx) = ChannelHost::new();
        let slide = Slide::new("hours", 3000).activate(ExecutionId::new("t-1"));
        let latch = CompletionLatch::new(Arc::new(host), slide.clone());
        let content: TableContent = serde_yaml::from_str(TABLE).unwrap();
        let mut template = TableTemplate::new(slide, content, latch);
        assert_eq!(template.background_url(), None);
        assert!(template.theme().is_none());

        template.set_run(true);
        tokio::time::sleep(Duration::from_millis(3001)).await;
        assert_eq!(rx.recv().await.unwrap().execution_id.as_str(), "t-1");
        assert_eq!(template.state(), ExecutionState::Done);
        assert_eq!(template.content().title.as_deref(), Some("Opening hours"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn background_is_first_image_only() {
        let (host, _rx) = ChannelHost::new();
        let mut slide = Slide::new("hours", 3000).activate(ExecutionId::new("t-2"));
        slide.media.insert(
            "bg".into(),
            MediaAsset {
                assets: None,
                url: Some("https://cdn/bg.png".into()),
            },
        );
        let latch = CompletionLatch::new(Arc::new(host), slide.clone());
        let mut content: TableContent = serde_yaml::from_str(TABLE).unwrap();

        content.background_image = vec!["missing".into(), "bg".into()];
        let template = TableTemplate::new(slide.clone(), content.clone(), latch.clone());
        assert_eq!(template.background_url(), None);
        assert_eq!(template.image_urls().to_vec(), vec!["https://cdn/bg.png".to_string()]);
        drop(template);

        content.background_image = vec!["bg".into(), "missing".into()];
        let template = TableTemplate::new(slide, content, latch);
        assert_eq!(template.background_url(), Some("https://cdn/bg.png"));
        assert_eq!(template.image_urls().len(), 1);
    }
}
