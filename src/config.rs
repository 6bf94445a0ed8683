//! Configuration loader and validator for the signage player.
use crate::feed::{FeedOptions, Locale};
use crate::model::Slide;
use crate::templates::SlideContent;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub http: Http,
    #[serde(default)]
    pub display: Display,
    pub playlist: Vec<PlaylistEntry>,
}

/// Playback loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// Start over after the last slide.
    pub loop_playlist: bool,
    /// Pause between two slides.
    pub gap_ms: u64,
}

/// Feed fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Http {
    pub user_agent: String,
    pub timeout_ms: u64,
}

/// Timezone and locales for date labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Display {
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_event_locale")]
    pub event_locale: Locale,
    #[serde(default = "default_rss_locale")]
    pub rss_locale: Locale,
}

fn default_event_locale() -> Locale {
    Locale::Icelandic
}

fn default_rss_locale() -> Locale {
    Locale::Danish
}

impl Default for Display {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            event_locale: default_event_locale(),
            rss_locale: default_rss_locale(),
        }
    }
}

impl Display {
    pub fn feed_options(&self) -> Result<FeedOptions, ConfigError> {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .ok_or(ConfigError::Invalid("display.utc_offset_minutes out of range"))?;
        Ok(FeedOptions {
            offset,
            event_locale: self.event_locale,
            published_locale: self.rss_locale,
        })
    }
}

/// One slide of the playlist with its template content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub slide: Slide,
    pub content: SlideContent,
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.http.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("http.user_agent must be non-empty"));
    }
    if cfg.http.timeout_ms == 0 {
        return Err(ConfigError::Invalid("http.timeout_ms must be > 0"));
    }
    cfg.display.feed_options()?;

    if cfg.playlist.is_empty() {
        return Err(ConfigError::Invalid("playlist must contain at least one slide"));
    }
    for entry in &cfg.playlist {
        if entry.slide.id.trim().is_empty() {
            return Err(ConfigError::Invalid("playlist.slide.id must be non-empty"));
        }
        if entry.content.is_fixed_duration() && entry.slide.duration_ms == 0 {
            return Err(ConfigError::Invalid("playlist.slide.duration_ms must be > 0"));
        }
        entry.content.validate().map_err(ConfigError::Invalid)?;
    }

    Ok(())
}

/// Example configuration covering every template.
pub fn example() -> &'static str {
    r##"app:
  loop_playlist: true
  gap_ms: 0

http:
  user_agent: "signage-player/0.1"
  timeout_ms: 10000

display:
  utc_offset_minutes: 0
  event_locale: is
  rss_locale: da

playlist:
  - slide:
      id: welcome
      duration_ms: 8000
      theme_css: "#SLIDE_ID h1 { color: #ee0043; }"
      media:
        hero:
          assets:
            uri: "https://cdn.example.com/hero.jpg"
    content:
      template: image_text
      title: "Welcome"
      text: "Opening hours are listed on the next slide."
      image: hero

  - slide:
      id: opening-hours
      duration_ms: 10000
    content:
      template: table
      title: "Opening hours"
      columns:
        - { title: "Day", field: day }
        - { title: "Hours", field: hours }
      rows:
        - { day: "Monday", hours: "9-17" }
        - { day: "Saturday", hours: "10-14" }

  - slide:
      id: news
    content:
      template: rss
      entry_duration_secs: 10
      number_of_entries: 5
      feed:
        title: "News"
        entries:
          - title: "Library reopens"
            last_modified: "Fri, 03 Mar 2023 14:00:00 +0000"
            content: "The main library reopens on Monday."

  - slide:
      id: events
    content:
      template: event
      feed: "https://events.example.com/rss.xml"
      amount: 5
      page_duration_ms: 10000
"##
}
