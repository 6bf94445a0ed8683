use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Http;

/// Source of raw feed payloads.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct HttpFeedClient {
    http: Client,
    user_agent: String,
}

impl fmt::Debug for HttpFeedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFeedClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl HttpFeedClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build feed http client")?;
        Ok(Self {
            http,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn from_config(cfg: &Http) -> Result<Self> {
        Self::new(&cfg.user_agent, Duration::from_millis(cfg.timeout_ms))
    }

    pub fn build_request(&self, url: &str) -> Result<reqwest::Request> {
        let url = Url::parse(url).with_context(|| format!("invalid feed url: {}", url))?;
        self.http
            .get(url)
            .header("Accept", "application/rss+xml, application/xml, text/xml")
            .build()
            .context("failed to build feed request")
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let request = self.build_request(url)?;
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach feed")?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(anyhow!("feed responded with {}", status));
        }
        let body = res.text().await.context("failed to read feed body")?;
        debug!(bytes = body.len(), "feed fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_is_plain_get() {
        let client = HttpFeedClient::new("signage-player/test", Duration::from_secs(5)).unwrap();
        let request = client.build_request("https://example.com/events.xml?x=1").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/events.xml");
        assert_eq!(request.url().query(), Some("x=1"));
        assert!(request.headers().get("Authorization").is_none());
        assert_eq!(
            request
                .headers()
                .get("Accept")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/rss+xml, application/xml, text/xml"
        );
    }

    #[test]
    fn rejects_invalid_url() {
        let client = HttpFeedClient::new("signage-player/test", Duration::from_secs(5)).unwrap();
        assert!(client.build_request("not a url").is_err());
        assert!(format!("{:?}", client).contains("signage-player/test"));
    }
}
