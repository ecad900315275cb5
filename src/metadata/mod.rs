pub mod parse;

pub use parse::parse_metadata;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MetadataConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: String,
    pub icon: String,
}

impl LinkMetadata {
    /// What callers render when a page could not be resolved.
    pub fn placeholder() -> Self {
        Self {
            title: "Unknown".to_string(),
            icon: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Proxy returned no contents")]
    EmptyContents,
}

#[derive(Deserialize)]
struct ProxyResponse {
    contents: Option<String>,
}

/// Best-effort title/favicon scraper.
pub struct MetadataFetcher {
    client: Client,
    proxy_url: Option<String>,
}

impl MetadataFetcher {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let proxy_url = Some(config.proxy_url.trim().to_string()).filter(|p| !p.is_empty());

        Ok(Self { client, proxy_url })
    }

    /// Never fails: any error degrades to [`LinkMetadata::placeholder`].
    pub async fn fetch(&self, url: &str) -> LinkMetadata {
        match self.try_fetch(url).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Error fetching metadata for {}: {}", url, e);
                LinkMetadata::placeholder()
            }
        }
    }

    pub async fn try_fetch(&self, url: &str) -> Result<LinkMetadata, MetadataError> {
        let page_url = Url::parse(url).map_err(|e| MetadataError::InvalidUrl(e.to_string()))?;
        info!("Fetching metadata for {}", page_url);

        let html = match &self.proxy_url {
            Some(proxy) => self.fetch_via_proxy(proxy, url).await?,
            None => self.fetch_direct(&page_url).await?,
        };

        Ok(parse_metadata(&html, &page_url))
    }

    async fn fetch_via_proxy(&self, proxy: &str, url: &str) -> Result<String, MetadataError> {
        let response = self
            .client
            .get(format!("{}?url={}", proxy, urlencoding::encode(url)))
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        let body: ProxyResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;
        body.contents.ok_or(MetadataError::EmptyContents)
    }

    async fn fetch_direct(&self, page_url: &Url) -> Result<String, MetadataError> {
        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_degrades_to_placeholder() {
        let fetcher = MetadataFetcher::new(&MetadataConfig::default()).unwrap();
        assert_eq!(fetcher.fetch("not a url").await, LinkMetadata::placeholder());
    }

    #[test]
    fn blank_proxy_means_direct() {
        let cfg = MetadataConfig {
            proxy_url: "  ".into(),
            ..Default::default()
        };
        let fetcher = MetadataFetcher::new(&cfg).unwrap();
        assert!(fetcher.proxy_url.is_none());
    }
}
