use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::answerer::models::{AnswerBundle, AnswerRequest, RawAnswer};
use crate::answerer::{AnswerError, Answerer};
use crate::config::AnswererConfig;

/// Answerer reached over HTTP: `POST {base_url}/api/query` with `{"query": ...}`.
pub struct HttpAnswerer {
    client: Client,
    base_url: String,
}

impl HttpAnswerer {
    pub fn new(config: &AnswererConfig) -> Result<Self, AnswerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnswerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Answerer for HttpAnswerer {
    fn name(&self) -> &str {
        "http"
    }

    async fn answer(&self, query: &str) -> Result<AnswerBundle, AnswerError> {
        let response = self
            .client
            .post(format!("{}/api/query", self.base_url))
            .json(&AnswerRequest { query })
            .send()
            .await
            .map_err(|e| AnswerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AnswerError::InvalidResponse(format!("status {}: {}", status, text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnswerError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(AnswerError::InvalidResponse("empty body".to_string()));
        }

        let raw: RawAnswer = serde_json::from_str(&body)
            .map_err(|e| AnswerError::InvalidResponse(e.to_string()))?;
        debug!("Answerer responded for query {:?}", query);

        raw.into_bundle(query)
    }
}
