pub mod http;
pub mod models;

pub use http::HttpAnswerer;

use async_trait::async_trait;
use thiserror::Error;

use models::AnswerBundle;

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

/// The external service that turns a natural-language query into an answer
/// bundle.
#[async_trait]
pub trait Answerer: Send + Sync {
    fn name(&self) -> &str;

    async fn answer(&self, query: &str) -> Result<AnswerBundle, AnswerError>;
}
