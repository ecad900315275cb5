//! Terminal counterpart of the browser client: an HTTP client for the API,
//! the chat view state machine it drives, and the client-local stores
//! (recent queries, link metadata) and voice capabilities.

pub mod api;
pub mod cache;
pub mod recent;
pub mod view;
pub mod voice;

pub use api::ApiClient;
pub use cache::MetadataCache;
pub use recent::RecentQueries;
pub use view::{ChatBackend, ChatMessage, ChatView};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
