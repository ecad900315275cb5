use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answerer::models::AnswerBundle;

// Request bodies keep every field optional so a missing field turns into a
// field-specific 400 instead of a generic deserialization error.

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct QueryRequest {
    pub query: Option<String>,
    #[serde(rename = "chatId", alias = "chat_id", default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub chat_id: String,
    #[serde(flatten)]
    pub bundle: AnswerBundle,
}

#[derive(Debug, Deserialize)]
pub struct ChatIdQuery {
    #[serde(rename = "chatId", alias = "chat_id")]
    pub chat_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PdfQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct MetadataRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trimmed, non-empty value of an optional field.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
