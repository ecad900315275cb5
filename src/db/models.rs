use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfReference {
    pub pdf_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub page_numbers: Vec<u32>,
}

/// An image the answerer found similar to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarImage {
    pub image_base64: String,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Citation collections attached to an answer. Absent or `null` lists
/// deserialize as empty so they are never stored as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citations {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pdf_references: Vec<PdfReference>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub similar_images: Vec<SimilarImage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub online_images: Vec<String>,
    /// Video identifiers.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub online_videos: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub online_links: Vec<String>,
}

/// One persisted query/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub chat_id: String,
    pub query: String,
    pub answer: String,
    #[serde(flatten)]
    pub citations: Citations,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewChatRecord {
    pub chat_id: String,
    pub query: String,
    pub answer: String,
    pub citations: Citations,
}

pub fn new_chat_id() -> String {
    format!("chat_{}", Uuid::new_v4().simple())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
