pub mod connection;
pub mod duck;
pub mod models;
pub mod postgres;

pub use connection::{get_connection, DbPool};
pub use models::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("DuckDB error: {0}")]
    Duck(#[from] duckdb::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Persistence for users, chat history and stored PDFs.
///
/// Records are append-only: nothing here updates a chat row after insert.
#[async_trait]
pub trait ChatStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn insert_record(&self, record: NewChatRecord) -> Result<ChatRecord, DbError>;

    /// One row per chat_id (its earliest record), ordered by chat_id then time.
    async fn list_chats(&self) -> Result<Vec<ChatRecord>, DbError>;

    /// All records of a chat in creation order. Unknown ids yield an empty list.
    async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, DbError>;

    /// Returns the number of deleted records.
    async fn delete_chat(&self, chat_id: &str) -> Result<u64, DbError>;

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DbError>;

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, DbError>;

    async fn get_pdf(&self, name: &str) -> Result<Option<Vec<u8>>, DbError>;

    async fn put_pdf(&self, name: &str, contents: &[u8]) -> Result<(), DbError>;

    async fn close(&self);
}
