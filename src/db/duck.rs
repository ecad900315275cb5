use crate::db::models::{ChatRecord, Citations, NewChatRecord, User};
use crate::db::{ChatStore, DbError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use duckdb::types::Type;
use duckdb::{params, Connection, Result as DbResult, Row};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

const SCHEMA: &str = r#"
BEGIN TRANSACTION;

CREATE SEQUENCE IF NOT EXISTS seq_users_id;
CREATE SEQUENCE IF NOT EXISTS seq_chat_history_id;

CREATE TABLE IF NOT EXISTS users (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_users_id'),
    username VARCHAR UNIQUE NOT NULL,
    email VARCHAR UNIQUE NOT NULL,
    password VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_history (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_chat_history_id'),
    chat_id VARCHAR NOT NULL,
    query VARCHAR NOT NULL,
    answer VARCHAR NOT NULL,
    pdf_references VARCHAR DEFAULT '[]',
    similar_images VARCHAR DEFAULT '[]',
    online_images VARCHAR DEFAULT '[]',
    online_videos VARCHAR DEFAULT '[]',
    online_links VARCHAR DEFAULT '[]',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_chat_history_chat ON chat_history(chat_id, created_at);

CREATE TABLE IF NOT EXISTS pdfdata (
    pdf_name VARCHAR PRIMARY KEY,
    pdf_file BLOB NOT NULL
);

COMMIT;
"#;

// Timestamps are selected as text; duckdb-rs is built without its chrono feature.
const RECORD_COLUMNS: &str = "id, chat_id, query, answer, pdf_references, similar_images, \
     online_images, online_videos, online_links, CAST(created_at AS VARCHAR)";

/// Embedded DuckDB store for local development and tests.
pub struct DuckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckStore {
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self, DbError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };

        info!("Initializing database schema");
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn row_to_record(row: &Row) -> DbResult<ChatRecord> {
        let created_str: String = row.get(9)?;
        let created_at = NaiveDateTime::parse_from_str(&created_str, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| duckdb::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

        Ok(ChatRecord {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            query: row.get(2)?,
            answer: row.get(3)?,
            citations: Citations {
                pdf_references: json_column(row, 4)?,
                similar_images: json_column(row, 5)?,
                online_images: json_column(row, 6)?,
                online_videos: json_column(row, 7)?,
                online_links: json_column(row, 8)?,
            },
            created_at,
        })
    }

    fn row_to_user(row: &Row) -> DbResult<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
        })
    }
}

fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> DbResult<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_constraint(err: duckdb::Error) -> DbError {
    let msg = err.to_string();
    if msg.contains("Duplicate key") || msg.contains("Constraint Error") {
        DbError::Conflict(msg)
    } else {
        DbError::Duck(err)
    }
}

#[async_trait]
impl ChatStore for DuckStore {
    fn backend(&self) -> &'static str {
        "duckdb"
    }

    async fn insert_record(&self, record: NewChatRecord) -> Result<ChatRecord, DbError> {
        let c = &record.citations;
        let pdf_references = serde_json::to_string(&c.pdf_references)?;
        let similar_images = serde_json::to_string(&c.similar_images)?;
        let online_images = serde_json::to_string(&c.online_images)?;
        let online_videos = serde_json::to_string(&c.online_videos)?;
        let online_links = serde_json::to_string(&c.online_links)?;

        let conn = self.lock()?;
        let sql = format!(
            "INSERT INTO chat_history
             (chat_id, query, answer, pdf_references, similar_images, online_images, online_videos, online_links)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {}",
            RECORD_COLUMNS
        );
        let inserted = conn.query_row(
            &sql,
            params![
                record.chat_id,
                record.query,
                record.answer,
                pdf_references,
                similar_images,
                online_images,
                online_videos,
                online_links
            ],
            Self::row_to_record,
        )?;
        Ok(inserted)
    }

    async fn list_chats(&self) -> Result<Vec<ChatRecord>, DbError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM (
                SELECT *, row_number() OVER (PARTITION BY chat_id ORDER BY created_at ASC, id ASC) AS rn
                FROM chat_history
             ) ranked
             WHERE rn = 1
             ORDER BY chat_id ASC, created_at ASC",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }

    async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, DbError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM chat_history WHERE chat_id = ? ORDER BY created_at ASC, id ASC",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![chat_id], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<u64, DbError> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM chat_history WHERE chat_id = ?", params![chat_id])?;
        Ok(affected as u64)
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DbError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ? OR username = ?",
            params![email, username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let conn = self.lock()?;
        conn.query_row(
            "INSERT INTO users (username, email, password) VALUES (?, ?, ?)
             RETURNING id, username, email, password",
            params![username, email, password_hash],
            Self::row_to_user,
        )
        .map_err(map_constraint)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, DbError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, username, email, password FROM users WHERE username = ?")?;
        let mut rows = stmt.query_map(params![username], Self::row_to_user)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn get_pdf(&self, name: &str) -> Result<Option<Vec<u8>>, DbError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT pdf_file FROM pdfdata WHERE pdf_name = ?")?;
        let mut rows = stmt.query_map(params![name], |row| row.get::<_, Vec<u8>>(0))?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn put_pdf(&self, name: &str, contents: &[u8]) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pdfdata (pdf_name, pdf_file) VALUES (?, ?)
             ON CONFLICT (pdf_name) DO UPDATE SET pdf_file = excluded.pdf_file",
            params![name, contents.to_vec()],
        )?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing DuckDB store");
    }
}
