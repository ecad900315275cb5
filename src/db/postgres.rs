use crate::config::DatabaseConfig;
use crate::db::models::{ChatRecord, Citations, NewChatRecord, User};
use crate::db::{ChatStore, DbError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS chat_history (
        id SERIAL PRIMARY KEY,
        chat_id TEXT NOT NULL,
        query TEXT NOT NULL,
        answer TEXT NOT NULL,
        pdf_references JSONB DEFAULT '[]',
        similar_images JSONB DEFAULT '[]',
        online_images JSONB DEFAULT '[]',
        online_videos JSONB DEFAULT '[]',
        online_links JSONB DEFAULT '[]',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_chat_history_chat ON chat_history(chat_id, created_at)",
];

// `pdfdata` belongs to the ingestion pipeline, which also keeps its text
// vectors there. It is never created here and may lack a unique index.

const RECORD_COLUMNS: &str = "id, chat_id, query, answer, pdf_references, similar_images, \
     online_images, online_videos, online_links, created_at";

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: PgPool) -> Result<Self, DbError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), DbError> {
        info!("Initializing database schema");
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn row_to_record(row: &PgRow) -> Result<ChatRecord, sqlx::Error> {
        let id: i32 = row.try_get("id")?;
        Ok(ChatRecord {
            id: i64::from(id),
            chat_id: row.try_get("chat_id")?,
            query: row.try_get("query")?,
            answer: row.try_get("answer")?,
            citations: Citations {
                pdf_references: json_list(row, "pdf_references")?,
                similar_images: json_list(row, "similar_images")?,
                online_images: json_list(row, "online_images")?,
                online_videos: json_list(row, "online_videos")?,
                online_links: json_list(row, "online_links")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User, sqlx::Error> {
        let id: i32 = row.try_get("id")?;
        Ok(User {
            id: i64::from(id),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
        })
    }
}

fn json_list<T: DeserializeOwned>(row: &PgRow, column: &str) -> Result<Vec<T>, sqlx::Error> {
    let value: Option<Json<Vec<T>>> = row.try_get(column)?;
    Ok(value.map(|j| j.0).unwrap_or_default())
}

fn map_constraint(err: sqlx::Error) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            DbError::Conflict(db.message().to_string())
        }
        _ => DbError::Postgres(err),
    }
}

#[async_trait]
impl ChatStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_record(&self, record: NewChatRecord) -> Result<ChatRecord, DbError> {
        let sql = format!(
            "INSERT INTO chat_history
             (chat_id, query, answer, pdf_references, similar_images, online_images, online_videos, online_links)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            RECORD_COLUMNS
        );
        let c = &record.citations;
        let row = sqlx::query(&sql)
            .bind(&record.chat_id)
            .bind(&record.query)
            .bind(&record.answer)
            .bind(Json(&c.pdf_references))
            .bind(Json(&c.similar_images))
            .bind(Json(&c.online_images))
            .bind(Json(&c.online_videos))
            .bind(Json(&c.online_links))
            .fetch_one(&self.pool)
            .await?;
        Ok(Self::row_to_record(&row)?)
    }

    async fn list_chats(&self) -> Result<Vec<ChatRecord>, DbError> {
        let sql = format!(
            "SELECT DISTINCT ON (chat_id) {} FROM chat_history ORDER BY chat_id, created_at ASC, id ASC",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let chats = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chats)
    }

    async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, DbError> {
        let sql = format!(
            "SELECT {} FROM chat_history WHERE chat_id = $1 ORDER BY created_at ASC, id ASC",
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(chat_id).fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM chat_history WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn user_exists(&self, username: &str, email: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE email = $1 OR username = $2")
            .bind(email)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n > 0)
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let row = sqlx::query(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3)
             RETURNING id, username, email, password",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)?;
        Ok(Self::row_to_user(&row)?)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query("SELECT id, username, email, password FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_pdf(&self, name: &str) -> Result<Option<Vec<u8>>, DbError> {
        let row = sqlx::query("SELECT pdf_file FROM pdfdata WHERE pdf_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("pdf_file")?)),
            None => Ok(None),
        }
    }

    async fn put_pdf(&self, name: &str, contents: &[u8]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE pdfdata SET pdf_file = $2 WHERE pdf_name = $1")
            .bind(name)
            .bind(contents)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            sqlx::query("INSERT INTO pdfdata (pdf_name, pdf_file) VALUES ($1, $2)")
                .bind(name)
                .bind(contents)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing PostgreSQL pool");
        self.pool.close().await;
    }
}
