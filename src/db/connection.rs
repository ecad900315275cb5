use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::db::duck::DuckStore;
use crate::db::postgres::PgStore;
use crate::db::{ChatStore, DbError};
use std::sync::Arc;
use tracing::info;

pub type DbPool = Arc<dyn ChatStore>;

/// Opens the configured backend and ensures the schema exists.
pub async fn get_connection(config: &DatabaseConfig) -> Result<DbPool, DbError> {
    match config.backend {
        DatabaseBackend::Postgres => {
            info!(
                "Connecting to PostgreSQL at {}:{}/{}",
                config.host, config.port, config.name
            );
            let store = PgStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        DatabaseBackend::Duckdb => {
            info!("Connecting to DuckDB at {}", config.path);
            let store = DuckStore::open(&config.path)?;
            Ok(Arc::new(store))
        }
    }
}
