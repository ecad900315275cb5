use actix_web::{error, web, HttpRequest};
use std::sync::Arc;

use crate::answerer::{Answerer, HttpAnswerer};
use crate::api::error::ApiError;
use crate::api::routes;
use crate::auth::TokenSigner;
use crate::config::AppConfig;
use crate::db::{get_connection, DbPool};
use crate::metadata::MetadataFetcher;

/// Everything the handlers share. Built once at startup and registered as
/// app data on every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: DbPool,
    pub answerer: Arc<dyn Answerer>,
    pub metadata: Arc<MetadataFetcher>,
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let pool = get_connection(&config.database).await?;
        let answerer: Arc<dyn Answerer> = Arc::new(HttpAnswerer::new(&config.answerer)?);
        let metadata = Arc::new(MetadataFetcher::new(&config.metadata)?);
        let signer = Arc::new(TokenSigner::from_config(&config.auth));

        Ok(Self {
            config,
            pool,
            answerer,
            metadata,
            signer,
        })
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.pool.clone()))
            .app_data(web::Data::new(self.answerer.clone()))
            .app_data(web::Data::from(self.metadata.clone()))
            .app_data(web::Data::from(self.signer.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error));
        routes::configure(cfg);
    }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Invalid JSON body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Invalid query string: {}", err)).into()
}
