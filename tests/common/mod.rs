#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use navigator::answerer::models::AnswerBundle;
use navigator::answerer::{AnswerError, Answerer};
use navigator::api::AppState;
use navigator::auth::TokenSigner;
use navigator::config::{AppConfig, DatabaseConfig};
use navigator::db::duck::DuckStore;
use navigator::db::{Citations, PdfReference};
use navigator::metadata::MetadataFetcher;

/// Answers every query locally. A query containing "fail" is rejected the
/// way a malformed upstream payload would be.
pub struct StubAnswerer;

#[async_trait]
impl Answerer for StubAnswerer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn answer(&self, query: &str) -> Result<AnswerBundle, AnswerError> {
        if query.contains("fail") {
            return Err(AnswerError::InvalidResponse("missing answer".to_string()));
        }
        Ok(AnswerBundle {
            query: query.to_string(),
            answer: format!("Answer to {}", query),
            citations: Citations {
                pdf_references: vec![PdfReference {
                    pdf_name: "gdpr".to_string(),
                    page_numbers: vec![3, 4],
                }],
                online_links: vec!["https://gdpr.eu".to_string()],
                ..Default::default()
            },
        })
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig::in_memory();
    config.auth.bcrypt_cost = 4;
    config.auth.token_secret = "integration-test-secret".to_string();
    config.metadata.proxy_url = String::new();
    config.metadata.timeout_secs = 2;
    config
}

pub fn test_state(config: AppConfig) -> AppState {
    let pool = Arc::new(DuckStore::open(":memory:").unwrap());
    let metadata = Arc::new(MetadataFetcher::new(&config.metadata).unwrap());
    let signer = Arc::new(TokenSigner::from_config(&config.auth));
    AppState {
        config,
        pool,
        answerer: Arc::new(StubAnswerer),
        metadata,
        signer,
    }
}

/// Initializes the full application (routes plus session middleware) for
/// `actix_web::test` calls.
#[macro_export]
macro_rules! init_app {
    ($state:expr) => {{
        let state = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(navigator::api::middleware::RequireSession)
                .configure(move |cfg| state.configure(cfg)),
        )
        .await
    }};
}
