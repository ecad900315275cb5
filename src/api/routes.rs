use actix_web::http::header;
use actix_web::{delete, get, post, web, HttpResponse};
use std::sync::Arc;
use tracing::{error, info};

use crate::answerer::Answerer;
use crate::api::error::ApiError;
use crate::api::models::{
    required, ChatIdQuery, LoginRequest, LoginResponse, MessageResponse, MetadataRequest,
    PdfQuery, QueryRequest, QueryResponse, SignupRequest,
};
use crate::auth::{hash_password, verify_password, TokenSigner};
use crate::config::AppConfig;
use crate::db::{new_chat_id, DbError, DbPool, NewChatRecord};
use crate::metadata::MetadataFetcher;

fn db_failure(context: &'static str) -> impl Fn(DbError) -> ApiError {
    move |e| {
        error!("{}: {}", context, e);
        ApiError::Database(e)
    }
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

// --- Chats ---

#[post("/query")]
pub async fn submit_query(
    pool: web::Data<DbPool>,
    answerer: web::Data<Arc<dyn Answerer>>,
    req: web::Json<QueryRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let query = required(req.query.as_deref())
        .ok_or_else(|| ApiError::validation("Query parameter is required"))?;
    let chat_id = required(req.chat_id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(new_chat_id);

    info!("Query payload received for {}: {}", chat_id, query);

    let bundle = answerer.answer(query).await.map_err(|e| {
        error!("Answerer {} failed: {}", answerer.name(), e);
        ApiError::Upstream(e)
    })?;

    pool.insert_record(NewChatRecord {
        chat_id: chat_id.clone(),
        query: bundle.query.clone(),
        answer: bundle.answer.clone(),
        citations: bundle.citations.clone(),
    })
    .await
    .map_err(db_failure("Error saving chat record"))?;

    Ok(HttpResponse::Ok().json(QueryResponse { chat_id, bundle }))
}

#[get("/chat-list")]
pub async fn list_chats(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let chats = pool
        .list_chats()
        .await
        .map_err(db_failure("Error retrieving chat list"))?;
    Ok(HttpResponse::Ok().json(chats))
}

#[get("/chat-history/{chat_id}")]
pub async fn chat_history(
    pool: web::Data<DbPool>,
    chat_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let chat_id = chat_id.into_inner();
    let chat_id = required(Some(chat_id.as_str()))
        .ok_or_else(|| ApiError::validation("Chat ID is required"))?;

    let records = pool
        .chat_history(chat_id)
        .await
        .map_err(db_failure("Error retrieving chat history"))?;
    Ok(HttpResponse::Ok().json(records))
}

#[delete("/chat")]
pub async fn delete_chat(
    pool: web::Data<DbPool>,
    query: web::Query<ChatIdQuery>,
) -> Result<HttpResponse, ApiError> {
    let chat_id = required(query.chat_id.as_deref())
        .ok_or_else(|| ApiError::validation("Chat ID is required"))?;

    let deleted = pool
        .delete_chat(chat_id)
        .await
        .map_err(db_failure("Error deleting chat"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Chat not found".to_string()));
    }

    info!("Deleted {} records for {}", deleted, chat_id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Chat deleted successfully")))
}

// --- Users ---

#[post("/signup")]
pub async fn signup(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let (username, email, password) = match (
        required(req.username.as_deref()),
        required(req.email.as_deref()),
        req.password.filter(|p| !p.is_empty()),
    ) {
        (Some(u), Some(e), Some(p)) => (u.to_string(), e.to_string(), p),
        _ => return Err(ApiError::validation("All fields are required")),
    };

    let exists = pool
        .user_exists(&username, &email)
        .await
        .map_err(db_failure("Error checking existing user"))?;
    if exists {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let cost = config.auth.bcrypt_cost;
    let password_hash = web::block(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            error!("Error hashing password: {}", e);
            ApiError::Internal(e.to_string())
        })?;

    match pool.create_user(&username, &email, &password_hash).await {
        Ok(user) => {
            info!("Registered user {} ({})", user.username, user.id);
            Ok(HttpResponse::Created().json(MessageResponse::new("User registered successfully")))
        }
        Err(DbError::Conflict(_)) => Err(ApiError::Conflict("User already exists".to_string())),
        Err(e) => Err(db_failure("Error creating user")(e)),
    }
}

#[post("/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    signer: web::Data<TokenSigner>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let (username, password) = match (
        required(req.username.as_deref()),
        req.password.filter(|p| !p.is_empty()),
    ) {
        (Some(u), Some(p)) => (u.to_string(), p),
        _ => return Err(ApiError::validation("Username and password required")),
    };

    let user = pool
        .find_user(&username)
        .await
        .map_err(db_failure("Error looking up user"))?
        .ok_or(ApiError::InvalidCredentials)?;

    let hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            error!("Error verifying password for {}: {}", username, e);
            ApiError::InvalidCredentials
        })?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let session = signer.issue(user.id).map_err(|e| {
        error!("Error issuing session token: {}", e);
        ApiError::Internal(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        user_id: user.id,
        token: session.token,
        expires_at: session.expires_at,
    }))
}

// --- Documents and links ---

#[get("/pdf")]
pub async fn fetch_pdf(
    pool: web::Data<DbPool>,
    query: web::Query<PdfQuery>,
) -> Result<HttpResponse, ApiError> {
    let name = required(query.name.as_deref())
        .ok_or_else(|| ApiError::validation("PDF name is required"))?;

    let contents = pool
        .get_pdf(name)
        .await
        .map_err(db_failure("Error retrieving PDF"))?
        .ok_or_else(|| ApiError::NotFound("PDF not found".to_string()))?;

    let filename = name.replace(['"', '\\'], "_");
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}.pdf\"", filename),
        ))
        .body(contents))
}

#[post("/metadata")]
pub async fn fetch_metadata(
    fetcher: web::Data<MetadataFetcher>,
    req: web::Json<MetadataRequest>,
) -> Result<HttpResponse, ApiError> {
    let url = required(req.url.as_deref()).ok_or_else(|| ApiError::validation("URL is required"))?;
    Ok(HttpResponse::Ok().json(fetcher.fetch(url).await))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api")
            .service(submit_query)
            .service(list_chats)
            .service(chat_history)
            .service(delete_chat)
            .service(signup)
            .service(login)
            .service(fetch_pdf)
            .service(fetch_metadata),
    );
}
