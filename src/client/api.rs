use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::models::{LoginResponse, MessageResponse, QueryResponse};
use crate::client::view::ChatBackend;
use crate::client::ClientError;
use crate::config::ClientConfig;
use crate::db::models::ChatRecord;
use crate::metadata::LinkMetadata;

/// HTTP client for the navigator API.
pub struct ApiClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.api_base)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<MessageResponse>()
            .await
            .map(|m| m.message)
            .unwrap_or_else(|_| status.to_string());

        if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn submit_query(
        &self,
        query: &str,
        chat_id: Option<&str>,
    ) -> Result<QueryResponse, ClientError> {
        let body = json!({ "query": query, "chatId": chat_id });
        self.send_json(self.request(Method::POST, "/api/query").json(&body))
            .await
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatRecord>, ClientError> {
        self.send_json(self.request(Method::GET, "/api/chat-list"))
            .await
    }

    pub async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, ClientError> {
        let path = format!("/api/chat-history/{}", urlencoding::encode(chat_id));
        self.send_json(self.request(Method::GET, &path)).await
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<MessageResponse, ClientError> {
        let builder = self
            .request(Method::DELETE, "/api/chat")
            .query(&[("chatId", chat_id)]);
        self.send_json(builder).await
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<MessageResponse, ClientError> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.send_json(self.request(Method::POST, "/api/signup").json(&body))
            .await
    }

    /// Keeps the issued token for subsequent requests.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = json!({ "username": username, "password": password });
        let response: LoginResponse = self
            .send_json(self.request(Method::POST, "/api/login").json(&body))
            .await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    pub async fn fetch_metadata(&self, url: &str) -> Result<LinkMetadata, ClientError> {
        let body = json!({ "url": url });
        self.send_json(self.request(Method::POST, "/api/metadata").json(&body))
            .await
    }

    pub async fn fetch_pdf(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .send(self.request(Method::GET, "/api/pdf").query(&[("name", name)]))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn submit_query(
        &self,
        query: &str,
        chat_id: Option<&str>,
    ) -> Result<QueryResponse, ClientError> {
        ApiClient::submit_query(self, query, chat_id).await
    }

    async fn list_chats(&self) -> Result<Vec<ChatRecord>, ClientError> {
        ApiClient::list_chats(self).await
    }

    async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, ClientError> {
        ApiClient::chat_history(self, chat_id).await
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ClientError> {
        ApiClient::delete_chat(self, chat_id).await.map(|_| ())
    }

    async fn fetch_metadata(&self, url: &str) -> Result<LinkMetadata, ClientError> {
        ApiClient::fetch_metadata(self, url).await
    }
}
