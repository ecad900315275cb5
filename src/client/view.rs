use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{error, warn};

use crate::api::models::QueryResponse;
use crate::client::cache::MetadataCache;
use crate::client::recent::RecentQueries;
use crate::client::ClientError;
use crate::db::models::{ChatRecord, Citations};
use crate::metadata::LinkMetadata;

/// The API calls the chat view depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn submit_query(
        &self,
        query: &str,
        chat_id: Option<&str>,
    ) -> Result<QueryResponse, ClientError>;

    async fn list_chats(&self) -> Result<Vec<ChatRecord>, ClientError>;

    async fn chat_history(&self, chat_id: &str) -> Result<Vec<ChatRecord>, ClientError>;

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ClientError>;

    async fn fetch_metadata(&self, url: &str) -> Result<LinkMetadata, ClientError>;
}

/// One exchange as shown in the transcript. Freshly submitted messages
/// have no server timestamp yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub chat_id: String,
    pub query: String,
    pub answer: String,
    pub citations: Citations,
    pub created_at: Option<NaiveDateTime>,
}

impl From<ChatRecord> for ChatMessage {
    fn from(record: ChatRecord) -> Self {
        Self {
            chat_id: record.chat_id,
            query: record.query,
            answer: record.answer,
            citations: record.citations,
            created_at: Some(record.created_at),
        }
    }
}

impl From<QueryResponse> for ChatMessage {
    fn from(response: QueryResponse) -> Self {
        Self {
            chat_id: response.chat_id,
            query: response.bundle.query,
            answer: response.bundle.answer,
            citations: response.bundle.citations,
            created_at: None,
        }
    }
}

/// Client-side chat state: either no chat is selected, or one is selected
/// with its transcript loaded.
pub struct ChatView<B> {
    backend: B,
    chat_list: Vec<ChatRecord>,
    selected: Option<String>,
    transcript: Vec<ChatMessage>,
    visible: Option<ChatMessage>,
    recent: RecentQueries,
    links: MetadataCache,
}

impl<B: ChatBackend> ChatView<B> {
    pub fn new(backend: B, recent: RecentQueries) -> Self {
        Self {
            backend,
            chat_list: Vec::new(),
            selected: None,
            transcript: Vec::new(),
            visible: None,
            recent,
            links: MetadataCache::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn chat_list(&self) -> &[ChatRecord] {
        &self.chat_list
    }

    pub fn selected_chat(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// The message currently shown as the result.
    pub fn visible(&self) -> Option<&ChatMessage> {
        self.visible.as_ref()
    }

    pub fn recent_queries(&self) -> &[String] {
        self.recent.items()
    }

    pub fn link_metadata(&self, url: &str) -> Option<&LinkMetadata> {
        self.links.get(url)
    }

    /// Back to the no-chat-selected state.
    pub fn new_chat(&mut self) {
        self.selected = None;
        self.transcript.clear();
        self.visible = None;
    }

    pub async fn refresh_chat_list(&mut self) -> Result<(), ClientError> {
        match self.backend.list_chats().await {
            Ok(chats) => {
                self.chat_list = chats;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching chat list: {}", e);
                Err(e)
            }
        }
    }

    /// Sends `query` in the selected chat, or starts a new one. Blank input
    /// is ignored.
    pub async fn submit(&mut self, query: &str) -> Result<(), ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.recent.record(query) {
            warn!("Could not persist recent queries: {}", e);
        }

        let response = match self.backend.submit_query(query, self.selected.as_deref()).await {
            Ok(r) => r,
            Err(e) => {
                error!("Query failed: {}", e);
                self.visible = None;
                return Err(e);
            }
        };

        let _ = self.refresh_chat_list().await;

        let message = ChatMessage::from(response);
        if self.selected.is_none() {
            self.selected = Some(message.chat_id.clone());
            self.transcript = vec![message.clone()];
        } else {
            self.transcript.push(message.clone());
        }
        self.visible = Some(message);

        self.resolve_links().await;
        Ok(())
    }

    /// Loads the full history of `chat_id` and makes it the selection. On
    /// failure the current state is kept.
    pub async fn select(&mut self, chat_id: &str) -> Result<(), ClientError> {
        let history = match self.backend.chat_history(chat_id).await {
            Ok(h) => h,
            Err(e) => {
                error!("Error fetching chat history: {}", e);
                return Err(e);
            }
        };

        self.selected = Some(chat_id.to_string());
        self.transcript = history.into_iter().map(ChatMessage::from).collect();
        self.visible = match self.transcript.last() {
            Some(last) => Some(last.clone()),
            None => self
                .chat_list
                .iter()
                .find(|c| c.chat_id == chat_id)
                .cloned()
                .map(ChatMessage::from),
        };

        self.resolve_links().await;
        Ok(())
    }

    pub async fn delete(&mut self, chat_id: &str) -> Result<(), ClientError> {
        if let Err(e) = self.backend.delete_chat(chat_id).await {
            error!("Error deleting chat: {}", e);
            return Err(e);
        }

        let _ = self.refresh_chat_list().await;
        if self.selected.as_deref() == Some(chat_id) {
            self.new_chat();
        }
        Ok(())
    }

    /// Fetches title/icon for every transcript link not yet cached. Failed
    /// lookups are cached as placeholders.
    pub async fn resolve_links(&mut self) {
        let missing = self
            .links
            .missing(self.transcript.iter().flat_map(|m| m.citations.online_links.iter()));

        for url in missing {
            let meta = match self.backend.fetch_metadata(&url).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Error fetching metadata for {}: {}", url, e);
                    LinkMetadata::placeholder()
                }
            };
            self.links.insert(url, meta);
        }
    }
}
