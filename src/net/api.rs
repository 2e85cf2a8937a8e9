//! REST clients for the conversation and auth endpoints.
//!
//! Thin `reqwest` wrappers. Path building and error-body handling are pure
//! functions so they can be tested without a server.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures map to `ApiError::Network`, non-2xx statuses to
//! `ApiError::Server` carrying the body-derived message, and malformed
//! success bodies to `ApiError::Decode`. Nothing here retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::repository::{AuthBackend, ConversationRepository};
use super::types::{
    AuthResponse, Category, Conversation, ConversationDraft, ConversationId, ConversationPage, ListFilter,
    LoginRequest, SignupRequest,
};
use crate::config::{ClientConfig, Timeouts};
use crate::error::{ApiError, server_error_message};

fn build_http(timeouts: Timeouts) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| ApiError::ClientBuild(e.to_string()))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

fn update_path(id: ConversationId) -> String {
    format!("/updateConversation/{id}")
}

fn delete_path(id: ConversationId) -> String {
    format!("/deleteConversation/{id}")
}

/// Paginated endpoint and its extra query pair for `filter`.
fn paged_endpoint(filter: &ListFilter) -> (&'static str, Option<(&'static str, String)>) {
    match filter {
        ListFilter::All => ("/conversations", None),
        ListFilter::SortedByTime => ("/conversationsSortedByTime", None),
        ListFilter::Category(category) => {
            ("/conversationsByCategory", Some(("category", category.as_str().to_owned())))
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!(error = %e, "backend unreachable");
        ApiError::Network(e.to_string())
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = server_error_message(&body);
    tracing::warn!(status = status.as_u16(), %message, "backend request failed");
    Err(ApiError::Server { status: status.as_u16(), message })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = send(request).await?;
    let text = response.text().await?;
    parse_body(&text)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// [`ConversationRepository`] backed by the `/chats` REST endpoints.
#[derive(Clone, Debug)]
pub struct HttpConversationRepository {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpConversationRepository {
    /// Client for the chats API rooted at `base_url` (e.g. `http://host/api/chats`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, ApiError> {
        Ok(Self { http: build_http(timeouts)?, base_url: base_url.into(), token: None })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.chats_url(), config.timeouts)
    }

    /// Attach `Authorization: Bearer <token>` to every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = join_url(&self.base_url, path);
        tracing::debug!(%method, %url, "conversation request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for HttpConversationRepository {
    async fn create(&self, draft: &ConversationDraft) -> Result<Conversation, ApiError> {
        send_json(self.request(reqwest::Method::POST, "/addConversation").json(draft)).await
    }

    async fn fetch_all(&self) -> Result<Vec<Conversation>, ApiError> {
        send_json(self.request(reqwest::Method::GET, "/allConversations")).await
    }

    async fn fetch_by_category(&self, category: &Category) -> Result<Vec<Conversation>, ApiError> {
        let request = self
            .request(reqwest::Method::GET, "/byCategory")
            .query(&[("category", category.as_str())]);
        send_json(request).await
    }

    async fn fetch_sorted_by_time(&self) -> Result<Vec<Conversation>, ApiError> {
        send_json(self.request(reqwest::Method::GET, "/sortedByTime")).await
    }

    async fn update(&self, id: ConversationId, draft: &ConversationDraft) -> Result<Conversation, ApiError> {
        send_json(self.request(reqwest::Method::PUT, &update_path(id)).json(draft)).await
    }

    async fn delete(&self, id: ConversationId) -> Result<(), ApiError> {
        send(self.request(reqwest::Method::DELETE, &delete_path(id))).await?;
        Ok(())
    }

    async fn fetch_page(&self, filter: &ListFilter, page: usize, size: usize) -> Result<ConversationPage, ApiError> {
        let (path, extra) = paged_endpoint(filter);
        let mut request = self
            .request(reqwest::Method::GET, path)
            .query(&[("page", page), ("size", size)]);
        if let Some(pair) = extra {
            request = request.query(&[pair]);
        }
        send_json(request).await
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// [`AuthBackend`] backed by the `/auth` REST endpoints.
#[derive(Clone, Debug)]
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthClient {
    /// Client for the auth API rooted at `base_url` (e.g. `http://host/api/auth`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, ApiError> {
        Ok(Self { http: build_http(timeouts)?, base_url: base_url.into() })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.auth_url(), config.timeouts)
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpAuthClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = join_url(&self.base_url, "/login");
        tracing::debug!(%url, username = %request.username, "login request");
        send_json(self.http.post(url).json(request)).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let url = join_url(&self.base_url, "/signup");
        tracing::debug!(%url, username = %request.username, "signup request");
        send_json(self.http.post(url).json(request)).await
    }
}
