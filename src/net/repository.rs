//! Async seams between client state and the backend.
//!
//! The view-model and session store are generic over these traits so tests
//! can script backend behavior without a server.

use super::types::{
    AuthResponse, Category, Conversation, ConversationDraft, ConversationId, ConversationPage, ListFilter,
    LoginRequest, SignupRequest,
};
use crate::error::ApiError;

// =============================================================================
// CONVERSATION REPOSITORY
// =============================================================================

/// Backend access for conversation CRUD. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Store a new conversation and return it with its assigned id.
    async fn create(&self, draft: &ConversationDraft) -> Result<Conversation, ApiError>;

    async fn fetch_all(&self) -> Result<Vec<Conversation>, ApiError>;

    async fn fetch_by_category(&self, category: &Category) -> Result<Vec<Conversation>, ApiError>;

    /// All conversations in the backend's timestamp order.
    async fn fetch_sorted_by_time(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Replace the stored fields of `id`.
    async fn update(&self, id: ConversationId, draft: &ConversationDraft) -> Result<Conversation, ApiError>;

    async fn delete(&self, id: ConversationId) -> Result<(), ApiError>;

    /// One backend-paginated page for `filter`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails. Repositories without
    /// paginated endpoints fall back to slicing the full fetch.
    async fn fetch_page(&self, filter: &ListFilter, page: usize, size: usize) -> Result<ConversationPage, ApiError> {
        let all = match filter {
            ListFilter::All => self.fetch_all().await?,
            ListFilter::SortedByTime => self.fetch_sorted_by_time().await?,
            ListFilter::Category(category) => self.fetch_by_category(category).await?,
        };
        let total_elements = all.len();
        let range = crate::util::pagination::page_bounds(total_elements, page, size);
        Ok(ConversationPage {
            content: all[range].to_vec(),
            total_elements,
            total_pages: crate::util::pagination::total_pages(total_elements, size),
            number: page,
            size,
        })
    }
}

// =============================================================================
// AUTH BACKEND
// =============================================================================

/// Credential exchange used by the session store.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError>;
}
