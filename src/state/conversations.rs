//! Conversation list view-model: load, filter, paginate, edit, delete.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owned by the front-end. Every user action maps to one method here; the
//! method talks to a [`ConversationRepository`] and leaves behind state that
//! the renderer reads (visible page, totals, form, status).
//!
//! DESIGN
//! ======
//! Loads are split into `begin_load` / `apply_load` around a `LoadTicket`
//! carrying a sequence number. Only the most recently issued ticket may
//! update display state, so a slow response from an earlier click cannot
//! overwrite a newer one. `load_list` runs both halves back to back.
//!
//! ERROR HANDLING
//! ==============
//! Repository failures are recorded as `ViewStatus::Error` with a single
//! message that replaces any earlier one. Methods also return the error so
//! callers can pick an exit code; nothing is retried automatically.

#[cfg(test)]
#[path = "conversations_test.rs"]
mod conversations_test;

use time::OffsetDateTime;

use crate::error::ApiError;
use crate::net::repository::ConversationRepository;
use crate::net::types::{Category, Conversation, ConversationDraft, ConversationId, ListFilter};
use crate::util::pagination::{self, DEFAULT_PAGE_SIZE, PAGE_SIZES};

/// Request lifecycle of the list view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

/// Where page slicing happens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PagingMode {
    /// Fetch the whole filtered collection and slice locally.
    #[default]
    Client,
    /// Ask the backend's paginated endpoints for one page.
    Server,
}

/// Editable fields of the create/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationForm {
    pub prompt: String,
    pub response: String,
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq)]
struct EditTarget {
    id: ConversationId,
    timestamp: Option<OffsetDateTime>,
}

/// Handle for one issued list load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    pub filter: ListFilter,
    pub page: usize,
    pub page_size: usize,
    pub paging: PagingMode,
}

/// A fetched page ready to display.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedPage {
    pub items: Vec<Conversation>,
    pub total_elements: usize,
    pub total_pages: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Deleted,
    /// The confirmation gate declined; no request was sent.
    Cancelled,
}

/// Fetch the page described by `ticket`.
///
/// # Errors
///
/// Returns the repository error unchanged.
pub async fn fetch_page<R: ConversationRepository + ?Sized>(
    repository: &R,
    ticket: &LoadTicket,
) -> Result<LoadedPage, ApiError> {
    match ticket.paging {
        PagingMode::Server => {
            let page = repository.fetch_page(&ticket.filter, ticket.page, ticket.page_size).await?;
            Ok(LoadedPage { items: page.content, total_elements: page.total_elements, total_pages: page.total_pages })
        }
        PagingMode::Client => {
            let mut all = match &ticket.filter {
                ListFilter::All => repository.fetch_all().await?,
                ListFilter::SortedByTime => repository.fetch_sorted_by_time().await?,
                ListFilter::Category(category) => repository.fetch_by_category(category).await?,
            };
            let total_elements = all.len();
            let range = pagination::page_bounds(total_elements, ticket.page, ticket.page_size);
            all.truncate(range.end);
            let items = all.split_off(range.start);
            Ok(LoadedPage {
                items,
                total_elements,
                total_pages: pagination::total_pages(total_elements, ticket.page_size),
            })
        }
    }
}

/// Display and form state for the conversation list.
pub struct ConversationViewModel<R> {
    repository: R,
    pub form: ConversationForm,
    conversations: Vec<Conversation>,
    filter: ListFilter,
    page: usize,
    page_size: usize,
    total_pages: usize,
    total_elements: usize,
    editing: Option<EditTarget>,
    status: ViewStatus,
    backend_unreachable: bool,
    paging: PagingMode,
    issued: u64,
}

impl<R: ConversationRepository> ConversationViewModel<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            form: ConversationForm::default(),
            conversations: Vec::new(),
            filter: ListFilter::All,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: 0,
            total_elements: 0,
            editing: None,
            status: ViewStatus::Idle,
            backend_unreachable: false,
            paging: PagingMode::Client,
            issued: 0,
        }
    }

    #[must_use]
    pub fn with_paging(mut self, paging: PagingMode) -> Self {
        self.paging = paging;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    pub fn paging(&self) -> PagingMode {
        self.paging
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ViewStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Set after a load failed because the backend was unreachable; cleared by the next successful load.
    pub fn backend_unreachable(&self) -> bool {
        self.backend_unreachable
    }

    /// Id being edited, `None` in create mode.
    pub fn editing_id(&self) -> Option<ConversationId> {
        self.editing.as_ref().map(|target| target.id)
    }

    /// Numbered page buttons for the current position.
    pub fn page_buttons(&self) -> std::ops::Range<usize> {
        pagination::page_buttons(self.total_pages, self.page)
    }

    /// One-line position summary, e.g. `Showing 5 of 12 conversations (Page 1 of 3)`.
    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} conversations (Page {} of {})",
            self.conversations.len(),
            self.total_elements,
            self.page.saturating_add(1),
            self.total_pages
        )
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Start a load: record the selection, clear any error, enter `Loading`.
    pub fn begin_load(&mut self, filter: ListFilter, page: usize, page_size: usize) -> LoadTicket {
        self.issued += 1;
        self.filter = filter.clone();
        self.page_size = page_size;
        self.status = ViewStatus::Loading;
        LoadTicket { seq: self.issued, filter, page, page_size, paging: self.paging }
    }

    /// Apply a finished load. Returns `false` and changes nothing when a newer
    /// load has been issued since `ticket`.
    pub fn apply_load(&mut self, ticket: &LoadTicket, result: Result<LoadedPage, ApiError>) -> bool {
        if ticket.seq != self.issued {
            tracing::warn!(seq = ticket.seq, latest = self.issued, "discarding stale conversation load");
            return false;
        }
        match result {
            Ok(loaded) => {
                self.conversations = loaded.items;
                self.total_elements = loaded.total_elements;
                self.total_pages = loaded.total_pages;
                self.page = ticket.page;
                self.backend_unreachable = false;
                self.status = ViewStatus::Idle;
            }
            Err(err) => {
                tracing::warn!(error = %err, filter = %ticket.filter, "conversation load failed");
                self.conversations.clear();
                self.backend_unreachable = err.is_network();
                self.status = ViewStatus::Error(err.to_string());
            }
        }
        true
    }

    /// Fetch `filter` and show `page` of it.
    ///
    /// `page` is not checked against the new total; request page 0 after
    /// changing the filter.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a size outside [`PAGE_SIZES`] (no
    /// request is sent), or the repository error after recording it as the
    /// view error.
    pub async fn load_list(&mut self, filter: ListFilter, page: usize, page_size: usize) -> Result<(), ApiError> {
        self.check_page_size(page_size)?;
        let ticket = self.begin_load(filter, page, page_size);
        let result = fetch_page(&self.repository, &ticket).await;
        let outcome = result.as_ref().map(|_| ()).map_err(ApiError::clone);
        self.apply_load(&ticket, result);
        outcome
    }

    /// Reload with the current filter, page and size.
    ///
    /// # Errors
    ///
    /// Returns the repository error after recording it as the view error.
    pub async fn reload(&mut self) -> Result<(), ApiError> {
        self.load_list(self.filter.clone(), self.page, self.page_size).await
    }

    fn check_page_size(&mut self, page_size: usize) -> Result<(), ApiError> {
        if PAGE_SIZES.contains(&page_size) {
            return Ok(());
        }
        let err = ApiError::Validation(format!("Page size must be one of {PAGE_SIZES:?}"));
        self.status = ViewStatus::Error(err.to_string());
        Err(err)
    }

    // -------------------------------------------------------------------------
    // Form
    // -------------------------------------------------------------------------

    /// Save the form: create in create mode, update the edit target otherwise.
    ///
    /// On success the form resets and the list reloads. On failure the form
    /// and edit target are kept so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a blank prompt or response (no
    /// request is sent), or the repository error from the save.
    pub async fn submit(&mut self) -> Result<Conversation, ApiError> {
        if self.form.prompt.trim().is_empty() || self.form.response.trim().is_empty() {
            let err = ApiError::Validation("Prompt and response are required".to_owned());
            self.status = ViewStatus::Error(err.to_string());
            return Err(err);
        }

        self.status = ViewStatus::Loading;
        let timestamp = match &self.editing {
            Some(target) => target.timestamp,
            None => Some(OffsetDateTime::now_utc()),
        };
        let draft = ConversationDraft {
            prompt: self.form.prompt.clone(),
            response: self.form.response.clone(),
            category: self.form.category.clone(),
            timestamp,
        };

        let saved = match &self.editing {
            Some(target) => self.repository.update(target.id, &draft).await,
            None => self.repository.create(&draft).await,
        };
        let saved = match saved {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %err, editing = ?self.editing_id(), "saving conversation failed");
                self.status = ViewStatus::Error(err.to_string());
                return Err(err);
            }
        };

        tracing::debug!(id = saved.id, "conversation saved");
        self.editing = None;
        self.form = ConversationForm::default();
        // A failed reload is already recorded in `status`; the save itself stood.
        let _ = self.reload().await;
        Ok(saved)
    }

    /// Load `conversation` into the form and switch to edit mode.
    pub fn begin_edit(&mut self, conversation: &Conversation) {
        self.form = ConversationForm {
            prompt: conversation.prompt.clone(),
            response: conversation.response.clone(),
            category: conversation.category.clone(),
        };
        self.editing = Some(EditTarget { id: conversation.id, timestamp: conversation.timestamp });
    }

    /// Reset the form to defaults and return to create mode.
    pub fn cancel_edit(&mut self) {
        self.form = ConversationForm::default();
        self.editing = None;
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Delete `id` once `confirm` agrees, then reload.
    ///
    /// # Errors
    ///
    /// Returns the repository error from the delete; the visible page is left
    /// as it was.
    pub async fn remove<F>(&mut self, id: ConversationId, confirm: F) -> Result<RemoveOutcome, ApiError>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            return Ok(RemoveOutcome::Cancelled);
        }
        self.status = ViewStatus::Loading;
        if let Err(err) = self.repository.delete(id).await {
            tracing::warn!(error = %err, id, "deleting conversation failed");
            self.status = ViewStatus::Error(err.to_string());
            return Err(err);
        }
        tracing::debug!(id, "conversation deleted");
        let _ = self.reload().await;
        Ok(RemoveOutcome::Deleted)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Switch filter and show its first page.
    ///
    /// # Errors
    ///
    /// Returns the repository error after recording it as the view error.
    pub async fn change_filter(&mut self, filter: ListFilter) -> Result<(), ApiError> {
        self.filter = filter.clone();
        self.page = 0;
        self.load_list(filter, 0, self.page_size).await
    }

    /// Switch page size and show the first page.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a size outside [`PAGE_SIZES`], or
    /// the repository error.
    pub async fn change_page_size(&mut self, page_size: usize) -> Result<(), ApiError> {
        self.check_page_size(page_size)?;
        self.page_size = page_size;
        self.page = 0;
        self.load_list(self.filter.clone(), 0, page_size).await
    }

    /// Show `page` of the current filter. Not clamped; offer only indices
    /// from [`Self::page_buttons`] or the next/previous helpers.
    ///
    /// # Errors
    ///
    /// Returns the repository error after recording it as the view error.
    pub async fn change_page(&mut self, page: usize) -> Result<(), ApiError> {
        self.load_list(self.filter.clone(), page, self.page_size).await
    }

    /// Move one page forward if there is one. Returns whether a load happened.
    ///
    /// # Errors
    ///
    /// Returns the repository error after recording it as the view error.
    pub async fn next_page(&mut self) -> Result<bool, ApiError> {
        let next = self.page.saturating_add(1);
        if next >= self.total_pages {
            return Ok(false);
        }
        self.change_page(next).await.map(|()| true)
    }

    /// Move one page back if not on the first. Returns whether a load happened.
    ///
    /// # Errors
    ///
    /// Returns the repository error after recording it as the view error.
    pub async fn previous_page(&mut self) -> Result<bool, ApiError> {
        if self.page == 0 {
            return Ok(false);
        }
        self.change_page(self.page - 1).await.map(|()| true)
    }
}
