//! Persisted sign-in session for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once at startup with an auth backend and a storage backend,
//! then handed to whatever needs identity. The front-end checks
//! `require_session` before building a conversation view-model.
//!
//! DESIGN
//! ======
//! Token and user record are one value (`Session`) and are written and
//! removed as a unit, so storage never holds one without the other. A file
//! that fails to parse reads as signed out.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ApiError, AuthError};
use crate::net::repository::AuthBackend;
use crate::net::types::{AuthResponse, LoginRequest, Role, Session, SignupRequest};

/// Minimum password length accepted by the signup form.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// STORAGE
// =============================================================================

/// Where the session lives between runs.
pub trait SessionStorage: Send + Sync {
    /// Read the stored session, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self) -> Result<Option<Session>, AuthError>;

    /// Replace the stored session atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, session: &Session) -> Result<(), AuthError>;

    /// Remove the stored session. Removing an absent session succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be modified.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Session kept in a single JSON file, replaced via write-then-rename.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        Ok(decode_session(&raw))
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| AuthError::Storage(e.to_string()))?;
        std::fs::rename(&temp, &self.path).map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Session>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { slot: Mutex::new(Some(session)) }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Parse a stored session, treating partial or corrupt records as absent.
fn decode_session(raw: &str) -> Option<Session> {
    match serde_json::from_str::<Session>(raw) {
        Ok(session) if !session.token.is_empty() && !session.user.username.is_empty() => Some(session),
        Ok(_) => {
            tracing::warn!("stored session incomplete; treating as signed out");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored session unreadable; treating as signed out");
            None
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validate_login(username: &str, password: &str) -> Result<LoginRequest, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("Username is required".to_owned()));
    }
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_owned()));
    }
    Ok(LoginRequest { username: username.to_owned(), password: password.to_owned() })
}

fn validate_signup(profile: SignupRequest) -> Result<SignupRequest, ApiError> {
    let username = profile.username.trim().to_owned();
    let email = profile.email.trim().to_owned();
    if username.is_empty() {
        return Err(ApiError::Validation("Username is required".to_owned()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_owned()));
    }
    if profile.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(SignupRequest { username, email, ..profile })
}

/// Turn an auth response into a session, refusing one that storage would
/// later read back as signed out.
fn accept_session(resp: AuthResponse) -> Result<Session, ApiError> {
    if resp.token.trim().is_empty() || resp.username.trim().is_empty() {
        return Err(ApiError::Decode("auth response is missing a token or username".to_owned()));
    }
    Ok(Session::from(resp))
}

// =============================================================================
// STORE
// =============================================================================

/// Sign-in state backed by an [`AuthBackend`] and a [`SessionStorage`].
pub struct SessionStore<A, S> {
    auth: A,
    storage: S,
}

impl<A: AuthBackend, S: SessionStorage> SessionStore<A, S> {
    pub fn new(auth: A, storage: S) -> Self {
        Self { auth, storage }
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error for blank credentials, a rejected or failed login, a
    /// response without a token or username, or a storage write failure. Storage is untouched unless login succeeded.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let request = validate_login(username, password)?;
        let session = accept_session(self.auth.login(&request).await?)?;
        self.storage.save(&session)?;
        tracing::info!(username = %session.user.username, role = session.user.role.label(), "signed in");
        Ok(session)
    }

    /// Create an account, then persist the returned session.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid profile, a rejected or failed signup,
    /// or a storage write failure.
    pub async fn sign_up(&self, profile: SignupRequest) -> Result<Session, AuthError> {
        let request = validate_signup(profile)?;
        let session = accept_session(self.auth.signup(&request).await?)?;
        self.storage.save(&session)?;
        tracing::info!(username = %session.user.username, role = session.user.role.label(), "signed up");
        Ok(session)
    }

    /// The persisted session, if any. Storage read failures read as signed out.
    pub fn current_session(&self) -> Option<Session> {
        self.storage.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session read failed");
            None
        })
    }

    /// Forget the persisted session. Safe to call when already signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be modified.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.storage.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    pub fn user_role(&self) -> Option<Role> {
        self.current_session().map(|s| s.user.role)
    }

    /// The persisted session, or [`AuthError::NotSignedIn`].
    ///
    /// # Errors
    ///
    /// Returns an error when no session is stored.
    pub fn require_session(&self) -> Result<Session, AuthError> {
        self.current_session().ok_or(AuthError::NotSignedIn)
    }
}
