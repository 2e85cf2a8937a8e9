//! Error taxonomy shared by the repository, session store and view-model.
//!
//! ERROR HANDLING
//! ==============
//! Every variant renders as a single human-readable line. The view-model
//! stores that line verbatim as its current error, so `Display` output is
//! user-facing text rather than debug detail.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Message shown when the backend cannot be reached at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to connect to the server. Please ensure the backend is running.";

/// Fallback when a non-2xx response carries no usable body.
pub const GENERIC_SERVER_ERROR_MESSAGE: &str = "An error occurred";

/// Errors produced by backend calls and local validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend was unreachable (connect failure, timeout, reset).
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// A success response body did not match the expected shape.
    #[error("unexpected response from server: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// A required field was empty or out of range; never reaches the network.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// True when the failure means the backend itself is down.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors produced by the session store.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The login/signup request failed or was rejected.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reading or writing the persisted session failed.
    #[error("session storage failed: {0}")]
    Storage(String),

    /// An operation needed a signed-in user and there is none.
    #[error("not signed in; run `convo login` first")]
    NotSignedIn,
}

/// Errors produced while reading client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric variable held something other than a number.
    #[error("invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },

    /// The base URL was set but empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Extract a human-readable message from a non-2xx response body.
///
/// Accepts a JSON object with a `message` field, a bare JSON string, or plain
/// text. Blank bodies fall back to [`GENERIC_SERVER_ERROR_MESSAGE`].
#[must_use]
pub fn server_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_SERVER_ERROR_MESSAGE.to_owned();
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_SERVER_ERROR_MESSAGE)
            .to_owned(),
        Ok(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Ok(serde_json::Value::String(_)) => GENERIC_SERVER_ERROR_MESSAGE.to_owned(),
        _ => trimmed.to_owned(),
    }
}
