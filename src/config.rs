//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8083/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const SESSION_FILE_NAME: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".convo-session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without trailing slash; chats live under `/chats`, auth under `/auth`.
    pub base_url: String,
    pub session_file: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CONVO_BASE_URL`: default `http://localhost:8083/api`
    /// - `CONVO_SESSION_FILE`: default `$HOME/.convo/session.json`
    /// - `CONVO_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CONVO_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is not a number or the base URL is blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = match std::env::var("CONVO_BASE_URL") {
            Ok(raw) => normalize_base_url(&raw).ok_or(ConfigError::Empty("CONVO_BASE_URL"))?,
            Err(_) => DEFAULT_BASE_URL.to_owned(),
        };
        let session_file = std::env::var_os("CONVO_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_file(std::env::var_os("HOME").map(PathBuf::from)));
        let timeouts = Timeouts {
            request_secs: env_parse_u64("CONVO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_u64("CONVO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(Self { base_url, session_file, timeouts })
    }

    /// Replace the base URL, applying the same normalization as the env path.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is blank.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw).ok_or(ConfigError::Empty("--base-url"))?;
        Ok(self)
    }

    #[must_use]
    pub fn chats_url(&self) -> String {
        format!("{}/chats", self.base_url)
    }

    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn default_session_file(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => home.join(".convo").join(SESSION_FILE_NAME),
        None => PathBuf::from(FALLBACK_SESSION_FILE),
    }
}

fn env_parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
