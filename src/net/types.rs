//! Wire types shared by the HTTP clients, session store and view-model.
//!
//! DESIGN
//! ======
//! The backend stores category and timestamp as free strings. Both are
//! parsed leniently here so one odd record cannot fail a whole list fetch.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Backend-assigned conversation identifier.
pub type ConversationId = i64;

// =============================================================================
// CATEGORY
// =============================================================================

/// Conversation category. Unknown backend values survive as [`Category::Other`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Education,
    Coding,
    Career,
    Technology,
    Science,
    Health,
    Business,
    Environment,
    Other(String),
}

impl Category {
    /// Categories offered when creating or editing a conversation.
    pub const FORM: [Category; 4] = [Self::General, Self::Education, Self::Coding, Self::Career];

    /// Categories offered as list filters.
    pub const FILTERABLE: [Category; 9] = [
        Self::General,
        Self::Education,
        Self::Coding,
        Self::Career,
        Self::Technology,
        Self::Science,
        Self::Health,
        Self::Business,
        Self::Environment,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::General => "General",
            Self::Education => "Education",
            Self::Coding => "Coding",
            Self::Career => "Career",
            Self::Technology => "Technology",
            Self::Science => "Science",
            Self::Health => "Health",
            Self::Business => "Business",
            Self::Environment => "Environment",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::FILTERABLE
            .into_iter()
            .find(|known| known.as_str() == raw)
            .unwrap_or(Self::Other(raw))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    /// Case-insensitive match against the known names, for user input.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Ok(Self::FILTERABLE
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(raw))
            .unwrap_or_else(|| Self::Other(raw.to_owned())))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// A stored prompt/response pair as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub prompt: String,
    pub response: String,
    #[serde(default, deserialize_with = "nullable_category")]
    pub category: Category,
    #[serde(default, with = "lenient_timestamp")]
    pub timestamp: Option<OffsetDateTime>,
}

fn nullable_category<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Category, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(Category::from).unwrap_or_default())
}

/// Body for create and update requests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationDraft {
    pub prompt: String,
    pub response: String,
    pub category: Category,
    #[serde(with = "lenient_timestamp")]
    pub timestamp: Option<OffsetDateTime>,
}

/// One page of the backend's paginated listing endpoints.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub content: Vec<Conversation>,
    pub total_elements: usize,
    pub total_pages: usize,
    /// Zero-based page index echoed by the backend.
    pub number: usize,
    pub size: usize,
}

// =============================================================================
// LIST FILTER
// =============================================================================

/// Which slice of the collection the list view shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    SortedByTime,
    Category(Category),
}

impl ListFilter {
    /// Human label for filter pickers.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "All Conversations",
            Self::SortedByTime => "Sorted by Time",
            Self::Category(category) => category.as_str(),
        }
    }
}

impl FromStr for ListFilter {
    type Err = std::convert::Infallible;

    /// `all` and `sorted` select the whole collection; anything else is a category name.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Ok(match raw.to_ascii_lowercase().as_str() {
            "" | "all" => Self::All,
            "sorted" => Self::SortedByTime,
            _ => Self::Category(raw.parse::<Category>()?),
        })
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::SortedByTime => f.write_str("sorted"),
            Self::Category(category) => f.write_str(category.as_str()),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Account role, serialized in the backend's `ROLE_*` form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_RESEARCHER")]
    Researcher,
    #[serde(rename = "ROLE_ENGINEER")]
    Engineer,
    #[serde(rename = "ROLE_PREMIUM")]
    Premium,
    #[default]
    #[serde(rename = "ROLE_USER")]
    User,
}

impl Role {
    pub const ALL: [Role; 5] = [Self::Admin, Self::Researcher, Self::Engineer, Self::Premium, Self::User];

    /// Badge text shown next to the username.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Researcher => "Researcher",
            Self::Engineer => "Engineer",
            Self::Premium => "Premium",
            Self::User => "User",
        }
    }

    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Admin => "ROLE_ADMIN",
            Self::Researcher => "ROLE_RESEARCHER",
            Self::Engineer => "ROLE_ENGINEER",
            Self::Premium => "ROLE_PREMIUM",
            Self::User => "ROLE_USER",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts either the label (`premium`) or the wire name (`ROLE_PREMIUM`), case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(raw) || role.wire_name().eq_ignore_ascii_case(raw))
            .ok_or_else(|| format!("unknown role: {raw}"))
    }
}

/// Identity of the signed-in account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Authenticated identity plus bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// New-account profile submitted to `/signup`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: Role,
}

/// Flat response body of `/login` and `/signup`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl From<AuthResponse> for Session {
    fn from(resp: AuthResponse) -> Self {
        Self { token: resp.token, user: User { username: resp.username, email: resp.email, role: resp.role } }
    }
}

// =============================================================================
// TIMESTAMP SERDE
// =============================================================================

/// RFC 3339 on the way out; RFC 3339 or offset-less ISO 8601 (read as UTC) on
/// the way in. Anything else deserializes to `None`.
pub(crate) mod lenient_timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::{Iso8601, Rfc3339};
    use time::{OffsetDateTime, PrimitiveDateTime};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => {
                let formatted = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub(crate) fn parse(raw: &str) -> Option<OffsetDateTime> {
        let raw = raw.trim();
        if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(ts);
        }
        match PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
            Ok(naive) => Some(naive.assume_utc()),
            Err(_) => {
                tracing::warn!(timestamp = raw, "unparsable conversation timestamp");
                None
            }
        }
    }
}
