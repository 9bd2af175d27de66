//! Turn and principal domain types.
//!
//! A Turn is one stored message (user or assistant) in a dialogue, scoped to
//! a principal. Turns are append-only: created once on ingestion of a user
//! message or resolution of an assistant reply, never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to an authenticated principal.
///
/// Issued by the external auth collaborator; the engine never creates or
/// verifies credentials, it only partitions turns by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a dialogue.
///
/// Stored turns only ever carry `User` or `Assistant`; `System` exists for
/// prompt assembly and never reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (schema contract, assistant persona)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A turn that has not yet been durably appended.
///
/// The store assigns the monotonic id at append time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTurn {
    /// Owning principal; all ordering is scoped to this key
    pub principal_id: PrincipalId,

    /// Who produced this turn (`User` or `Assistant`)
    pub role: Role,

    /// The exact text produced by the user, or the *unparsed* backend output
    /// for assistant turns — stored verbatim for auditability and replay
    pub raw_content: String,

    /// Creation timestamp; primary ordering key within a principal's sequence
    pub created_at: DateTime<Utc>,
}

impl NewTurn {
    /// Create a new user turn.
    pub fn user(principal_id: PrincipalId, raw_content: impl Into<String>) -> Self {
        Self {
            principal_id,
            role: Role::User,
            raw_content: raw_content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new assistant turn from raw backend output.
    pub fn assistant(principal_id: PrincipalId, raw_content: impl Into<String>) -> Self {
        Self {
            principal_id,
            role: Role::Assistant,
            raw_content: raw_content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A committed turn, as read back from the store.
///
/// `id` is strictly monotonic within a store and breaks ordering ties when
/// two turns share a `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Store-assigned monotonic id, unique within the store
    pub id: i64,

    pub principal_id: PrincipalId,

    pub role: Role,

    pub raw_content: String,

    pub created_at: DateTime<Utc>,
}
