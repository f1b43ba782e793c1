use crate::errors::NkError;
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Maximum content length in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Store-assigned note identifier. Monotonic, never reused.
pub type NoteId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified username and role, the subject of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Stored user account.
///
/// Debug is manually implemented so the password hash never reaches logs.
#[derive(Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Credentials submitted to `POST /api/v1/auth`.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: SecretString,
}

/// Token issued after successful authentication.
///
/// `expires_in` is the configured TTL in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Body of `POST /api/v1/notes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
}

impl NoteRequest {
    /// Check field presence and length limits.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self) -> Result<(), NkError> {
        check_field("title", &self.title, MAX_TITLE_CHARS)?;
        check_field("content", &self.content, MAX_CONTENT_CHARS)
    }
}

fn check_field(name: &str, value: &str, max_chars: usize) -> Result<(), NkError> {
    if value.trim().is_empty() {
        return Err(NkError::Validation(format!("{name} must not be blank")));
    }

    if value.chars().count() > max_chars {
        return Err(NkError::Validation(format!(
            "{name} must be at most {max_chars} characters"
        )));
    }

    Ok(())
}
