//! Store collaborators consumed by the core services.
//!
//! Services depend only on the [`UserStore`] and [`NoteStore`] traits. The
//! in-memory implementations here back the binary and the tests.

pub mod notes;
pub mod users;

use crate::errors::NkError;
use crate::models::{Note, NoteId, User};

pub use notes::InMemoryNoteStore;
pub use users::{seed_default_users, InMemoryUserStore};

/// Lookup of stored user accounts.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, NkError>;
}

/// Persistent note storage.
#[async_trait::async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a note and assign it the next id.
    async fn create(&self, title: &str, content: &str) -> Result<Note, NkError>;

    async fn find_by_id(&self, id: NoteId) -> Result<Option<Note>, NkError>;

    /// All notes, newest (highest id) first.
    async fn find_all_ordered_by_id_desc(&self) -> Result<Vec<Note>, NkError>;
}
