use super::UserStore;
use crate::crypto;
use crate::errors::NkError;
use crate::models::{Role, User};
use crate::observability::hash_for_correlation;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

/// Accounts created by [`seed_default_users`].
pub const DEFAULT_USERS: [(&str, Role); 2] = [("admin", Role::Admin), ("user", Role::User)];

/// User store held in process memory, keyed by username.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.username.clone(), user);
    }

    pub async fn exists(&self, username: &str) -> bool {
        self.users.read().await.contains_key(username)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, NkError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

/// Create the default `admin` and `user` accounts if they are absent.
///
/// Existing accounts are left untouched. Returns how many were created.
#[instrument(skip_all)]
pub async fn seed_default_users(
    store: &InMemoryUserStore,
    password: &SecretString,
    bcrypt_cost: u32,
) -> Result<usize, NkError> {
    let mut created = 0;

    for (username, role) in DEFAULT_USERS {
        if store.exists(username).await {
            tracing::debug!(
                target: "nk.repositories.users",
                user = %hash_for_correlation(username),
                "Default user already exists, skipping"
            );
            continue;
        }

        let password_hash = crypto::hash_password(password.expose_secret(), bcrypt_cost)?;
        store
            .insert(User {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await;
        created += 1;

        tracing::info!(
            target: "nk.repositories.users",
            user = %hash_for_correlation(username),
            role = %role,
            "Default user created"
        );
    }

    Ok(created)
}
