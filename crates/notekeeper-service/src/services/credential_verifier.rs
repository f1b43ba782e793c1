//! Username/password verification against the user store.

use crate::crypto;
use crate::errors::NkError;
use crate::models::Identity;
use crate::observability::{hash_for_correlation, metrics};
use crate::repositories::UserStore;
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    /// Verified against when the username is absent, so both paths run bcrypt.
    dummy_hash: String,
}

impl CredentialVerifier {
    /// Build a verifier whose dummy hash uses `bcrypt_cost`.
    ///
    /// The cost should match the cost of stored hashes.
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Result<Self, NkError> {
        Ok(Self {
            users,
            dummy_hash: crypto::dummy_password_hash(bcrypt_cost)?,
        })
    }

    /// Check a username/password pair.
    ///
    /// Unknown user and wrong password both return `InvalidCredentials`, and
    /// both pay for one bcrypt verification. Store failures propagate.
    #[instrument(skip_all, fields(user = %hash_for_correlation(username)))]
    pub async fn verify(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Identity, NkError> {
        let user = self.users.find_by_username(username).await?;

        let hash_to_verify = match &user {
            Some(u) => u.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };

        // bcrypt is CPU-bound; keep it off the async workers
        let password = password.clone();
        let start = Instant::now();
        let is_valid = tokio::task::spawn_blocking(move || {
            crypto::verify_password(password.expose_secret(), &hash_to_verify)
        })
        .await
        .map_err(|e| {
            tracing::error!(target: "nk.services.credentials", error = %e, "Password verification task failed");
            NkError::Internal
        })??;
        metrics::record_bcrypt_duration("verify", start.elapsed());

        match user {
            Some(u) if is_valid => Ok(Identity::new(u.username, u.role)),
            Some(_) => {
                tracing::debug!(target: "nk.services.credentials", "Password mismatch");
                Err(NkError::InvalidCredentials)
            }
            None => {
                tracing::debug!(target: "nk.services.credentials", "Unknown username");
                Err(NkError::InvalidCredentials)
            }
        }
    }
}
