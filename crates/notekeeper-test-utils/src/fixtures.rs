//! Deterministic fixtures for testing
//!
//! Signing keys are derived from a seed so the same seed always produces the
//! same key. Users are hashed at bcrypt cost 4 to keep tests fast.

use base64::{engine::general_purpose, Engine};
use common::secret::SecretBox;
use notekeeper_service::config::Config;
use notekeeper_service::models::{Role, User};
use notekeeper_service::repositories::InMemoryUserStore;
use notekeeper_service::services::TokenService;
use std::time::Duration;
use thiserror::Error;

/// Password of every fixture user.
pub const TEST_PASSWORD: &str = "password";

pub const ADMIN_USERNAME: &str = "admin";
pub const USER_USERNAME: &str = "user";

/// Bcrypt cost used by fixtures. Below the production minimum on purpose.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Default token lifetime for fixtures.
pub const TEST_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Deterministic 32-byte HMAC key for `seed`.
///
/// # Example
/// ```rust
/// use notekeeper_test_utils::test_signing_key;
///
/// assert_eq!(test_signing_key(1), test_signing_key(1));
/// assert_ne!(test_signing_key(1), test_signing_key(2));
/// ```
pub fn test_signing_key(seed: u8) -> Vec<u8> {
    (0u8..32)
        .map(|i| seed.wrapping_mul(31).wrapping_add(i.wrapping_mul(7)) ^ 0x5c)
        .collect()
}

/// [`test_signing_key`] encoded the way `JWT_SECRET` expects it.
pub fn test_signing_key_base64(seed: u8) -> String {
    general_purpose::STANDARD.encode(test_signing_key(seed))
}

/// Token service over `test_signing_key(seed)`.
pub fn test_token_service(seed: u8) -> TokenService {
    TokenService::new(
        SecretBox::new(Box::new(test_signing_key(seed))),
        TEST_TOKEN_TTL,
    )
}

/// Configuration for an in-process server, using signing key seed 1.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        jwt_secret: SecretBox::new(Box::new(test_signing_key(1))),
        jwt_ttl: TEST_TOKEN_TTL,
        bcrypt_cost: TEST_BCRYPT_COST,
        bootstrap_password: None,
    }
}

/// A user with `TEST_PASSWORD` hashed at [`TEST_BCRYPT_COST`].
pub fn test_user(username: &str, role: Role) -> Result<User, FixtureError> {
    let password_hash = bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST)
        .map_err(|e| FixtureError::Hash(e.to_string()))?;

    Ok(User {
        username: username.to_string(),
        password_hash,
        role,
    })
}

/// User store holding `admin` (ADMIN) and `user` (USER).
pub async fn test_user_store() -> Result<InMemoryUserStore, FixtureError> {
    let store = InMemoryUserStore::new();
    store.insert(test_user(ADMIN_USERNAME, Role::Admin)?).await;
    store.insert(test_user(USER_USERNAME, Role::User)?).await;
    Ok(store)
}
