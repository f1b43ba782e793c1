//! Observability for the Notekeeper service.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and log an explicit
//! allow-list of fields:
//! - **SAFE**: enums, cache namespaces, note ids, error kinds
//! - **HASHED**: usernames, via [`hash_for_correlation`]
//! - **NEVER**: passwords, password hashes, tokens, the signing key

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Used for usernames, which need correlation across log entries but should
/// not be stored in plaintext. This is NOT a secret-protection mechanism.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}
