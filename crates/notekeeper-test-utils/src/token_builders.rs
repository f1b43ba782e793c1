//! Builder patterns for test data construction
//!
//! Provides fluent APIs for hand-crafted tokens, including ones the service
//! would never issue (expired, foreign-signed, odd claims).

use crate::fixtures::test_signing_key;
use chrono::{Duration, Utc};
use notekeeper_service::crypto::{sign_hs256, Claims};
use notekeeper_service::models::Role;
use std::collections::BTreeMap;

/// Builder for signed test tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_role(Role::Admin)
///     .expires_in(-60)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    role: Role,
    issued_at_ms: i64,
    expires_at_ms: i64,
    extra: BTreeMap<String, serde_json::Value>,
    key: Vec<u8>,
}

impl TestTokenBuilder {
    /// Defaults: subject `test-subject`, role USER, valid for an hour,
    /// signed with `test_signing_key(1)` (the harness key).
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            role: Role::User,
            issued_at_ms: now.timestamp_millis(),
            expires_at_ms: (now + Duration::seconds(3600)).timestamp_millis(),
            extra: BTreeMap::new(),
            key: test_signing_key(1),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_at_ms = (Utc::now() + Duration::seconds(seconds)).timestamp_millis();
        self
    }

    /// Set issued-at timestamp in Unix milliseconds
    pub fn issued_at_millis(mut self, timestamp_ms: i64) -> Self {
        self.issued_at_ms = timestamp_ms;
        self
    }

    pub fn with_claim(mut self, name: &str, value: serde_json::Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Sign with a different key
    pub fn signed_with(mut self, key: &[u8]) -> Self {
        self.key = key.to_vec();
        self
    }

    /// Build the claims without signing
    pub fn claims(&self) -> Claims {
        let mut claims = Claims::new(
            self.sub.clone(),
            self.role,
            self.issued_at_ms,
            self.expires_at_ms,
        );
        claims.extra = self.extra.clone();
        claims
    }

    /// Sign and return the compact token
    pub fn build(self) -> String {
        sign_hs256(&self.claims(), &self.key).expect("Failed to sign test token")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
