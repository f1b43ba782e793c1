//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued tokens. These inspect the token
//! without verifying the signature; use a `TokenService` for that.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub iat: f64,
    pub exp: f64,
}

fn to_millis(numeric_date: f64) -> i64 {
    (numeric_date * 1000.0).round() as i64
}

fn decode_claims(token: &str) -> JwtClaims {
    let payload = token.split('.').nth(1).expect("JWT has no payload part");
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .expect("Invalid JWT payload");
    serde_json::from_slice(&bytes).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("admin")
///     .assert_has_role("ADMIN")
///     .assert_expires_in(3600);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed HS256 JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the `role` claim, e.g. `"ADMIN"`
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert that `exp - iat` is exactly `seconds` and the token is not yet expired
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header_result = URL_SAFE_NO_PAD.decode(parts[0]);
        assert!(
            header_result.is_ok(),
            "Failed to base64 decode JWT header: {:?}",
            header_result.err()
        );

        let header: Result<JwtHeader, _> = serde_json::from_slice(&header_result.unwrap());
        assert!(
            header.is_ok(),
            "Failed to parse JWT header JSON: {:?}",
            header.err()
        );

        let header = header.unwrap();
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = decode_claims(self);
        assert!(claims.exp > claims.iat, "exp must be after iat");

        assert!(!parts[2].is_empty(), "JWT signature is empty");

        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.sub, subject,
            "Token subject mismatch. Expected: {}, Got: {}",
            subject, claims.sub
        );

        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.role, role,
            "Token role mismatch. Expected: {}, Got: {}",
            role, claims.role
        );

        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = decode_claims(self);
        let lifetime_ms = to_millis(claims.exp) - to_millis(claims.iat);
        assert_eq!(
            lifetime_ms,
            seconds * 1000,
            "Token lifetime mismatch. Expected: {}ms, Got: {}ms",
            seconds * 1000,
            lifetime_ms
        );
        assert!(
            to_millis(claims.exp) > Utc::now().timestamp_millis(),
            "Token is already expired"
        );

        self
    }
}
