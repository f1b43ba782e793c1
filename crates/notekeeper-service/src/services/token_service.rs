//! Issue and validate signed, expiring identity tokens.
//!
//! Tokens are compact HS256 JWTs. A token is valid on the half-open window
//! `[iat, exp)`: it is accepted while `now < exp` and rejected as `Expired`
//! from `exp` onwards. Validation reads only the signing key and the clock,
//! so it needs no locking and has no side effects beyond logs and metrics.
//!
//! # Time precision
//!
//! `iat` and `exp` carry milliseconds, and `exp - iat` is exactly the TTL
//! (rounded up to a whole millisecond). Expiry is compared in milliseconds.

use crate::crypto::{self, Claims, RESERVED_CLAIMS};
use crate::errors::{NkError, TokenError};
use crate::models::Identity;
use crate::observability::{hash_for_correlation, metrics};
use chrono::{DateTime, Utc};
use common::jwt::MAX_JWT_SIZE_BYTES;
use common::secret::{ExposeSecret, SecretBox};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::instrument;

pub struct TokenService {
    signing_key: SecretBox<Vec<u8>>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(signing_key: SecretBox<Vec<u8>>, ttl: Duration) -> Self {
        Self { signing_key, ttl }
    }

    /// The TTL applied by callers that do not pass their own.
    pub fn configured_ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity` valid for `ttl` from now.
    pub fn issue(
        &self,
        identity: &Identity,
        ttl: Duration,
        extra_claims: BTreeMap<String, Value>,
    ) -> Result<String, NkError> {
        self.issue_at(identity, ttl, extra_claims, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// Extra claims named `sub`, `role`, `iat` or `exp` are dropped.
    #[instrument(skip_all, fields(user = %hash_for_correlation(&identity.username)))]
    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        mut extra_claims: BTreeMap<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<String, NkError> {
        let start = Instant::now();

        for reserved in RESERVED_CLAIMS {
            if extra_claims.remove(reserved).is_some() {
                tracing::debug!(
                    target: "nk.services.token",
                    claim = reserved,
                    "Dropped extra claim shadowing a standard claim"
                );
            }
        }

        let issued_at_ms = now.timestamp_millis();
        let ttl_ms = ttl.as_millis() + u128::from(ttl.subsec_nanos() % 1_000_000 > 0);
        let expires_at_ms = i64::try_from(ttl_ms)
            .ok()
            .and_then(|ms| issued_at_ms.checked_add(ms))
            .ok_or_else(|| {
                metrics::record_token_issuance("error", start.elapsed());
                NkError::Crypto("Token expiry out of range".to_string())
            })?;

        let mut claims = Claims::new(
            identity.username.clone(),
            identity.role,
            issued_at_ms,
            expires_at_ms,
        );
        claims.extra = extra_claims;

        let token = crypto::sign_hs256(&claims, self.signing_key.expose_secret()).map_err(|e| {
            metrics::record_token_issuance("error", start.elapsed());
            e
        })?;

        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::warn!(
                target: "nk.services.token",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Issued token exceeds maximum size"
            );
            metrics::record_token_issuance("error", start.elapsed());
            return Err(NkError::Crypto(
                "Issued token exceeds maximum size".to_string(),
            ));
        }

        metrics::record_token_issuance("success", start.elapsed());
        tracing::debug!(
            target: "nk.services.token",
            issued_at_ms,
            expires_at_ms,
            "Token issued"
        );

        Ok(token)
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// Checks structure, then algorithm, then signature, then expiry. Claims
    /// are only read after the signature verifies.
    #[instrument(skip_all)]
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let result = crypto::verify_hs256(token, self.signing_key.expose_secret())
            .and_then(|claims| check_expiry(claims, now));

        match &result {
            Ok(_) => metrics::record_token_validation("success", None),
            Err(e) => {
                tracing::debug!(target: "nk.services.token", error_kind = e.kind(), "Token rejected");
                metrics::record_token_validation("error", Some(e.kind()));
            }
        }

        result
    }
}

fn check_expiry(claims: Claims, now: DateTime<Utc>) -> Result<Identity, TokenError> {
    if now.timestamp_millis() >= claims.expires_at_millis() {
        return Err(TokenError::Expired);
    }

    Ok(Identity::new(claims.sub, claims.role))
}
