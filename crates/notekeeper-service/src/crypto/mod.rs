use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::{NkError, TokenError};
use crate::models::Role;
use common::jwt::{self, TokenShapeError};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::instrument;

/// The only accepted `alg` header value.
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Claim names owned by the token service. Extra claims cannot shadow these.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "role", "iat", "exp"];

/// Plaintext hashed to produce the dummy hash used for absent users.
const DUMMY_PASSWORD: &str = "notekeeper-absent-user-placeholder";

/// Token claims.
///
/// `iat` and `exp` are NumericDate seconds with a millisecond fraction
/// (RFC 7519 allows non-integer values). Unknown claims are kept in `extra`
/// so validation never fails on claims it does not recognize.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: f64,
    pub exp: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("extra_claims", &self.extra.len())
            .finish()
    }
}

impl Claims {
    /// Claims for `sub` valid on `[issued_at_ms, expires_at_ms)`.
    pub fn new(sub: String, role: Role, issued_at_ms: i64, expires_at_ms: i64) -> Self {
        Self {
            sub,
            role,
            iat: millis_to_numeric_date(issued_at_ms),
            exp: millis_to_numeric_date(expires_at_ms),
            extra: BTreeMap::new(),
        }
    }

    pub fn issued_at_millis(&self) -> i64 {
        numeric_date_to_millis(self.iat)
    }

    pub fn expires_at_millis(&self) -> i64 {
        numeric_date_to_millis(self.exp)
    }
}

// Exact for any realistic timestamp: f64 holds integers up to 2^53.
#[allow(clippy::cast_precision_loss)]
fn millis_to_numeric_date(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

// `as` saturates, so absurd signed values clamp instead of wrapping.
#[allow(clippy::cast_possible_truncation)]
fn numeric_date_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Sign claims as a compact HS256 JWT.
#[instrument(skip_all)]
pub fn sign_hs256(claims: &Claims, key: &[u8]) -> Result<String, NkError> {
    let header = Header::new(Algorithm::HS256);

    encode(&header, claims, &EncodingKey::from_secret(key))
        .map_err(|e| NkError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify an HS256 JWT and decode its claims.
///
/// Checks run in order and stop at the first failure:
/// 1. Size, compact structure and a JSON object header (`Malformed`)
/// 2. Header `alg` is exactly `HS256` (`Unsupported`)
/// 3. HMAC signature over `header.payload` (`SignatureInvalid`)
/// 4. Payload decoding and claims shape (`Malformed`)
///
/// The payload is not decoded before step 3, so any edit to it is reported
/// as `SignatureInvalid`.
///
/// Expiry is NOT checked here; callers compare `exp` against their clock.
#[instrument(skip_all)]
pub fn verify_hs256(token: &str, key: &[u8]) -> Result<Claims, TokenError> {
    let parts = jwt::parse_compact(token).map_err(|e: TokenShapeError| {
        tracing::debug!(target: "crypto", error = ?e, "Token failed structural check");
        TokenError::Malformed
    })?;

    match parts.header.get("alg") {
        Some(serde_json::Value::String(alg)) if alg == TOKEN_ALGORITHM => {}
        Some(serde_json::Value::String(alg)) => {
            tracing::debug!(target: "crypto", alg = %alg, "Token rejected: unsupported algorithm");
            return Err(TokenError::Unsupported);
        }
        _ => {
            tracing::debug!(target: "crypto", "Token rejected: missing alg header");
            return Err(TokenError::Malformed);
        }
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let token_data =
        decode::<Claims>(token, &DecodingKey::from_secret(key), &validation).map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::Unsupported
                }
                _ => TokenError::Malformed,
            }
        })?;

    Ok(token_data.claims)
}

/// Hash a password with bcrypt using a configurable cost factor.
///
/// # Security
///
/// - Cost < 10 is insecure per OWASP guidelines
/// - Cost > 14 causes excessive latency (~800ms+)
///
/// # Errors
///
/// Returns `NkError::Crypto` if the cost is outside 10-14 or hashing fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, NkError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(NkError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| NkError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
///
/// The comparison inside `bcrypt::verify` is constant-time.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, NkError> {
    bcrypt::verify(password, hash)
        .map_err(|e| NkError::Crypto(format!("Password verification failed: {}", e)))
}

/// Hash of a fixed placeholder, verified against when a username is absent.
///
/// Must use the same cost as real user hashes so both paths take similar time.
/// No range check: the cost has already been validated by configuration.
#[instrument(skip_all)]
pub fn dummy_password_hash(cost: u32) -> Result<String, NkError> {
    bcrypt::hash(DUMMY_PASSWORD, cost)
        .map_err(|e| NkError::Crypto(format!("Dummy hash generation failed: {}", e)))
}
