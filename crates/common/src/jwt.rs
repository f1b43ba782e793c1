//! Bearer token structural checks shared across Notekeeper components.
//!
//! Everything in this module runs BEFORE a signature is verified, so none of
//! the values it returns may be trusted for authorization decisions. The
//! helpers exist so that a token can be rejected as malformed cheaply, and so
//! the header can be inspected for its algorithm before any key is touched.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any decoding (DoS prevention)
//! - Error messages are generic; details go to `debug` logs only
//!
//! # Usage
//!
//! ```rust
//! use common::jwt::{bearer_token, parse_compact};
//!
//! let token = bearer_token("Bearer abc.def.ghi");
//! assert_eq!(token, Some("abc.def.ghi"));
//!
//! // Not base64url JSON, so structurally invalid
//! assert!(parse_compact("abc.def.ghi").is_err());
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Typical tokens issued by the service are 200-300 bytes. Anything above
/// this limit is rejected before base64 decoding or HMAC computation.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Authorization scheme accepted for bearer tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

// =============================================================================
// Error Types
// =============================================================================

/// Structural problems found before signature verification.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShapeError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TooLarge,

    /// Token is not three non-empty dot-separated segments.
    #[error("The access token is invalid or expired")]
    NotCompact,

    /// A segment is not valid unpadded base64url.
    #[error("The access token is invalid or expired")]
    BadEncoding,

    /// The header decodes to something other than a JSON object.
    #[error("The access token is invalid or expired")]
    NotJsonObject,
}

// =============================================================================
// Types
// =============================================================================

/// A compact-serialized token with its header decoded.
///
/// Nothing in here has been verified. The payload stays encoded: claims are
/// only decoded once the signature over `signing_input` has been checked.
#[derive(Debug, Clone)]
pub struct CompactParts<'a> {
    /// Decoded JOSE header.
    pub header: Map<String, Value>,

    /// Claims segment, still base64url encoded.
    pub payload: &'a str,

    /// `header.payload` exactly as received.
    pub signing_input: &'a str,

    /// Signature segment, still base64url encoded.
    pub signature: &'a str,
}

impl CompactParts<'_> {
    /// The `alg` header value, if present and a string.
    #[must_use]
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the token from an `Authorization` header value.
///
/// Returns `None` for any scheme other than `Bearer` or an empty token.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Split a compact token and decode its header without verifying it.
///
/// Payload and signature are only checked for the base64url alphabet, so
/// any edit to them that keeps the alphabet is left for the signature check
/// to catch.
///
/// # Errors
///
/// - `TooLarge` - token exceeds the size limit
/// - `NotCompact` - not exactly three non-empty segments
/// - `BadEncoding` - header is not base64url, or payload or signature use
///   characters outside the base64url alphabet
/// - `NotJsonObject` - header is not a JSON object
pub fn parse_compact(token: &str) -> Result<CompactParts<'_>, TokenShapeError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenShapeError::TooLarge);
    }

    let (signing_input, signature) = token
        .rsplit_once('.')
        .ok_or(TokenShapeError::NotCompact)?;
    let (header_b64, payload_b64) = signing_input
        .split_once('.')
        .ok_or(TokenShapeError::NotCompact)?;

    if header_b64.is_empty()
        || payload_b64.is_empty()
        || signature.is_empty()
        || payload_b64.contains('.')
    {
        tracing::debug!(target: "common.jwt", "Token rejected: not in compact form");
        return Err(TokenShapeError::NotCompact);
    }

    if !is_base64url_text(payload_b64) || !is_base64url_text(signature) {
        tracing::debug!(target: "common.jwt", "Token rejected: segment outside base64url alphabet");
        return Err(TokenShapeError::BadEncoding);
    }

    let header = decode_json_segment(header_b64)?;

    Ok(CompactParts {
        header,
        payload: payload_b64,
        signing_input,
        signature,
    })
}

/// Whether `segment` uses only the unpadded base64url alphabet.
#[must_use]
pub fn is_base64url_text(segment: &str) -> bool {
    segment
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Decode one base64url segment into a JSON object.
///
/// # Errors
///
/// Returns `BadEncoding` or `NotJsonObject`.
pub fn decode_json_segment(segment: &str) -> Result<Map<String, Value>, TokenShapeError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode token segment base64");
        TokenShapeError::BadEncoding
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", "Token segment is not a JSON object");
            Err(TokenShapeError::NotJsonObject)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse token segment JSON");
            Err(TokenShapeError::NotJsonObject)
        }
    }
}
