//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use them for every
//! value that must never show up in a log line: user passwords, the token
//! signing key, bootstrap credentials and issued bearer tokens.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so a
//! struct that derives `Debug` and holds a secret is safe to pass to
//! `tracing` as `?value`. Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     username: "admin".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! // Password is redacted in Debug output
//! assert!(!format!("{req:?}").contains("hunter2"));
//!
//! // Access requires an explicit call
//! let password: &str = req.password.expose_secret();
//! assert_eq!(password, "hunter2");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - User passwords arriving in login requests
//! - The optional bootstrap password for default accounts
//!
//! Use `SecretBox<Vec<u8>>` for:
//! - The HMAC signing key decoded from configuration

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};
