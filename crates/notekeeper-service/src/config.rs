use base64::{engine::general_purpose, Engine as _};
use common::secret::{SecretBox, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_JWT_EXPIRATION_SECONDS: u64 = 3600;

/// Maximum token lifetime in seconds (24 hours).
pub const MAX_JWT_EXPIRATION_SECONDS: u64 = 86_400;

/// Minimum decoded signing key length for HS256.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum bcrypt cost (OWASP recommends 10 or more).
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum bcrypt cost. Higher values add ~800ms+ per login.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Service configuration.
///
/// Not `Clone`: the signing key lives in a `SecretBox` and is moved into the
/// token service at startup.
pub struct Config {
    pub bind_address: String,

    /// HMAC signing key, decoded from base64.
    pub jwt_secret: SecretBox<Vec<u8>>,

    /// Token lifetime.
    pub jwt_ttl: Duration,

    pub bcrypt_cost: u32,

    /// When set, default `admin` and `user` accounts are created with this password.
    pub bootstrap_password: Option<SecretString>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field(
                "bootstrap_password",
                &self.bootstrap_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid JWT expiration: {0}")]
    InvalidTtl(String),

    #[error("Invalid bcrypt cost: {0}")]
    InvalidBcryptCost(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret_base64 = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?;

        let jwt_secret = general_purpose::STANDARD
            .decode(jwt_secret_base64.trim())
            .map_err(ConfigError::Base64Error)?;

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_JWT_SECRET_BYTES,
                jwt_secret.len()
            )));
        }

        let ttl_secs = match vars.get("JWT_EXPIRATION_SECONDS") {
            Some(value) => {
                let parsed: u64 = value.parse().map_err(|e| {
                    ConfigError::InvalidTtl(format!(
                        "JWT_EXPIRATION_SECONDS must be a positive integer, got '{value}': {e}"
                    ))
                })?;

                if !(1..=MAX_JWT_EXPIRATION_SECONDS).contains(&parsed) {
                    return Err(ConfigError::InvalidTtl(format!(
                        "JWT_EXPIRATION_SECONDS must be between 1 and {MAX_JWT_EXPIRATION_SECONDS}, got {parsed}"
                    )));
                }

                parsed
            }
            None => DEFAULT_JWT_EXPIRATION_SECONDS,
        };

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(value) => {
                let parsed: u32 = value.parse().map_err(|e| {
                    ConfigError::InvalidBcryptCost(format!(
                        "BCRYPT_COST must be an integer, got '{value}': {e}"
                    ))
                })?;

                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&parsed) {
                    return Err(ConfigError::InvalidBcryptCost(format!(
                        "BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {parsed}"
                    )));
                }

                parsed
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let bootstrap_password = vars
            .get("BOOTSTRAP_PASSWORD")
            .filter(|p| !p.is_empty())
            .map(|p| SecretString::from(p.clone()));

        Ok(Config {
            bind_address,
            jwt_secret: SecretBox::new(Box::new(jwt_secret)),
            jwt_ttl: Duration::from_secs(ttl_secs),
            bcrypt_cost,
            bootstrap_password,
        })
    }
}
