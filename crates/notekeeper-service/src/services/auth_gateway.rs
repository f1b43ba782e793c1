//! Authentication entry point: credentials in, bearer token out.

use crate::errors::NkError;
use crate::models::AuthResponse;
use crate::observability::metrics;
use crate::services::credential_verifier::CredentialVerifier;
use crate::services::token_service::TokenService;
use common::secret::SecretString;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// Token type reported alongside every issued token.
pub const TOKEN_TYPE: &str = "Bearer";

pub struct AuthGateway {
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
}

impl AuthGateway {
    pub fn new(verifier: CredentialVerifier, tokens: Arc<TokenService>) -> Self {
        Self { verifier, tokens }
    }

    /// Verify credentials and issue a token with the configured TTL.
    ///
    /// Any credential failure becomes `AuthenticationFailed`; callers cannot
    /// tell an unknown user from a wrong password. Store and crypto errors
    /// propagate unchanged.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, NkError> {
        let identity = match self.verifier.verify(username, password).await {
            Ok(identity) => identity,
            Err(NkError::InvalidCredentials) => {
                metrics::record_authentication("failure");
                return Err(NkError::AuthenticationFailed);
            }
            Err(e) => {
                metrics::record_authentication("error");
                return Err(e);
            }
        };

        let ttl = self.tokens.configured_ttl();
        let token = self.tokens.issue(&identity, ttl, BTreeMap::new())?;

        metrics::record_authentication("success");
        tracing::info!(target: "nk.services.auth", role = %identity.role, "User authenticated");

        Ok(AuthResponse {
            token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
