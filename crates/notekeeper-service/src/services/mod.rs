//! Core services.
//!
//! Leaves first: [`CredentialVerifier`] and [`TokenService`] compose into
//! [`AuthGateway`]; [`NoteCache`] and a note store compose into [`NoteGateway`].

pub mod auth_gateway;
pub mod credential_verifier;
pub mod note_cache;
pub mod note_gateway;
pub mod token_service;

pub use auth_gateway::AuthGateway;
pub use credential_verifier::CredentialVerifier;
pub use note_cache::{CacheKey, NoteCache};
pub use note_gateway::NoteGateway;
pub use token_service::TokenService;
