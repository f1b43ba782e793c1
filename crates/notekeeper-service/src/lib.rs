//! Notekeeper service library.
//!
//! Exposes the core services (token issuance and validation, credential
//! verification, the coherent note cache) together with the axum HTTP
//! surface, so the binary and integration tests share one composition root.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
