//! HTTP routes and the composition root.

use crate::config::Config;
use crate::errors::NkError;
use crate::handlers;
use crate::middleware::{require_auth, AuthState};
use crate::repositories::{NoteStore, UserStore};
use crate::services::{AuthGateway, CredentialVerifier, NoteCache, NoteGateway, TokenService};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGateway>,
    pub notes: Arc<NoteGateway>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Wire the core services over the given stores.
    ///
    /// Consumes `config` because the signing key moves into the token service.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Result<Self, NkError> {
        let tokens = Arc::new(TokenService::new(config.jwt_secret, config.jwt_ttl));
        let verifier = CredentialVerifier::new(users, config.bcrypt_cost)?;
        let cache = Arc::new(NoteCache::new());

        Ok(Self {
            auth: Arc::new(AuthGateway::new(verifier, Arc::clone(&tokens))),
            notes: Arc::new(NoteGateway::new(notes, cache)),
            tokens,
        })
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `POST /api/v1/auth` - Token issuance - public
/// - `/api/v1/notes`, `/api/v1/notes/:id` - Note operations - require a bearer token
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        token_service: Arc::clone(&state.tokens),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/auth", post(handlers::handle_authenticate))
        .with_state(Arc::clone(&state));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route(
            "/api/v1/notes",
            post(handlers::create_note).get(handlers::list_notes),
        )
        .route("/api/v1/notes/:id", get(handlers::get_note))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
}
