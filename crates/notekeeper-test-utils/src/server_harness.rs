//! Test server harness for E2E testing
//!
//! Provides TestNoteServer for spawning real notekeeper server instances in tests.

use crate::fixtures::{test_config, test_user_store, TEST_TOKEN_TTL};
use notekeeper_service::repositories::notes::mock::CountingNoteStore;
use notekeeper_service::repositories::NoteStore;
use notekeeper_service::routes::{self, AppState};
use notekeeper_service::services::TokenService;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Test harness for spawning the notekeeper server in E2E tests
///
/// The note store is a [`CountingNoteStore`], so tests can assert how often
/// requests reached the store.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list_notes_e2e() -> Result<()> {
///     let server = TestNoteServer::spawn().await?;
///     let token = server.login("admin", "password").await?;
///
///     let response = server
///         .client()
///         .get(format!("{}/api/v1/notes", server.url()))
///         .bearer_auth(&token)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestNoteServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    note_store: Arc<CountingNoteStore>,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestNoteServer {
    /// Spawn a server over an empty counting note store.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_note_store(Arc::new(CountingNoteStore::new())).await
    }

    /// Spawn a new test server instance over the given note store
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Serve users `admin` and `user`, both with password `password`
    /// - Sign tokens with `test_signing_key(1)`
    /// - Start the HTTP server in the background
    pub async fn spawn_with_note_store(
        note_store: Arc<CountingNoteStore>,
    ) -> Result<Self, anyhow::Error> {
        let users = test_user_store()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to build user fixtures: {}", e))?;

        let notes: Arc<dyn NoteStore> = note_store.clone();
        let state = Arc::new(AppState::new(test_config(), Arc::new(users), notes)?);

        // The global recorder can only be installed once per test process.
        // Later servers get a standalone recorder.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            state,
            note_store,
            client,
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The store behind the server, for call-count assertions
    pub fn note_store(&self) -> &CountingNoteStore {
        &self.note_store
    }

    /// The server's token service
    pub fn token_service(&self) -> &TokenService {
        &self.state.tokens
    }

    /// Lifetime of tokens issued by `POST /api/v1/auth`
    pub fn token_ttl(&self) -> Duration {
        TEST_TOKEN_TTL
    }

    /// Log in through `POST /api/v1/auth` and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/auth", self.url()))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Login failed with status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Login response has no token"))
    }
}

impl Drop for TestNoteServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
