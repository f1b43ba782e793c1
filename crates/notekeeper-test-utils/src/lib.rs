//! # Notekeeper Test Utilities
//!
//! Shared test utilities for the Notekeeper service.
//!
//! This crate provides:
//! - Deterministic fixtures (fixed signing keys, pre-hashed users)
//! - Token builders for hand-crafted and hostile tokens
//! - Server test harness (TestNoteServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//! - The counting note store, re-exported for integration tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notekeeper_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestNoteServer::spawn().await?;
//!     let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;
//!
//!     token
//!         .assert_valid_jwt()
//!         .assert_for_subject("admin")
//!         .assert_has_role("ADMIN");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use notekeeper_service::repositories::notes::mock::CountingNoteStore;
pub use server_harness::*;
pub use token_builders::*;
