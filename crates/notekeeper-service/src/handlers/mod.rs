//! HTTP request handlers.

pub mod auth_handler;
pub mod health;
pub mod metrics;
pub mod note_handler;

pub use auth_handler::handle_authenticate;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use note_handler::{create_note, get_note, list_notes};
