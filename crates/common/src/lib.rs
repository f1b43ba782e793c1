//! Common utilities and types shared across Notekeeper components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for bearer token structural checks (size limit, compact form)
pub mod jwt;
