//! Metrics definitions for the Notekeeper service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `nk_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `status`: 2 values (success, error)
//! - `error_kind`: 4 token error kinds plus `none`
//! - `namespace`: 2 values (all, by_id)
//! - `outcome`: bounded by code (hit, miss, coalesced / success, failure)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Token signing is local HMAC work, sub-millisecond expected
        .set_buckets_for_metric(
            Matcher::Prefix("nk_token_issuance".to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        // Store loads behind the note cache
        .set_buckets_for_metric(
            Matcher::Prefix("nk_cache_load".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set cache load buckets: {e}"))?
        // Coarse buckets (50ms minimum) to avoid a timing side channel
        .set_buckets_for_metric(
            Matcher::Prefix("nk_bcrypt".to_string()),
            &[0.050, 0.100, 0.250, 0.500, 1.000],
        )
        .map_err(|e| format!("Failed to set bcrypt buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `nk_token_issuance_duration_seconds`, `nk_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str, duration: Duration) {
    histogram!("nk_token_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("nk_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record token validation result
///
/// Metric: `nk_token_validations_total`
/// Labels: `status`, `error_kind`
pub fn record_token_validation(status: &str, error_kind: Option<&str>) {
    let kind = error_kind.unwrap_or("none");
    counter!("nk_token_validations_total", "status" => status.to_string(), "error_kind" => kind.to_string())
        .increment(1);
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record an authentication attempt
///
/// Metric: `nk_authentications_total`
/// Labels: `outcome` (success, failure, error)
pub fn record_authentication(outcome: &str) {
    counter!("nk_authentications_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record bcrypt operation duration
///
/// Metric: `nk_bcrypt_duration_seconds`
/// Labels: `operation` (hash, verify)
pub fn record_bcrypt_duration(operation: &str, duration: Duration) {
    histogram!("nk_bcrypt_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

// ============================================================================
// Note Cache Metrics
// ============================================================================

/// Record a cache lookup
///
/// Metric: `nk_cache_lookups_total`
/// Labels: `namespace` (all, by_id), `outcome` (hit, miss, coalesced)
pub fn record_cache_lookup(namespace: &str, outcome: &str) {
    counter!("nk_cache_lookups_total", "namespace" => namespace.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a loader invocation on a cache miss
///
/// Metric: `nk_cache_load_duration_seconds`, `nk_cache_loads_total`
/// Labels: `namespace`, `status`
pub fn record_cache_load(namespace: &str, status: &str, duration: Duration) {
    histogram!("nk_cache_load_duration_seconds", "namespace" => namespace.to_string())
        .record(duration.as_secs_f64());

    counter!("nk_cache_loads_total", "namespace" => namespace.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a write-triggered eviction
///
/// Metric: `nk_cache_evictions_total`, `nk_cache_evicted_entries_total`
pub fn record_cache_eviction(entries: usize) {
    counter!("nk_cache_evictions_total").increment(1);
    counter!("nk_cache_evicted_entries_total").increment(entries as u64);
}

/// Record a load result discarded because an eviction happened mid-flight
///
/// Metric: `nk_cache_stale_loads_discarded_total`
/// Labels: `namespace`
pub fn record_stale_load_discarded(namespace: &str) {
    counter!("nk_cache_stale_loads_discarded_total", "namespace" => namespace.to_string())
        .increment(1);
}

// ============================================================================
// Note Metrics
// ============================================================================

/// Record a note creation
///
/// Metric: `nk_notes_created_total`
/// Labels: `status`
pub fn record_note_created(status: &str) {
    counter!("nk_notes_created_total", "status" => status.to_string()).increment(1);
}
