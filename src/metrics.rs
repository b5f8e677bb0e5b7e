// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the beacon.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host is responsible for installing a recorder; without one every
//! call here is a no-op.
//!
//! # Metric Naming Convention
//! - `beacon_` prefix for all metrics
//! - `_total` suffix for counters
//!
//! # Labels
//! - `endpoint`: event endpoint name (`searchRender`, `cartAdd`, ...)
//! - `api`: api type (`search`, `cart`, ...)
//! - `key`: storage key

use metrics::{counter, gauge, histogram};

/// Record an event accepted by the public API
pub fn record_event(api: &str, endpoint: &str, batched: bool) {
    counter!(
        "beacon_events_total",
        "api" => api.to_string(),
        "endpoint" => endpoint.to_string(),
        "batched" => batched.to_string()
    )
    .increment(1);
}

/// Record a request handed to the transport
pub fn record_dispatch(api: &str, endpoint: &str) {
    counter!(
        "beacon_dispatched_total",
        "api" => api.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record a transport rejection (never retried)
pub fn record_transport_error(api: &str, endpoint: &str) {
    counter!(
        "beacon_transport_errors_total",
        "api" => api.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record one batching window being drained
pub fn record_flush(pending: usize, outbound: usize) {
    counter!("beacon_flushes_total").increment(1);
    histogram!("beacon_flush_pending_requests").record(pending as f64);
    counter!("beacon_merged_requests_total").increment(pending.saturating_sub(outbound) as u64);
}

/// Set pending pool depth
pub fn set_pending_requests(count: usize) {
    gauge!("beacon_pending_requests").set(count as f64);
}

/// Record a preflight call, `sent` false when there was nothing to warm
pub fn record_preflight(sent: bool) {
    counter!(
        "beacon_preflight_total",
        "sent" => sent.to_string()
    )
    .increment(1);
}

/// Record a structured-store write refused for quota
pub fn record_storage_fault(key: &str) {
    counter!(
        "beacon_storage_faults_total",
        "key" => key.to_string()
    )
    .increment(1);
}

/// Record an unreadable structured entry that was purged
pub fn record_corrupt_entry(key: &str) {
    counter!(
        "beacon_corrupt_entries_total",
        "key" => key.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_do_not_panic() {
        record_event("search", "searchRender", true);
        record_dispatch("search", "searchRender");
        record_transport_error("cart", "cartAdd");
        record_flush(3, 1);
        record_flush(0, 0);
        set_pending_requests(2);
        record_preflight(true);
        record_storage_fault("ssCart");
        record_corrupt_entry("ssViewed");
    }
}
