//! Dispatch metrics.
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): dispatched requests by method, status
//! - `switchyard_request_duration_seconds` (histogram): dispatch latency by method, status
//! - `switchyard_routes_registered` (gauge): entries in the live router
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - No exporter is bundled

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";
pub const ROUTES_REGISTERED: &str = "switchyard_routes_registered";

/// Record one finished dispatch.
pub fn record_dispatch(method: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    let method = method.to_string();
    let status = status.to_string();

    ::metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "status" => status.clone()).increment(1);
    ::metrics::histogram!(REQUEST_DURATION_SECONDS, "method" => method, "status" => status).record(elapsed);
}

/// Publish the size of the live route table.
pub fn record_route_count(count: usize) {
    ::metrics::gauge!(ROUTES_REGISTERED).set(count as f64);
}
