//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / Dispatcher / HttpServer produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → whichever `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to the HTTP trace span
//! - Metrics are cheap facade calls, no-ops without a recorder

pub mod logging;
pub mod metrics;
