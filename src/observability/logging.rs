//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Pick the filter from `RUST_LOG`, falling back to configuration
//!
//! # Design Decisions
//! - `tracing` events with structured fields everywhere
//! - Installing twice is not an error; the first subscriber stays

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the configuration set one.
pub const DEFAULT_FILTER: &str = "switchyard=debug,tower_http=debug";

/// Build the filter directive for a configured level such as `info`.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        DEFAULT_FILTER.to_string()
    } else {
        format!("switchyard={level},tower_http={level}")
    }
}

/// Install the fmt subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
