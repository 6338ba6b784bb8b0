//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration (file or environment only)
//! - Install logging before anything else logs
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so traffic arrives only when routes are ready

use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{loader, ConfigError, ServerConfig};
use crate::observability::logging;

/// Load the configuration from `path`, or from defaults plus environment.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    match path {
        Some(path) => loader::load_config(path),
        None => loader::from_env(),
    }
}

/// Install logging at the configured level.
pub fn init(config: &ServerConfig) {
    if !logging::init_logging(&config.observability.log_level) {
        tracing::debug!("Logging already initialized");
    }
    tracing::info!(
        env = %config.env,
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );
}

/// Bind the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, std::io::Error> {
    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
