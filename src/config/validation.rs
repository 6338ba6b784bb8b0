//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0, known log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("env must not be empty")]
    EmptyEnv,

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.env.0.trim().is_empty() {
        errors.push(ValidationError::EmptyEnv);
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "timeouts.request_secs",
        });
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue {
            field: "limits.max_body_size",
        });
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
