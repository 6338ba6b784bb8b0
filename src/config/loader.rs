//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{EnvName, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `env`.
pub const ENV_VAR: &str = "SWITCHYARD_ENV";
/// Environment variable overriding `listener.host`.
pub const HOST_VAR: &str = "SWITCHYARD_HOST";
/// Environment variable overriding `listener.port`.
pub const PORT_VAR: &str = "SWITCHYARD_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {var}")]
    Override { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ServerConfig = toml::from_str(&content)?;

    apply_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = %path.display(), env = %config.env, "Configuration file loaded");
    Ok(config)
}

/// Defaults plus environment overrides, for running without a file.
pub fn from_env() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();
    apply_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `SWITCHYARD_*` overrides read through `lookup`.
pub fn apply_overrides<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = lookup(ENV_VAR) {
        config.env = EnvName(env);
    }
    if let Some(host) = lookup(HOST_VAR) {
        config.listener.host = host;
    }
    if let Some(port) = lookup(PORT_VAR) {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Override {
            var: PORT_VAR,
            value: port.clone(),
        })?;
    }
    Ok(())
}
