//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::security::cors::parse_origins;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {name} value '{value}': {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

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

pub const ENV_BIND: &str = "EDGE_GUARD_BIND";
pub const ENV_CORS_ORIGINS: &str = "EDGE_GUARD_CORS_ORIGINS";
pub const ENV_RATE_LIMIT: &str = "EDGE_GUARD_RATE_LIMIT";
pub const ENV_SECURITY_HEADERS: &str = "EDGE_GUARD_SECURITY_HEADERS";
pub const ENV_HEALTH_ENABLED: &str = "EDGE_GUARD_HEALTH_ENABLED";
pub const ENV_UPSTREAM_URL: &str = "EDGE_GUARD_UPSTREAM_URL";
pub const ENV_UPSTREAM_TOKEN: &str = "EDGE_GUARD_UPSTREAM_TOKEN";
pub const ENV_LOG_LEVEL: &str = "EDGE_GUARD_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "EDGE_GUARD_LOG_FORMAT";

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GateConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(bind) = var(ENV_BIND) {
        config.listener.bind_address = bind.trim().to_string();
    }

    if let Some(origins) = var(ENV_CORS_ORIGINS) {
        config.security.cors_origins = parse_origins(&origins);
    }

    if let Some(value) = var(ENV_RATE_LIMIT) {
        config.security.rate_limit_rpm = match value.trim().parse::<i64>() {
            Ok(rpm) if rpm >= 0 => rpm,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    name: ENV_RATE_LIMIT,
                    value,
                    reason: "must be a non-negative integer".to_string(),
                })
            }
        };
    }

    if let Some(value) = var(ENV_SECURITY_HEADERS) {
        config.security.enable_headers = parse_flag(ENV_SECURITY_HEADERS, value)?;
    }

    if let Some(value) = var(ENV_HEALTH_ENABLED) {
        config.health.enabled = parse_flag(ENV_HEALTH_ENABLED, value)?;
    }

    if let Some(url) = var(ENV_UPSTREAM_URL) {
        config.health.upstream.url = Some(url.trim().to_string());
    }

    if let Some(token) = var(ENV_UPSTREAM_TOKEN) {
        config.health.upstream.token = Some(token);
    }

    if let Some(level) = var(ENV_LOG_LEVEL) {
        config.observability.log_level = level.trim().to_string();
    }

    if let Some(value) = var(ENV_LOG_FORMAT) {
        config.observability.log_format =
            value
                .parse()
                .map_err(|reason| ConfigError::InvalidEnv {
                    name: ENV_LOG_FORMAT,
                    value,
                    reason,
                })?;
    }

    Ok(())
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value,
            reason: "expected true, false, 1 or 0".to_string(),
        }),
    }
}
