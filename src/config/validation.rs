//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All errors are collected so a
//! bad config reports everything wrong with it at once.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GateConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.security.cors_origins.iter().any(|o| o.is_empty()) {
        errors.push(ValidationError::new(
            "security.cors_origins",
            "empty origin not allowed",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.health.basic_timeout_secs == 0 {
        errors.push(ValidationError::new("health.basic_timeout_secs", "must be greater than 0"));
    }

    if config.health.readiness_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "health.readiness_timeout_secs",
            "must be greater than 0",
        ));
    }

    if let Some(raw) = &config.health.upstream.url {
        if let Err(e) = url::Url::parse(raw) {
            errors.push(ValidationError::new(
                "health.upstream.url",
                format!("'{}' is not a valid URL: {}", raw, e),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
