//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

use crate::security::cors::parse_origins;

/// Token value that puts the upstream probe into demo mode.
pub const DEMO_TOKEN: &str = "demo";

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting, CORS and response header policy.
    pub security: SecurityConfig,

    /// Probe endpoint settings.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:13080".to_string(),
        }
    }
}

/// Timeout configuration for protected routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Admission policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows every origin.
    ///
    /// Accepts either a TOML array or a comma-separated string.
    #[serde(deserialize_with = "deserialize_origins")]
    pub cors_origins: Vec<String>,

    /// Requests per minute per client. Zero or negative disables limiting.
    pub rate_limit_rpm: i64,

    /// Enable the fixed set of security response headers.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            rate_limit_rpm: 60,
            enable_headers: true,
        }
    }
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Mount `/health`, `/health/ready` and `/health/live`.
    pub enabled: bool,

    /// Deadline for `/health` in seconds.
    pub basic_timeout_secs: u64,

    /// Deadline for `/health/ready` in seconds.
    pub readiness_timeout_secs: u64,

    /// Upstream dependency probed by the readiness endpoint.
    pub upstream: UpstreamConfig,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            basic_timeout_secs: 10,
            readiness_timeout_secs: 15,
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Upstream dependency probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL hit by the connectivity probe. No URL means no probe.
    pub url: Option<String>,

    /// Bearer token sent with the probe.
    pub token: Option<String>,

    /// Report the upstream as ok without performing I/O.
    pub skip_probe: bool,
}

impl UpstreamConfig {
    /// Whether the probe is administratively skipped.
    pub fn is_skipped(&self) -> bool {
        self.skip_probe || self.token.as_deref() == Some(DEMO_TOKEN)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "console" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OriginList::deserialize(deserializer)? {
        OriginList::List(origins) => origins.into_iter().map(|o| o.trim().to_string()).collect(),
        OriginList::Joined(joined) => parse_origins(&joined),
    })
}
