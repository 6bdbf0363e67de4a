//! Health report document served by the probe endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Immutable snapshot of the service's health.
///
/// `status` is derived from `checks` when the report is built: healthy
/// exactly when every check is ok.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub checks: BTreeMap<String, CheckStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "uptime_format")]
    pub uptime: Option<Duration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl HealthReport {
    pub fn new(
        version: impl Into<String>,
        checks: BTreeMap<String, CheckStatus>,
        details: BTreeMap<String, String>,
        uptime: Option<Duration>,
    ) -> Self {
        let status = if checks.values().all(|c| *c == CheckStatus::Ok) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            timestamp: Utc::now(),
            version: version.into(),
            checks,
            uptime,
            details,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(body) => (
                self.status_code(),
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(e) => encoding_failure(&e),
        }
    }
}

/// Plain-text 500 used when a report cannot be serialized.
pub fn encoding_failure(error: &dyn std::error::Error) -> Response {
    tracing::error!(error = %error, "Failed to encode health response");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        "Internal server error",
    )
        .into_response()
}

/// Render a duration as `[<h>h][<m>m]<s>[.<fraction>]s`.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let nanos = uptime.subsec_nanos();

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&seconds.to_string());
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('s');
    out
}

/// Parse the output of [`format_uptime`].
pub fn parse_uptime(raw: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid uptime '{raw}'");

    let mut rest = raw.strip_suffix('s').ok_or_else(invalid)?;
    let mut secs: u64 = 0;

    if let Some((hours, tail)) = rest.split_once('h') {
        secs += hours.parse::<u64>().map_err(|_| invalid())? * 3600;
        rest = tail;
    }
    if let Some((minutes, tail)) = rest.split_once('m') {
        secs += minutes.parse::<u64>().map_err(|_| invalid())? * 60;
        rest = tail;
    }

    let (whole, fraction) = rest.split_once('.').unwrap_or((rest, ""));
    secs += whole.parse::<u64>().map_err(|_| invalid())?;

    let nanos = if fraction.is_empty() {
        0
    } else {
        if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        format!("{fraction:0<9}").parse::<u32>().map_err(|_| invalid())?
    };

    Ok(Duration::new(secs, nanos))
}

mod uptime_format {
    use super::{format_uptime, parse_uptime};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(uptime: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match uptime {
            Some(d) => serializer.serialize_str(&format_uptime(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_uptime(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
