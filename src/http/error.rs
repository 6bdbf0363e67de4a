//! API error types mapped to HTTP status codes.
//!
//! Every variant renders the same JSON shape:
//! `{"error":{"code","message","details"},"timestamp","path"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Errors answered directly by the gate.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client exhausted its token bucket (429).
    #[error("Too many requests from this client")]
    RateLimited { requests_per_minute: u32, path: String },

    /// No downstream route matched (404).
    #[error("No route matches the requested path")]
    NotFound { path: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RateLimited { .. } => RATE_LIMIT_EXCEEDED,
            ApiError::NotFound { .. } => NOT_FOUND,
        }
    }

    pub fn details(&self) -> String {
        match self {
            ApiError::RateLimited {
                requests_per_minute,
                ..
            } => format!(
                "Rate limit of {} requests per minute exceeded",
                requests_per_minute
            ),
            ApiError::NotFound { path } => format!("No handler for '{}'", path),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ApiError::RateLimited { path, .. } | ApiError::NotFound { path } => path,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
            timestamp: Utc::now(),
            path: self.path().to_string(),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
