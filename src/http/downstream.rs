//! Minimal downstream mounted by the binary.

use axum::{http::Uri, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// `GET /` service info plus a JSON 404 fallback.
pub fn default_downstream() -> Router {
    Router::new()
        .route("/", get(service_info))
        .fallback(not_found)
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}
