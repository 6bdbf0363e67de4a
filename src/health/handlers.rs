//! Probe endpoint handlers.
//!
//! These routes are mounted beside the protected router and never pass
//! through the admission pipeline.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use crate::health::checker::HealthChecker;
use crate::health::report::HealthReport;
use crate::observability::metrics;

pub const HEALTH_PATH: &str = "/health";
pub const READINESS_PATH: &str = "/health/ready";
pub const LIVENESS_PATH: &str = "/health/live";

/// Router serving the three probe endpoints.
pub fn health_router(checker: Arc<HealthChecker>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(READINESS_PATH, get(readiness_handler))
        .route(LIVENESS_PATH, get(liveness_handler))
        .with_state(checker)
}

async fn health_handler(State(checker): State<Arc<HealthChecker>>) -> HealthReport {
    finish("health", checker.health().await)
}

async fn readiness_handler(State(checker): State<Arc<HealthChecker>>) -> HealthReport {
    finish("readiness", checker.readiness().await)
}

async fn liveness_handler(State(checker): State<Arc<HealthChecker>>) -> HealthReport {
    finish("liveness", checker.liveness())
}

fn finish(endpoint: &'static str, report: HealthReport) -> HealthReport {
    metrics::record_health_check(endpoint, report.is_healthy());
    tracing::debug!(
        endpoint,
        status = ?report.status,
        checks = ?report.checks,
        "Health check completed"
    );
    report
}
