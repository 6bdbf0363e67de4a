//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the probe endpoints outside the admission pipeline
//! - Wrap the downstream router with the pipeline and request timeout
//! - Wire up cross-cutting layers (tracing, request ID)
//! - Serve with connect info until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::health::{health_router, HealthChecker};
use crate::http::pipeline::{admission_middleware, RequestPipeline};
use crate::security::RateLimiterRegistry;

/// HTTP server for the admission gate.
pub struct HttpServer {
    router: Router,
    limiter: Arc<RateLimiterRegistry>,
}

impl HttpServer {
    /// Create a server guarding `downstream` with the configured pipeline.
    ///
    /// The downstream router's fallback, if any, is guarded as well.
    pub fn new(config: &GateConfig, health: Arc<HealthChecker>, downstream: Router) -> Self {
        let limiter = Arc::new(RateLimiterRegistry::new(config.security.rate_limit_rpm));
        let router = Self::build_router(config, limiter.clone(), health, downstream);
        Self { router, limiter }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(
        config: &GateConfig,
        limiter: Arc<RateLimiterRegistry>,
        health: Arc<HealthChecker>,
        downstream: Router,
    ) -> Router {
        let pipeline = Arc::new(RequestPipeline::new(&config.security, limiter));
        tracing::debug!(stages = ?pipeline.stage_names(), "Admission pipeline built");

        let protected = downstream
            .layer(middleware::from_fn_with_state(pipeline, admission_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let app = if config.health.enabled {
            health_router(health).merge(protected)
        } else {
            protected
        };

        app.layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> Arc<RateLimiterRegistry> {
        self.limiter.clone()
    }

    /// Run the server until a shutdown signal arrives, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit_rpm = ?self.limiter.requests_per_minute(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
