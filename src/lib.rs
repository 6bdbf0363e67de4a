//! Request admission and health monitoring for HTTP services.
//!
//! Protected routes pass through an ordered pipeline (per-client rate
//! limiting, CORS, security headers, preflight) before the downstream
//! handler runs. Probe endpoints (`/health`, `/health/ready`,
//! `/health/live`) sit beside the pipeline and report on the service's
//! dependencies under bounded deadlines.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GateConfig;
pub use health::HealthChecker;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
