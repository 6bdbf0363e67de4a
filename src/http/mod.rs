//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /health* → health handlers (no admission)
//!     → otherwise pipeline.rs (rate limit, CORS, security headers, preflight)
//!     → downstream router
//!     → pending headers merged into the response
//! ```

pub mod downstream;
pub mod error;
pub mod pipeline;
pub mod server;

pub use downstream::default_downstream;
pub use error::{ApiError, ErrorBody};
pub use pipeline::{admission_middleware, Exchange, Flow, RequestPipeline, Stage};
pub use server::HttpServer;
