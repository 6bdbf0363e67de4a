//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (derive the client identity)
//!     → rate_limit.rs (check the per-client token bucket)
//!     → cors.rs (cross-origin headers from the allow-list)
//!     → headers.rs (fixed security response headers)
//!     → Pass to the downstream handler
//! ```
//!
//! # Design Decisions
//! - Components know nothing of the pipeline; http::pipeline composes them
//! - All state is process-local
//! - CORS mismatches are a policy outcome, not an error

pub mod client_ip;
pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use client_ip::ClientIdentity;
pub use cors::CorsPolicy;
pub use headers::SecurityHeaders;
pub use rate_limit::RateLimiterRegistry;
