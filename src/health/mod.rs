//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health/live
//!     → checker.rs (synthetic "application" check, no I/O)
//!
//! GET /health, GET /health/ready
//!     → checker.rs (start a Deadline)
//!     → probe.rs (ReadinessSource, DependencyProbe, concurrently)
//!     → report.rs (HealthReport, status derived from checks)
//!     → 200 healthy / 503 unhealthy / 500 if the report cannot be encoded
//! ```
//!
//! # Design Decisions
//! - Probe endpoints bypass the admission pipeline
//! - Every check is bounded; expiry is a failed check
//! - Partial failures are aggregated, never fail-fast

pub mod checker;
pub mod handlers;
pub mod probe;
pub mod report;

pub use checker::{HealthChecker, ServerStartTime};
pub use handlers::health_router;
pub use probe::{DependencyProbe, HttpUpstreamProbe, ProbeError, ReadinessFlag, ReadinessSource};
pub use report::{CheckStatus, HealthReport, HealthStatus};
