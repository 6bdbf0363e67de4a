//! Health probe aggregation.
//!
//! # Responsibilities
//! - Liveness: process is up, no I/O
//! - Health: readiness source only, short deadline
//! - Readiness: readiness source plus upstream probe, longer deadline
//!
//! # Design Decisions
//! - Checks run concurrently and independently; one failing or timing out
//!   never prevents the other from reporting
//! - A missing collaborator is a failed check, not a panic
//! - No retries: each request reports what it saw once

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::HealthConfig;
use crate::health::probe::{Deadline, DependencyProbe, ProbeError, ProbeResult, ReadinessSource};
use crate::health::report::{CheckStatus, HealthReport};

pub const APPLICATION_CHECK: &str = "application";
pub const CACHE_CHECK: &str = "cache";
pub const UPSTREAM_CHECK: &str = "upstream";

/// Instant the process started. Set once, basis for uptime.
#[derive(Debug, Clone, Copy)]
pub struct ServerStartTime(Instant);

impl ServerStartTime {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn uptime(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Runs the checks behind `/health`, `/health/ready` and `/health/live`.
pub struct HealthChecker {
    started: ServerStartTime,
    version: String,
    readiness: Option<Arc<dyn ReadinessSource>>,
    upstream: Option<Arc<dyn DependencyProbe>>,
    skip_upstream: bool,
    basic_timeout: Duration,
    readiness_timeout: Duration,
}

impl HealthChecker {
    pub fn new(config: &HealthConfig, started: ServerStartTime) -> Self {
        Self {
            started,
            version: env!("CARGO_PKG_VERSION").to_string(),
            readiness: None,
            upstream: None,
            skip_upstream: config.upstream.is_skipped(),
            basic_timeout: Duration::from_secs(config.basic_timeout_secs),
            readiness_timeout: Duration::from_secs(config.readiness_timeout_secs),
        }
    }

    pub fn with_readiness(mut self, source: Arc<dyn ReadinessSource>) -> Self {
        self.readiness = Some(source);
        self
    }

    pub fn with_upstream(mut self, probe: Arc<dyn DependencyProbe>) -> Self {
        self.upstream = Some(probe);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeouts(mut self, basic: Duration, readiness: Duration) -> Self {
        self.basic_timeout = basic;
        self.readiness_timeout = readiness;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn uptime(&self) -> Duration {
        self.started.uptime()
    }

    /// Always healthy with a single `application` check.
    pub fn liveness(&self) -> HealthReport {
        let mut checks = BTreeMap::new();
        checks.insert(APPLICATION_CHECK.to_string(), CheckStatus::Ok);
        HealthReport::new(self.version.clone(), checks, BTreeMap::new(), Some(self.uptime()))
    }

    /// Readiness source only, bounded by the basic deadline.
    pub async fn health(&self) -> HealthReport {
        let deadline = Deadline::after(self.basic_timeout);
        let cache = deadline.run(self.check_cache()).await;

        let mut report = ReportBuilder::default();
        report.record(CACHE_CHECK, cache);
        report.finish(self.version.clone(), None)
    }

    /// Readiness source and upstream probe, bounded by the readiness deadline.
    pub async fn readiness(&self) -> HealthReport {
        let deadline = Deadline::after(self.readiness_timeout);
        let (cache, upstream) = tokio::join!(
            deadline.run(self.check_cache()),
            deadline.run(self.check_upstream()),
        );

        let mut report = ReportBuilder::default();
        report.record(CACHE_CHECK, cache);
        report.record(UPSTREAM_CHECK, upstream);
        report.finish(self.version.clone(), Some(self.uptime()))
    }

    async fn check_cache(&self) -> ProbeResult<()> {
        let source = self
            .readiness
            .as_ref()
            .ok_or(ProbeError::NotConfigured("readiness source"))?;

        if source.is_ready().await? {
            Ok(())
        } else {
            Err(ProbeError::NotReady)
        }
    }

    async fn check_upstream(&self) -> ProbeResult<()> {
        // Demo mode skips the round-trip, not the collaborator
        let probe = self
            .upstream
            .as_ref()
            .ok_or(ProbeError::NotConfigured("upstream probe"))?;

        if self.skip_upstream {
            return Ok(());
        }

        probe.probe().await
    }
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("version", &self.version)
            .field("has_readiness", &self.readiness.is_some())
            .field("has_upstream", &self.upstream.is_some())
            .field("skip_upstream", &self.skip_upstream)
            .field("basic_timeout", &self.basic_timeout)
            .field("readiness_timeout", &self.readiness_timeout)
            .finish()
    }
}

#[derive(Default)]
struct ReportBuilder {
    checks: BTreeMap<String, CheckStatus>,
    details: BTreeMap<String, String>,
}

impl ReportBuilder {
    fn record(&mut self, name: &'static str, result: ProbeResult<()>) {
        match result {
            Ok(()) => {
                self.checks.insert(name.to_string(), CheckStatus::Ok);
            }
            Err(e) => {
                tracing::debug!(check = name, error = %e, "Health check failed");
                self.checks.insert(name.to_string(), CheckStatus::Error);
                self.details.insert(name.to_string(), describe_failure(name, &e));
            }
        }
    }

    fn finish(self, version: String, uptime: Option<Duration>) -> HealthReport {
        HealthReport::new(version, self.checks, self.details, uptime)
    }
}

fn describe_failure(name: &str, error: &ProbeError) -> String {
    let subject = match name {
        CACHE_CHECK => "Cache system not ready",
        UPSTREAM_CHECK => "Upstream connectivity failed",
        _ => "Check failed",
    };
    format!("{}: {}", subject, error)
}
