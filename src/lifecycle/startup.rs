//! Startup wiring.
//!
//! # Responsibilities
//! - Build the health checker from configuration
//! - Attach the upstream probe when an upstream URL is configured
//! - Bind the listener last, so traffic only arrives once wiring succeeded

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GateConfig;
use crate::health::{HealthChecker, HttpUpstreamProbe, ReadinessSource, ServerStartTime};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid upstream url '{url}': {source}")]
    UpstreamUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Health checker wired to `readiness` and, if configured, the upstream.
pub fn build_health_checker(
    config: &GateConfig,
    started: ServerStartTime,
    readiness: Arc<dyn ReadinessSource>,
) -> Result<HealthChecker, StartupError> {
    let upstream = &config.health.upstream;
    let mut checker = HealthChecker::new(&config.health, started).with_readiness(readiness);

    if upstream.is_skipped() {
        if upstream.url.is_none() {
            tracing::warn!("Upstream probe skipped but no upstream url configured, readiness will fail");
        } else {
            tracing::info!("Upstream probe skipped (demo mode)");
        }
    }

    if let Some(raw) = &upstream.url {
        let url = url::Url::parse(raw).map_err(|source| StartupError::UpstreamUrl {
            url: raw.clone(),
            source,
        })?;
        tracing::info!(upstream = %url, "Upstream probe configured");
        checker = checker.with_upstream(Arc::new(HttpUpstreamProbe::new(url, upstream.token.clone())));
    }

    Ok(checker)
}

pub async fn bind_listener(config: &GateConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{CheckStatus, ReadinessFlag};

    #[tokio::test]
    async fn test_checker_without_upstream_url() {
        let config = GateConfig::default();
        let checker =
            build_health_checker(&config, ServerStartTime::now(), Arc::new(ReadinessFlag::new(true)))
                .unwrap();

        let report = checker.readiness().await;
        assert_eq!(report.checks["cache"], CheckStatus::Ok);
        assert_eq!(report.checks["upstream"], CheckStatus::Error);
    }

    #[test]
    fn test_bad_upstream_url() {
        let mut config = GateConfig::default();
        config.health.upstream.url = Some("not a url".into());

        let err = build_health_checker(&config, ServerStartTime::now(), Arc::new(ReadinessFlag::new(true)))
            .unwrap_err();
        assert!(matches!(err, StartupError::UpstreamUrl { .. }));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let mut config = GateConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();

        let listener = bind_listener(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
