//! Collaborator interfaces checked by the health endpoints.
//!
//! # Responsibilities
//! - `ReadinessSource`: the fronted service's own readiness (its cache)
//! - `DependencyProbe`: connectivity to an upstream dependency
//! - `Deadline`: bounds every check so a hung dependency cannot stall a probe

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::AUTHORIZATION;
use thiserror::Error;
use tokio::time::Instant;

/// Why a check failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("not ready")]
    NotReady,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// The fronted service's own readiness, typically a warmed cache.
pub trait ReadinessSource: Send + Sync {
    fn is_ready(&self) -> BoxFuture<'_, ProbeResult<bool>>;
}

/// Connectivity check against an upstream dependency.
pub trait DependencyProbe: Send + Sync {
    fn probe(&self) -> BoxFuture<'_, ProbeResult<()>>;
}

/// Deadline shared by the checks of one probe request.
///
/// Futures run under it are dropped, and so cancelled, once it passes.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub async fn run<T, F>(&self, fut: F) -> ProbeResult<T>
    where
        F: Future<Output = ProbeResult<T>>,
    {
        tokio::time::timeout_at(self.at, fut)
            .await
            .unwrap_or(Err(ProbeError::DeadlineExceeded(self.budget)))
    }
}

/// Readiness flipped by the embedding service once it can serve.
#[derive(Debug, Default)]
pub struct ReadinessFlag {
    ready: AtomicBool,
}

impl ReadinessFlag {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn mark_not_ready(&self) {
        self.ready.store(false, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

impl ReadinessSource for ReadinessFlag {
    fn is_ready(&self) -> BoxFuture<'_, ProbeResult<bool>> {
        futures_util::future::ready(Ok(self.get())).boxed()
    }
}

/// Authenticated `GET` round-trip to an upstream URL. Any 2xx is healthy.
#[derive(Debug, Clone)]
pub struct HttpUpstreamProbe {
    client: reqwest::Client,
    url: url::Url,
    token: Option<String>,
}

impl HttpUpstreamProbe {
    pub fn new(url: url::Url, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url, token)
    }

    pub fn with_client(client: reqwest::Client, url: url::Url, token: Option<String>) -> Self {
        Self { client, url, token }
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }

    async fn round_trip(&self) -> ProbeResult<()> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header("user-agent", "edge-guard-health-check");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::UpstreamStatus(status.as_u16()))
        }
    }
}

impl DependencyProbe for HttpUpstreamProbe {
    fn probe(&self) -> BoxFuture<'_, ProbeResult<()>> {
        self.round_trip().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_flag() {
        let flag = ReadinessFlag::default();
        assert!(!flag.is_ready().await.unwrap());
        flag.mark_ready();
        assert!(flag.is_ready().await.unwrap());
        flag.mark_not_ready();
        assert!(!flag.get());
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let deadline = Deadline::after(Duration::from_secs(1));
        assert_eq!(deadline.run(async { Ok(7) }).await.unwrap(), 7);

        let err = deadline
            .run(async { Err::<(), _>(ProbeError::NotReady) })
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotReady));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_an_error() {
        let deadline = Deadline::after(Duration::from_millis(50));
        let err = deadline
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::DeadlineExceeded(d) if d == Duration::from_millis(50)));
        assert!(deadline.is_expired());
    }

    #[tokio::test]
    async fn test_http_probe_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let probe =
            HttpUpstreamProbe::with_client(client, format!("http://{}/", addr).parse().unwrap(), None);
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::Unavailable(_)));
    }
}
