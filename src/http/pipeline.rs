//! Request admission pipeline.
//!
//! # Stages (fixed order)
//! ```text
//! rate_limit        → 429 and stop when the client's bucket is empty
//! cors              → cross-origin headers
//! security_headers  → fixed defensive headers (only when enabled)
//! preflight         → OPTIONS answered 200 here, downstream never runs
//! ```
//!
//! Stages write response headers into the [`Exchange`]; they are merged into
//! whatever response ends the request. Headers set by the downstream handler
//! take precedence.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::ORIGIN, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SecurityConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::security::{ClientIdentity, CorsPolicy, RateLimiterRegistry, SecurityHeaders};

/// Request facts and pending response headers passed through the stages.
#[derive(Debug)]
pub struct Exchange {
    pub client: ClientIdentity,
    pub method: Method,
    pub path: String,
    pub origin: Option<HeaderValue>,
    pub response_headers: HeaderMap,
}

impl Exchange {
    pub fn from_request(request: &Request<Body>) -> Self {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            client: ClientIdentity::from_request(request.headers(), remote),
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            origin: request.headers().get(ORIGIN).cloned(),
            response_headers: HeaderMap::new(),
        }
    }
}

/// What the pipeline does after a stage.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Respond(Response),
}

/// One step of the pipeline.
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn apply(&self, exchange: &mut Exchange) -> Flow;
}

#[derive(Debug)]
struct RateLimitStage {
    limiter: Arc<RateLimiterRegistry>,
}

impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn apply(&self, exchange: &mut Exchange) -> Flow {
        let Some(requests_per_minute) = self.limiter.requests_per_minute() else {
            return Flow::Continue;
        };

        if self.limiter.allow(exchange.client.as_str()) {
            return Flow::Continue;
        }

        tracing::warn!(
            client_ip = %exchange.client,
            path = %exchange.path,
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();

        Flow::Respond(
            ApiError::RateLimited {
                requests_per_minute,
                path: exchange.path.clone(),
            }
            .into_response(),
        )
    }
}

#[derive(Debug)]
struct CorsStage {
    policy: CorsPolicy,
}

impl Stage for CorsStage {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn apply(&self, exchange: &mut Exchange) -> Flow {
        self.policy
            .apply(exchange.origin.as_ref(), &mut exchange.response_headers);
        Flow::Continue
    }
}

#[derive(Debug)]
struct SecurityHeadersStage {
    headers: SecurityHeaders,
}

impl Stage for SecurityHeadersStage {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn apply(&self, exchange: &mut Exchange) -> Flow {
        self.headers.apply(&mut exchange.response_headers);
        Flow::Continue
    }
}

#[derive(Debug)]
struct PreflightStage;

impl Stage for PreflightStage {
    fn name(&self) -> &'static str {
        "preflight"
    }

    fn apply(&self, exchange: &mut Exchange) -> Flow {
        if exchange.method == Method::OPTIONS {
            Flow::Respond(StatusCode::OK.into_response())
        } else {
            Flow::Continue
        }
    }
}

/// Ordered admission stages in front of the downstream handler.
#[derive(Debug)]
pub struct RequestPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl RequestPipeline {
    pub fn new(config: &SecurityConfig, limiter: Arc<RateLimiterRegistry>) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(RateLimitStage { limiter }),
            Box::new(CorsStage {
                policy: CorsPolicy::new(config.cors_origins.clone()),
            }),
        ];
        if config.enable_headers {
            stages.push(Box::new(SecurityHeadersStage {
                headers: SecurityHeaders,
            }));
        }
        stages.push(Box::new(PreflightStage));

        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the stages in order until one responds.
    pub fn run(&self, exchange: &mut Exchange) -> Flow {
        for stage in &self.stages {
            if let Flow::Respond(response) = stage.apply(exchange) {
                tracing::trace!(stage = stage.name(), "Pipeline short-circuited");
                return Flow::Respond(response);
            }
        }
        Flow::Continue
    }
}

/// Axum middleware running the pipeline before the downstream handler.
pub async fn admission_middleware(
    State(pipeline): State<Arc<RequestPipeline>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut exchange = Exchange::from_request(&request);

    let mut response = match pipeline.run(&mut exchange) {
        Flow::Respond(response) => response,
        Flow::Continue => next.run(request).await,
    };

    merge_headers(response.headers_mut(), &exchange.response_headers);
    response
}

fn merge_headers(target: &mut HeaderMap, pending: &HeaderMap) {
    for (name, value) in pending {
        if !target.contains_key(name) {
            target.insert(name.clone(), value.clone());
        }
    }
}
