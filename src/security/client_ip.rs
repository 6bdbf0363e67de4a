//! Client identity extraction.
//!
//! The identity is a rate-limit key, not a verified address: forwarding
//! headers are taken at face value.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

const UNKNOWN_CLIENT: &str = "unknown";

/// Key identifying the caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// First hop of `X-Forwarded-For`, else `X-Real-IP`, else the transport
    /// address without its port.
    pub fn from_request(headers: &HeaderMap, remote: Option<SocketAddr>) -> Self {
        let forwarded = header_str(headers, X_FORWARDED_FOR)
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        if let Some(first) = forwarded {
            return Self(first.to_string());
        }

        let real_ip = header_str(headers, X_REAL_IP)
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(real_ip) = real_ip {
            return Self(real_ip.to_string());
        }

        match remote {
            Some(addr) => Self(addr.ip().to_string()),
            None => Self(UNKNOWN_CLIENT.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
