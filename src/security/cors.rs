//! Cross-origin resource sharing policy.
//!
//! Origins outside the allow-list are not rejected. The request proceeds
//! without `Access-Control-Allow-Origin` and the browser enforces the
//! same-origin policy.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderMap, HeaderValue};

pub const WILDCARD_ORIGIN: &str = "*";

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
const MAX_AGE_SECS: &str = "86400";

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Origin allow-list. Empty allows every origin.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Whether every origin is allowed without echoing (empty allow-list).
    pub fn allows_all(&self) -> bool {
        self.origins.is_empty()
    }

    /// Value for `Access-Control-Allow-Origin`, if any.
    pub fn allowed_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        if self.allows_all() {
            return Some(HeaderValue::from_static(WILDCARD_ORIGIN));
        }

        let origin = origin?;
        self.origins
            .iter()
            .find(|allowed| {
                allowed.as_str() == WILDCARD_ORIGIN || allowed.as_bytes() == origin.as_bytes()
            })
            .map(|_| origin.clone())
    }

    /// Write the CORS response headers for a request carrying `origin`.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(allowed) = self.allowed_origin(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        }

        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(policy: &CorsPolicy, origin: Option<&str>) -> HeaderMap {
        let origin = origin.map(|o| HeaderValue::from_str(o).unwrap());
        let mut headers = HeaderMap::new();
        policy.apply(origin.as_ref(), &mut headers);
        headers
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.com ,https://b.com,, "),
            vec!["https://a.com", "https://b.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_empty_list_allows_all() {
        let policy = CorsPolicy::default();
        for origin in [Some("https://anything.example"), None] {
            let headers = apply(&policy, origin);
            assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }
    }

    #[test]
    fn test_allow_list_echoes_match() {
        let policy = CorsPolicy::new(parse_origins("https://a.com,https://b.com"));

        let headers = apply(&policy, Some("https://a.com"));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");

        let headers = apply(&policy, Some("https://c.com"));
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        // Remaining CORS headers are set regardless of the match
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], ALLOWED_HEADERS);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn test_wildcard_entry_echoes_origin() {
        let policy = CorsPolicy::new(vec!["*".into()]);
        let headers = apply(&policy, Some("https://c.com"));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://c.com");
    }

    #[test]
    fn test_missing_origin_with_allow_list() {
        let policy = CorsPolicy::new(vec!["*".into()]);
        let headers = apply(&policy, None);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_match_is_exact() {
        let policy = CorsPolicy::new(vec!["https://a.com".into()]);
        assert!(policy
            .allowed_origin(Some(&HeaderValue::from_static("https://A.com")))
            .is_none());
        assert!(policy
            .allowed_origin(Some(&HeaderValue::from_static("https://a.com/")))
            .is_none());
    }
}
