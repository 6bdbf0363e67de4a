//! End-to-end admission pipeline tests against a live listener.

use edge_guard::config::GateConfig;
use reqwest::{Method, StatusCode};

mod common;

const ACAO: &str = "access-control-allow-origin";

fn config_with(f: impl FnOnce(&mut GateConfig)) -> GateConfig {
    let mut config = GateConfig::default();
    f(&mut config);
    config
}

#[tokio::test]
async fn test_burst_of_one_per_client() {
    let gate = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 60)).await;
    let client = common::client();

    let first = client
        .get(gate.url("/"))
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .get(gate.url("/"))
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["message"], "Too many requests from this client");
    assert_eq!(
        body["error"]["details"],
        "Rate limit of 60 requests per minute exceeded"
    );
    assert_eq!(body["path"], "/");

    let other = client
        .get(gate.url("/"))
        .header("x-forwarded-for", "203.0.113.8, 10.0.0.1")
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_zero_rpm_is_unlimited() {
    let gate = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 0)).await;
    let client = common::client();

    for _ in 0..20 {
        let response = client.get(gate.url("/")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_empty_allow_list_sends_wildcard() {
    let gate = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 0)).await;

    let response = common::client().get(gate.url("/")).send().await.unwrap();
    assert_eq!(response.headers()[ACAO], "*");
}

#[tokio::test]
async fn test_allow_list_echo_and_omission() {
    let gate = common::spawn_gate(config_with(|c| {
        c.security.rate_limit_rpm = 0;
        c.security.cors_origins = vec!["https://a.com".into()];
    }))
    .await;
    let client = common::client();

    let allowed = client
        .get(gate.url("/"))
        .header("origin", "https://a.com")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(allowed.headers()[ACAO], "https://a.com");

    let denied = client
        .get(gate.url("/"))
        .header("origin", "https://evil.com")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::OK);
    assert!(denied.headers().get(ACAO).is_none());
}

#[tokio::test]
async fn test_wildcard_entry_echoes_origin() {
    let gate = common::spawn_gate(config_with(|c| {
        c.security.rate_limit_rpm = 0;
        c.security.cors_origins = vec!["https://a.com".into(), "*".into()];
    }))
    .await;

    let response = common::client()
        .get(gate.url("/"))
        .header("origin", "https://b.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[ACAO], "https://b.com");
}

#[tokio::test]
async fn test_preflight_answered_by_gate() {
    let gate = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 0)).await;

    let response = common::client()
        .request(Method::OPTIONS, gate.url("/"))
        .header("origin", "https://a.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ACAO], "*");
    assert!(response
        .headers()
        .contains_key("access-control-allow-methods"));
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_security_headers_toggle() {
    let names = [
        "x-content-type-options",
        "x-frame-options",
        "x-xss-protection",
        "referrer-policy",
        "content-security-policy",
    ];
    let client = common::client();

    let enabled = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 0)).await;
    let response = client.get(enabled.url("/")).send().await.unwrap();
    for name in names {
        assert!(response.headers().contains_key(name), "missing {}", name);
    }

    let disabled = common::spawn_gate(config_with(|c| {
        c.security.rate_limit_rpm = 0;
        c.security.enable_headers = false;
    }))
    .await;
    let response = client.get(disabled.url("/")).send().await.unwrap();
    for name in names {
        assert!(!response.headers().contains_key(name), "unexpected {}", name);
    }
}

#[tokio::test]
async fn test_unknown_path_is_guarded_json_404() {
    let gate = common::spawn_gate(config_with(|c| c.security.rate_limit_rpm = 0)).await;

    let response = common::client().get(gate.url("/nope")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["path"], "/nope");
}
