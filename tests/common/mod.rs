//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use edge_guard::config::GateConfig;
use edge_guard::health::{HealthChecker, HttpUpstreamProbe, ReadinessFlag, ServerStartTime};
use edge_guard::http::{default_downstream, HttpServer};
use edge_guard::lifecycle::Shutdown;

/// A gate running on a loopback port. Shuts down when dropped.
pub struct TestGate {
    pub addr: SocketAddr,
    pub readiness: Arc<ReadinessFlag>,
    shutdown: Shutdown,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// HTTP client that never routes loopback traffic through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

/// Start the gate with `config` in front of the default downstream.
pub async fn spawn_gate(config: GateConfig) -> TestGate {
    spawn_gate_with_readiness(config, true).await
}

pub async fn spawn_gate_with_readiness(mut config: GateConfig, ready: bool) -> TestGate {
    config.listener.bind_address = "127.0.0.1:0".into();

    let readiness = Arc::new(ReadinessFlag::new(ready));
    let mut checker = HealthChecker::new(&config.health, ServerStartTime::now())
        .with_readiness(readiness.clone());
    if let Some(raw) = &config.health.upstream.url {
        let probe = HttpUpstreamProbe::with_client(
            client(),
            raw.parse().unwrap(),
            config.health.upstream.token.clone(),
        );
        checker = checker.with_upstream(Arc::new(probe));
    }

    let server = HttpServer::new(&config, Arc::new(checker), default_downstream());
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestGate {
        addr,
        readiness,
        shutdown,
    }
}

/// Start a programmable mock upstream. The handler sees the raw request head.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let (status, body) = f(head).await;
                let status_text = match status {
                    200 => "200 OK",
                    204 => "204 No Content",
                    401 => "401 Unauthorized",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start an upstream that accepts connections and never answers.
pub async fn start_hanging_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
