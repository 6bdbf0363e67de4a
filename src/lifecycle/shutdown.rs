//! Shutdown coordination.

use std::future::Future;
use std::io;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast handle that every long-running task subscribes to.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a spawned server until it exits or `signal` resolves.
///
/// A server that fails before any signal is reported immediately. On a
/// signal every subscriber is told to stop and the server is drained.
pub async fn run_until_signal<F>(
    mut server: JoinHandle<io::Result<()>>,
    signal: F,
    shutdown: &Shutdown,
) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        result = &mut server => {
            let result = result.map_err(io::Error::other)?;
            match &result {
                Ok(()) => tracing::warn!("HTTP server exited before a shutdown signal"),
                Err(e) => tracing::error!(error = %e, "HTTP server failed"),
            }
            return result;
        }
        signal_result = signal => {
            shutdown.trigger();
            signal_result?;
        }
    }

    server.await.map_err(io::Error::other)?
}
