use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Outcome of one reachability check.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbeResult {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn reachable(latency: Duration) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
        }
    }

    pub fn unreachable<S: Into<String>>(error: S) -> Self {
        Self {
            reachable: false,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

/// Checks whether a public `host:port` accepts connections.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> ProbeResult;
}

/// Plain TCP connect with a deadline.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn probe(&self, host: &str, port: u16) -> ProbeResult {
        let started = Instant::now();

        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => {
                let latency = started.elapsed();
                debug!(host, port, latency_ms = latency.as_millis() as u64, "Probe connected");
                ProbeResult::reachable(latency)
            }
            Ok(Err(e)) => ProbeResult::unreachable(format!("connect to {host}:{port} failed: {e}")),
            Err(_) => ProbeResult::unreachable(format!(
                "connect to {host}:{port} timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}
