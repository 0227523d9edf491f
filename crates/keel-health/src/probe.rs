use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

/// Reported state of a single dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Error,
}

impl ServiceStatus {
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Check one dependency and report whether it is usable
///
/// Returning `Err` is equivalent to reporting [`ServiceStatus::Error`]; the
/// aggregator records the failure and moves on.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> anyhow::Result<ServiceStatus>;
}

/// Probe that always reports the same status
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub ServiceStatus);

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn check(&self) -> anyhow::Result<ServiceStatus> {
        Ok(self.0)
    }
}

/// Probe that checks reachability of a TCP endpoint (database, cache, broker)
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    /// Create a probe for `host:port`
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn check(&self) -> anyhow::Result<ServiceStatus> {
        let connect = TcpStream::connect(self.address.as_str());

        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(_stream)) => Ok(ServiceStatus::Ok),
            Ok(Err(e)) => Err(anyhow::anyhow!("failed to connect to {}: {e}", self.address)),
            Err(_) => Err(anyhow::anyhow!(
                "connecting to {} timed out after {:?}",
                self.address,
                self.connect_timeout
            )),
        }
    }
}

/// Probe backed by an async closure
///
/// Useful for dependencies whose check is a one-off query, such as running
/// `SELECT 1` through an existing connection pool.
pub struct FnProbe<F> {
    check: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ServiceStatus>> + Send,
{
    pub const fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F, Fut> HealthProbe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ServiceStatus>> + Send,
{
    async fn check(&self) -> anyhow::Result<ServiceStatus> {
        (self.check)().await
    }
}
