use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;

use crate::{HealthProbe, HealthReport, ProbeRegistry, ReportMetadata, ServiceStatus};

/// Upper bound for a single probe unless configured otherwise
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs every registered probe and folds the results into one report
///
/// Probes run concurrently and are isolated from each other: an `Err`, a
/// panic or a timeout in one probe only marks that probe as `error`.
#[derive(Debug, Clone)]
pub struct HealthAggregator {
    registry: Arc<ProbeRegistry>,
    probe_timeout: Option<Duration>,
}

impl HealthAggregator {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            probe_timeout: Some(DEFAULT_PROBE_TIMEOUT),
        }
    }

    /// Set the per-probe timeout; `None` waits for probes indefinitely
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Check every dependency and assemble the report
    ///
    /// Waits for all probes to settle, never short-circuits, never fails.
    pub async fn aggregate(&self, metadata: ReportMetadata) -> HealthReport {
        let checks = self.registry.iter().map(|(name, probe)| async move {
            let status = run_probe(name, probe, self.probe_timeout).await;
            (name.to_owned(), status)
        });

        let services: BTreeMap<String, ServiceStatus> = join_all(checks).await.into_iter().collect();

        let report = HealthReport::assemble(metadata, services);
        tracing::debug!(status = ?report.status, probes = report.services.len(), "health check completed");

        report
    }
}

async fn run_probe(name: &str, probe: &dyn HealthProbe, timeout: Option<Duration>) -> ServiceStatus {
    let check = AssertUnwindSafe(probe.check()).catch_unwind();

    let outcome = match timeout {
        Some(limit) => {
            if let Ok(outcome) = tokio::time::timeout(limit, check).await {
                outcome
            } else {
                tracing::warn!(probe = name, timeout = ?limit, "health probe timed out");
                return ServiceStatus::Error;
            }
        }
        None => check.await,
    };

    match outcome {
        Ok(Ok(status)) => {
            if !status.is_ok() {
                tracing::warn!(probe = name, "health probe reported error");
            }
            status
        }
        Ok(Err(e)) => {
            tracing::warn!(probe = name, error = %e, "health probe failed");
            ServiceStatus::Error
        }
        Err(_) => {
            tracing::error!(probe = name, "health probe panicked");
            ServiceStatus::Error
        }
    }
}
