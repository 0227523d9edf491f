use std::collections::BTreeMap;

use http::StatusCode;
use jiff::Timestamp;
use keel_core::Environment;
use serde::{Deserialize, Serialize};

use crate::ServiceStatus;

/// Overall verdict of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

impl HealthStatus {
    /// Fold individual statuses: `Ok` only if every one of them is `Ok`
    ///
    /// An empty set is healthy.
    pub fn fold<'a>(statuses: impl IntoIterator<Item = &'a ServiceStatus>) -> Self {
        if statuses.into_iter().all(|status| status.is_ok()) {
            Self::Ok
        } else {
            Self::Degraded
        }
    }

    /// HTTP status the health endpoint responds with
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Process metadata echoed in the report, supplied by the caller
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub timezone: String,
    pub timestamp: Timestamp,
    /// Process uptime in seconds
    pub uptime: f64,
}

/// Public health report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub timezone: String,
    pub timestamp: Timestamp,
    pub uptime: f64,
    pub services: BTreeMap<String, ServiceStatus>,
}

impl HealthReport {
    pub(crate) fn assemble(metadata: ReportMetadata, services: BTreeMap<String, ServiceStatus>) -> Self {
        Self {
            status: HealthStatus::fold(services.values()),
            name: metadata.name,
            version: metadata.version,
            environment: metadata.environment,
            timezone: metadata.timezone,
            timestamp: metadata.timestamp,
            uptime: metadata.uptime,
            services,
        }
    }

    pub const fn http_status(&self) -> StatusCode {
        self.status.http_status()
    }
}
