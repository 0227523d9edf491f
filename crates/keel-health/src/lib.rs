//! Dependency health checks for Keel
//!
//! Probes report the state of one dependency each. The aggregator runs them
//! all concurrently and folds the results into a single [`HealthReport`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod aggregator;
mod probe;
mod registry;
mod report;

pub use aggregator::{DEFAULT_PROBE_TIMEOUT, HealthAggregator};
pub use probe::{FnProbe, HealthProbe, ServiceStatus, StaticProbe, TcpProbe};
pub use registry::{ProbeRegistry, RegistryError};
pub use report::{HealthReport, HealthStatus, ReportMetadata};
