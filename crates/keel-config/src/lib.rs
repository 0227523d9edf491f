#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod rate_limit;
pub mod security_headers;
pub mod server;
pub mod telemetry;

use std::time::Duration;

use serde::Deserialize;

pub use app::*;
pub use cors::*;
pub use health::*;
pub use rate_limit::*;
pub use security_headers::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Keel configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Application identity and deployment mode
    #[serde(default)]
    pub app: AppConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Parse a human-readable duration such as `"5s"` or `"15m"`
///
/// # Errors
///
/// Returns an error naming `field` if the value is not a valid duration
pub fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}
