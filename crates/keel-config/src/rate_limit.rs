use std::time::Duration;

use serde::Deserialize;

use crate::parse_duration;

/// Request rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Limit shared by all clients
    #[serde(default)]
    pub global: Option<RequestRateLimit>,
    /// Limit applied per client IP
    #[serde(default)]
    pub per_ip: Option<RequestRateLimit>,
}

/// Request-based rate limit
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestRateLimit {
    /// Maximum requests per window
    pub requests: u32,
    /// Window duration (e.g. "1m", "15m")
    pub window: String,
}

impl RequestRateLimit {
    /// Parsed window duration
    ///
    /// # Errors
    ///
    /// Returns an error if the window is not a valid duration
    pub fn window(&self) -> anyhow::Result<Duration> {
        parse_duration("rate limit window", &self.window)
    }
}
