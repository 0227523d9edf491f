use std::net::IpAddr;

use keel_config::{RateLimitConfig, RequestRateLimit};

use crate::{KeyedQuota, Usage, error::RateLimitError};

const GLOBAL_KEY: &str = "global";

/// HTTP request-level rate limiter (global and per-IP)
#[derive(Clone)]
pub struct RequestLimiter {
    global: Option<KeyedQuota>,
    per_ip: Option<KeyedQuota>,
}

impl RequestLimiter {
    /// Create from configuration
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let global = config.global.as_ref().map(build_quota).transpose()?;
        let per_ip = config.per_ip.as_ref().map(build_quota).transpose()?;

        Ok(Self { global, per_ip })
    }

    /// Whether any quota is configured
    pub const fn is_enabled(&self) -> bool {
        self.global.is_some() || self.per_ip.is_some()
    }

    /// Check every applicable quota for one request
    ///
    /// Returns the usage of the most constrained quota, or `None` when no
    /// quota applies. The per-IP quota is skipped when the client address is
    /// unknown.
    pub fn check(&self, client: Option<IpAddr>) -> Result<Option<Usage>, RateLimitError> {
        let mut tightest: Option<Usage> = None;

        if let Some(ref quota) = self.global {
            tightest = Some(quota.check(GLOBAL_KEY).inspect_err(|_| {
                tracing::debug!("global rate limit exceeded");
            })?);
        }

        if let Some(ref quota) = self.per_ip
            && let Some(ip) = client
        {
            let usage = quota.check(&ip.to_string()).inspect_err(|_| {
                tracing::debug!(client = %ip, "per-IP rate limit exceeded");
            })?;
            tightest = Some(match tightest {
                Some(current) if current.remaining <= usage.remaining => current,
                _ => usage,
            });
        }

        Ok(tightest)
    }

    /// Forget clients whose quota has fully replenished
    pub fn retain_recent(&self) {
        for quota in [&self.global, &self.per_ip].into_iter().flatten() {
            quota.retain_recent();
        }
    }

    /// Number of client addresses the per-IP quota is tracking
    pub fn tracked_clients(&self) -> usize {
        self.per_ip.as_ref().map_or(0, KeyedQuota::tracked_keys)
    }
}

fn build_quota(rate_limit: &RequestRateLimit) -> Result<KeyedQuota, RateLimitError> {
    let window = rate_limit
        .window()
        .map_err(|e| RateLimitError::Config(e.to_string()))?;

    KeyedQuota::new(rate_limit.requests, window)
}
