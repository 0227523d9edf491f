use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DashMapStateStore;
use governor::{Quota, RateLimiter};

use crate::error::{RateLimitError, ceil_secs};

type Limiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock, StateInformationMiddleware>;

/// Quota consumption after an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left before the limiter starts rejecting
    pub remaining: u32,
    /// Time until the quota is fully replenished
    pub reset: Duration,
}

impl Usage {
    /// `reset` rounded up to whole seconds
    pub const fn reset_secs(&self) -> u64 {
        ceil_secs(self.reset)
    }
}

/// In-memory keyed GCRA limiter backed by governor
///
/// `requests` per `window` are allowed as a burst, replenishing evenly over
/// the window.
#[derive(Clone)]
pub struct KeyedQuota {
    limiter: Arc<Limiter>,
    clock: DefaultClock,
    limit: u32,
}

impl KeyedQuota {
    pub fn new(requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        let burst =
            NonZeroU32::new(requests).ok_or_else(|| RateLimitError::Config("requests must be > 0".to_string()))?;

        if window.is_zero() {
            return Err(RateLimitError::Config("rate limit window must be > 0".to_string()));
        }

        let quota = Quota::with_period(window / requests)
            .ok_or_else(|| RateLimitError::Config("invalid rate limit period".to_string()))?
            .allow_burst(burst);

        let limiter = RateLimiter::dashmap(quota).with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            limiter: Arc::new(limiter),
            clock: DefaultClock::default(),
            limit: requests,
        })
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit or reject one request for `key`
    pub fn check(&self, key: &str) -> Result<Usage, RateLimitError> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity();
                let consumed = self.limit.saturating_sub(remaining);
                Ok(Usage {
                    limit: self.limit,
                    remaining,
                    reset: snapshot.quota().replenish_interval() * consumed,
                })
            }
            Err(not_until) => Err(RateLimitError::Exceeded {
                limit: self.limit,
                retry_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }

    /// Drop state for keys whose quota has fully replenished
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of keys currently holding limiter state
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}
