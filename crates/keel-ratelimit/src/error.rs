use std::time::Duration;

use thiserror::Error;

/// Rate limiting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// Configuration error
    #[error("rate limit configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    Exceeded {
        /// Requests allowed per window by the quota that was hit
        limit: u32,
        /// Time until the next request would be admitted
        retry_after: Duration,
    },
}

impl RateLimitError {
    /// Whole seconds until retry, never zero
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Exceeded { retry_after, .. } => Some(ceil_secs(*retry_after).max(1)),
            Self::Config(_) => None,
        }
    }
}

pub(crate) const fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 { secs + 1 } else { secs }
}
