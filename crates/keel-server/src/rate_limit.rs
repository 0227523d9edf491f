use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use keel_core::Failure;
use keel_ratelimit::{RateLimitError, RequestLimiter, Usage};
use tokio_util::sync::CancellationToken;

use crate::reply::ApiError;

static LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// How often limiter state for idle clients is dropped
pub const IDLE_CLIENT_SWEEP: Duration = Duration::from_secs(60);

/// Rate limiting middleware
///
/// Admitted responses carry the current counters; rejected requests become
/// a 429 failure for the dispatcher, with the counters and `retry-after`.
pub async fn rate_limit_middleware(limiter: Arc<RequestLimiter>, request: Request, next: Next) -> Response {
    match limiter.check(client_ip(&request)) {
        Ok(usage) => {
            let mut response = next.run(request).await;
            if let Some(usage) = usage {
                insert_usage(response.headers_mut(), &usage);
            }
            response
        }
        Err(e) => rate_limit_response(&e),
    }
}

/// Periodically forget clients whose quota has fully replenished
///
/// Runs until `shutdown` is cancelled.
pub async fn sweep_idle_clients(limiter: Arc<RequestLimiter>, every: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let before = limiter.tracked_clients();
                limiter.retain_recent();
                tracing::trace!(before, after = limiter.tracked_clients(), "swept idle rate limit clients");
            }
        }
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
        && let Ok(ip) = first.trim().parse()
    {
        return Some(ip);
    }

    if let Some(real_ip) = request.headers().get("x-real-ip")
        && let Ok(val) = real_ip.to_str()
        && let Ok(ip) = val.trim().parse()
    {
        return Some(ip);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn insert_usage(headers: &mut HeaderMap, usage: &Usage) {
    headers.insert(LIMIT.clone(), HeaderValue::from(usage.limit));
    headers.insert(REMAINING.clone(), HeaderValue::from(usage.remaining));
    headers.insert(RESET.clone(), HeaderValue::from(usage.reset_secs()));
}

fn rate_limit_response(error: &RateLimitError) -> Response {
    match error {
        RateLimitError::Exceeded { limit, .. } => {
            let retry_after = error.retry_after_secs().unwrap_or(1);
            let failure = Failure::status(
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded, retry in {retry_after} seconds"),
            );

            let mut response = ApiError(failure).into_response();
            let headers = response.headers_mut();
            headers.insert(LIMIT.clone(), HeaderValue::from(*limit));
            headers.insert(REMAINING.clone(), HeaderValue::from(0_u32));
            headers.insert(RESET.clone(), HeaderValue::from(retry_after));
            headers.insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
        RateLimitError::Config(_) => ApiError(Failure::unclassified(error.clone())).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use keel_config::{RateLimitConfig, RequestRateLimit};

    use super::*;

    #[tokio::test]
    async fn sweeper_drops_idle_clients_until_shutdown() {
        let limiter = Arc::new(
            RequestLimiter::new(&RateLimitConfig {
                global: None,
                per_ip: Some(RequestRateLimit {
                    requests: 1,
                    window: "20ms".to_string(),
                }),
            })
            .unwrap(),
        );
        for last in 1..=10 {
            limiter.check(Some(IpAddr::from([198, 51, 100, last]))).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), 10);

        let shutdown = CancellationToken::new();
        let sweeper = tokio::spawn(sweep_idle_clients(
            Arc::clone(&limiter),
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper should stop on shutdown")
            .unwrap();
    }
}
