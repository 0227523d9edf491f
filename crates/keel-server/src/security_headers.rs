use http::{HeaderName, HeaderValue};
use keel_config::SecurityHeadersConfig;
use keel_core::Environment;

/// Hardening headers for every response, in the order they are applied
///
/// Handlers that set one of these themselves keep their value.
///
/// # Errors
///
/// Returns an error if the configured content security policy is not a
/// valid header value
pub fn security_headers(
    config: &SecurityHeadersConfig,
    environment: Environment,
) -> anyhow::Result<Vec<(HeaderName, HeaderValue)>> {
    if !config.enabled {
        return Ok(Vec::new());
    }

    let csp = HeaderValue::from_str(&config.content_security_policy)
        .map_err(|e| anyhow::anyhow!("invalid content security policy: {e}"))?;

    let mut headers = vec![
        (http::header::CONTENT_SECURITY_POLICY, csp),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (HeaderName::from_static("origin-agent-cluster"), HeaderValue::from_static("?1")),
        (http::header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (http::header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (HeaderName::from_static("x-download-options"), HeaderValue::from_static("noopen")),
        (http::header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ),
        (http::header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ];

    // HSTS over plain-HTTP development servers pins browsers to https
    if environment.is_production() {
        let hsts = HeaderValue::from_str(&format!("max-age={}; includeSubDomains", config.hsts_max_age))
            .map_err(|e| anyhow::anyhow!("invalid hsts max age: {e}"))?;
        headers.push((http::header::STRICT_TRANSPORT_SECURITY, hsts));
    }

    Ok(headers)
}
