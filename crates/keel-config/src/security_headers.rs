use serde::Deserialize;

/// Hardening headers added to every response
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityHeadersConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Value of `content-security-policy`
    #[serde(default = "default_content_security_policy")]
    pub content_security_policy: String,
    /// `max-age` of `strict-transport-security`, sent in production only
    #[serde(default = "default_hsts_max_age")]
    pub hsts_max_age: u64,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_security_policy: default_content_security_policy(),
            hsts_max_age: default_hsts_max_age(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_content_security_policy() -> String {
    [
        "default-src 'self'",
        "style-src 'self' 'unsafe-inline'",
        "script-src 'self'",
        "img-src 'self' data: https:",
        "connect-src 'self'",
        "font-src 'self'",
        "object-src 'none'",
        "media-src 'self'",
        "frame-src 'none'",
    ]
    .join("; ")
}

const fn default_hsts_max_age() -> u64 {
    31_536_000
}
