use http::Method;
use http::header::HeaderName;
use keel_config::CorsConfig;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build a Tower CORS layer from configuration
///
/// With credentials enabled, wildcard methods and headers are answered by
/// mirroring the preflight request, since browsers reject a literal `*`
/// alongside `Access-Control-Allow-Credentials`.
///
/// # Errors
///
/// Returns an error if credentials are combined with wildcard origins or
/// `max_age` is not a valid duration
pub fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let mut layer = CorsLayer::new();

    layer = if CorsConfig::is_wildcard(&config.origins) {
        if config.credentials {
            anyhow::bail!("server.cors.credentials cannot be combined with wildcard origins");
        }
        layer.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<_> = config.origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    };

    layer = match (CorsConfig::is_wildcard(&config.methods), config.credentials) {
        (true, true) => layer.allow_methods(AllowMethods::mirror_request()),
        (true, false) => layer.allow_methods(AllowMethods::any()),
        (false, _) => {
            let methods: Vec<Method> = config.methods.iter().filter_map(|m| m.parse().ok()).collect();
            layer.allow_methods(methods)
        }
    };

    layer = match (CorsConfig::is_wildcard(&config.headers), config.credentials) {
        (true, true) => layer.allow_headers(AllowHeaders::mirror_request()),
        (true, false) => layer.allow_headers(AllowHeaders::any()),
        (false, _) => {
            let headers: Vec<HeaderName> = config.headers.iter().filter_map(|h| h.parse().ok()).collect();
            layer.allow_headers(headers)
        }
    };

    // Clients read these on both success and error responses
    layer = layer.expose_headers([
        HeaderName::from_static("x-request-id"),
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderName::from_static("retry-after"),
    ]);

    if config.credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(duration) = config.max_age()? {
        layer = layer.max_age(duration);
    }

    Ok(layer)
}
