//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use keel_config::{Config, CorsConfig, ProbeConfig, RateLimitConfig, RequestRateLimit, ServerConfig};
use keel_core::Environment;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults in the test environment
    pub fn new() -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        config.app.name = "keel-test".to_owned();
        config.app.version = "9.9.9".to_owned();
        config.app.environment = Environment::Test;

        Self { config }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.config.app.environment = environment;
        self
    }

    /// Add a TCP probe against `address`
    pub fn with_tcp_probe(mut self, name: &str, address: SocketAddr) -> Self {
        self.config.server.health.probes.insert(
            name.to_owned(),
            ProbeConfig::Tcp {
                address: address.to_string(),
                connect_timeout: "500ms".to_owned(),
            },
        );
        self
    }

    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: &str) -> Self {
        self.config.server.health.probe_timeout = timeout.to_owned();
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Limit each client IP to `requests` per minute
    pub fn with_per_ip_limit(mut self, requests: u32) -> Self {
        self.config.server.rate_limit = Some(RateLimitConfig {
            global: None,
            per_ip: Some(RequestRateLimit {
                requests,
                window: "1m".to_owned(),
            }),
        });
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
