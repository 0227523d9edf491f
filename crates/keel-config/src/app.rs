use keel_core::Environment;
use serde::Deserialize;

/// Application identity reported by the health endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Service name
    #[serde(default = "default_name")]
    pub name: String,
    /// Service version
    #[serde(default = "default_version")]
    pub version: String,
    /// Deployment mode, controls error detail disclosure
    #[serde(default)]
    pub environment: Environment,
    /// IANA timezone name the process runs in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            environment: Environment::default(),
            timezone: default_timezone(),
        }
    }
}

fn default_name() -> String {
    "keel".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}
