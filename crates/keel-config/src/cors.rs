use std::time::Duration;

use serde::Deserialize;

use crate::parse_duration;

/// CORS configuration
///
/// A list containing `"*"` allows any value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins
    #[serde(default = "wildcard")]
    pub origins: Vec<String>,
    /// Allowed HTTP methods
    #[serde(default = "wildcard")]
    pub methods: Vec<String>,
    /// Allowed request headers
    #[serde(default = "wildcard")]
    pub headers: Vec<String>,
    /// Allow credentials; incompatible with wildcard origins
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime (e.g. "10m")
    #[serde(default)]
    pub max_age: Option<String>,
}

impl CorsConfig {
    /// Whether a list accepts any value
    pub fn is_wildcard(values: &[String]) -> bool {
        values.iter().any(|v| v == "*")
    }

    /// Parsed preflight max age
    ///
    /// # Errors
    ///
    /// Returns an error if `max_age` is not a valid duration
    pub fn max_age(&self) -> anyhow::Result<Option<Duration>> {
        self.max_age
            .as_deref()
            .map(|value| parse_duration("server.cors.max_age", value))
            .transpose()
    }
}

fn wildcard() -> Vec<String> {
    vec!["*".to_string()]
}
