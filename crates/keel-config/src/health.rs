use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::parse_duration;

/// Health check endpoint and dependency probes
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_path")]
    pub path: String,
    /// Per-probe timeout (e.g. "5s"), or "off" to wait indefinitely
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,
    /// Dependency probes keyed by the name reported in `services`
    #[serde(default)]
    pub probes: BTreeMap<String, ProbeConfig>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_path(),
            probe_timeout: default_probe_timeout(),
            probes: BTreeMap::new(),
        }
    }
}

impl HealthConfig {
    /// Parsed per-probe timeout; `None` when disabled
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a valid duration
    pub fn probe_timeout(&self) -> anyhow::Result<Option<Duration>> {
        if self.probe_timeout.eq_ignore_ascii_case("off") {
            return Ok(None);
        }

        parse_duration("server.health.probe_timeout", &self.probe_timeout).map(Some)
    }
}

/// A dependency check declared in configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ProbeConfig {
    /// TCP reachability check against `host:port`
    Tcp {
        address: String,
        #[serde(default = "default_connect_timeout")]
        connect_timeout: String,
    },
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_path() -> String {
    "/v1/health".to_string()
}

fn default_probe_timeout() -> String {
    "5s".to_string()
}

fn default_connect_timeout() -> String {
    "2s".to_string()
}
