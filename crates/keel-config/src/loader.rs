use std::io::ErrorKind;
use std::path::Path;

use crate::{Config, CorsConfig, ProbeConfig, RequestRateLimit, parse_duration};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the file, applies environment overrides (`KEEL_ENV`, `TZ`,
    /// `PORT`, `KEEL_LISTEN`), then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, an
    /// override is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or is invalid
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_toml(""),
            Err(e) => Err(anyhow::anyhow!("failed to read config file {}: {e}", path.display())),
        }
    }

    /// Parse configuration from TOML text, then apply overrides and validate
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, overrides or validation fail
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        crate::env::apply_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_app()?;
        self.validate_health()?;
        self.validate_rate_limit()?;
        self.validate_cors()?;
        Ok(())
    }

    fn validate_app(&self) -> anyhow::Result<()> {
        if self.app.name.trim().is_empty() {
            anyhow::bail!("app.name must not be empty");
        }

        if self.app.timezone.trim().is_empty() {
            anyhow::bail!("app.timezone must not be empty");
        }

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }

        health.probe_timeout()?;

        for (name, probe) in &health.probes {
            if name.trim().is_empty() {
                anyhow::bail!("health probe names must not be empty");
            }

            match probe {
                ProbeConfig::Tcp {
                    address,
                    connect_timeout,
                } => {
                    if address.trim().is_empty() {
                        anyhow::bail!("health probe '{name}' requires an address");
                    }
                    parse_duration(&format!("health probe '{name}' connect_timeout"), connect_timeout)?;
                }
            }
        }

        Ok(())
    }

    fn validate_rate_limit(&self) -> anyhow::Result<()> {
        let Some(ref rate_limit) = self.server.rate_limit else {
            return Ok(());
        };

        let limits = [("global", rate_limit.global.as_ref()), ("per_ip", rate_limit.per_ip.as_ref())];
        for (scope, limit) in limits {
            if let Some(limit) = limit {
                validate_request_limit(scope, limit)?;
            }
        }

        Ok(())
    }

    fn validate_cors(&self) -> anyhow::Result<()> {
        let Some(ref cors) = self.server.cors else {
            return Ok(());
        };

        if cors.credentials && CorsConfig::is_wildcard(&cors.origins) {
            anyhow::bail!("server.cors.credentials cannot be combined with wildcard origins");
        }

        cors.max_age()?;

        Ok(())
    }
}

fn validate_request_limit(scope: &str, limit: &RequestRateLimit) -> anyhow::Result<()> {
    if limit.requests == 0 {
        anyhow::bail!("server.rate_limit.{scope}.requests must be greater than 0");
    }

    let window = limit.window()?;
    if window.is_zero() {
        anyhow::bail!("server.rate_limit.{scope}.window must be greater than 0");
    }

    Ok(())
}
