use std::net::SocketAddr;

use keel_core::Environment;

use crate::Config;

/// Process environment variables that override the configuration file
pub const ENVIRONMENT_VAR: &str = "KEEL_ENV";
pub const TIMEZONE_VAR: &str = "TZ";
pub const PORT_VAR: &str = "PORT";
pub const LISTEN_VAR: &str = "KEEL_LISTEN";

/// Apply environment overrides on top of the parsed file
///
/// `KEEL_LISTEN` wins over `PORT`; `PORT` only replaces the port of the
/// configured (or default) listen address.
pub fn apply_overrides(config: &mut Config) -> anyhow::Result<()> {
    if let Some(value) = read(ENVIRONMENT_VAR) {
        config.app.environment = value
            .parse::<Environment>()
            .map_err(|e| anyhow::anyhow!("{ENVIRONMENT_VAR}: {e}"))?;
    }

    if let Some(value) = read(TIMEZONE_VAR) {
        config.app.timezone = value;
    }

    if let Some(value) = read(PORT_VAR) {
        let port: u16 = value
            .parse()
            .map_err(|e| anyhow::anyhow!("{PORT_VAR} must be a port number, got '{value}': {e}"))?;
        let mut address = config.server.listen_address();
        address.set_port(port);
        config.server.listen_address = Some(address);
    }

    if let Some(value) = read(LISTEN_VAR) {
        let address: SocketAddr = value
            .parse()
            .map_err(|e| anyhow::anyhow!("{LISTEN_VAR} must be a socket address, got '{value}': {e}"))?;
        config.server.listen_address = Some(address);
    }

    Ok(())
}

fn read(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
