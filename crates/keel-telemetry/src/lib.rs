//! Logging for Keel
//!
//! Installs a `tracing-subscriber` formatter: human-readable output while
//! developing, newline-delimited JSON everywhere else.

use keel_config::{LogFormat, TelemetryConfig};
use keel_core::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber
///
/// The filter comes from `RUST_LOG` when set, then from the configured
/// `log_filter`, then from the environment default.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed
pub fn init(config: &TelemetryConfig, environment: Environment) -> anyhow::Result<()> {
    let filter = build_filter(config, environment)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match resolve_format(config.format, environment) {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_target(true);
            registry.with(fmt_layer).try_init()
        }
        LogFormat::Pretty | LogFormat::Auto => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            registry.with(fmt_layer).try_init()
        }
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Concrete format for `Auto`
pub const fn resolve_format(format: LogFormat, environment: Environment) -> LogFormat {
    match (format, environment) {
        (LogFormat::Auto, Environment::Development) => LogFormat::Pretty,
        (LogFormat::Auto, _) => LogFormat::Json,
        (explicit, _) => explicit,
    }
}

/// Filter used when neither `RUST_LOG` nor `log_filter` is set
pub const fn default_directive(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "debug",
        Environment::Test => "warn",
        Environment::Production => "info",
    }
}

fn build_filter(config: &TelemetryConfig, environment: Environment) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = config
        .log_filter
        .as_deref()
        .unwrap_or_else(|| default_directive(environment));

    EnvFilter::try_new(directive).map_err(|e| anyhow::anyhow!("invalid log filter '{directive}': {e}"))
}
