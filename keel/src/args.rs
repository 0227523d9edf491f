use std::path::PathBuf;

use clap::Parser;

/// Keel HTTP service
#[derive(Debug, Parser)]
#[command(name = "keel", about = "HTTP service with uniform error responses and dependency health checks")]
pub struct Args {
    /// Path to configuration file; a missing file means defaults
    #[arg(short, long, default_value = "keel.toml", env = "KEEL_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long)]
    pub listen: Option<std::net::SocketAddr>,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check: bool,
}
