//! Logging setup for the command-line tool.

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber that writes to stderr, so that
/// stdout only carries command output. `RUST_LOG` takes precedence over
/// `level`.
pub fn init(level: LevelFilter) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))
}

/// Parses a `--log-level` value such as `info` or `debug`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("invalid log level `{}`", level))
}
