//! Logging setup for the binaries.

use crate::infra::config;

/// Installs a `fmt` subscriber at the level from `LOG_LEVEL`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() -> anyhow::Result<()> {
    let level = config::log_level()?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    Ok(())
}
