//! Logging initialization
//!
//! Installs a `tracing` fmt subscriber. `RUST_LOG` takes precedence over the
//! configured level so a single run can be made more verbose without editing
//! the config file.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// # Arguments
/// * `default_level` - Filter directive used when `RUST_LOG` is not set (`info`, `fclcore=debug`, ...)
///
/// # Returns
/// * `Ok(())` - Subscriber installed
/// * `Err(anyhow::Error)` - Invalid directive, or a subscriber was already installed
pub fn init_logger(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", default_level, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
