//! Tracing subscriber setup

use crate::config::LogConfig;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding `LogConfig::level`
pub const LOG_ENV: &str = "GEOSEARCH_LOG";

/// Install a global fmt subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) {
    static START: Once = Once::new();

    START.call_once(|| {
        let filter = match EnvFilter::try_from_env(LOG_ENV) {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .with_writer(std::io::stderr)
            .try_init();

        // Another subscriber may already be installed by the embedding process
        if let Err(e) = result {
            tracing::debug!("tracing subscriber not installed: {}", e);
        }
    });
}
