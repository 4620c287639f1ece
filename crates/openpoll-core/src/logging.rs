//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::logging::LoggingConfig;

/// Initializes the global tracing subscriber from configuration.
///
/// `RUST_LOG` overrides the configured level when set. Call once at
/// application startup; a second call returns an error from the
/// subscriber, which is ignored (tests initialize independently).
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber was already initialized");
    }
}
