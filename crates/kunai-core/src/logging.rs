use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// ## Summary
/// Builds the log filter for the configured level, falling back to `info`
/// with a warning when the level string is not a valid filter.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(config.level.as_str()).unwrap_or_else(|e| {
        tracing::warn!(level = %config.level, error = %e, "Invalid log level in config, using info");
        EnvFilter::new("info")
    })
}

/// ## Summary
/// Installs a global `fmt` subscriber filtered by the configured level.
///
/// ## Errors
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_target(true))
        .try_init()?;

    tracing::debug!(level = %config.level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_from_level() {
        let config = LoggingConfig {
            level: "kunai_rfc=trace,warn".to_string(),
        };
        let filter = env_filter(&config);
        assert!(filter.to_string().contains("kunai_rfc=trace"));
    }

    #[test]
    fn test_init_logging_installs_once() {
        let config = LoggingConfig {
            level: "debug".to_string(),
        };
        // Another test may already own the global subscriber.
        let _first = init_logging(&config);
        assert!(tracing::dispatcher::has_been_set());
        assert!(init_logging(&config).is_err());
    }
}
