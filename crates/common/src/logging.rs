//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber, writing to stderr.
///
/// `verbose` forces `debug`. Otherwise `RUST_LOG` wins over the configured
/// level. Returns `false` when a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> bool {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    // stdout may be carrying actuator commands or a JSON summary.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        let config = LoggingConfig::default();
        init_logging(&config, false);
        assert!(!init_logging(&config, true));
    }
}
