//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter directive for the configured level. `verbose` forces debug for this crate.
#[must_use]
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        format!("{},tripsmith=debug", config.level)
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the config.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(config, verbose)))
        .map_err(|e| anyhow!("Invalid log filter: {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.format == "json" {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(false).try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        };
        assert_eq!(filter_directive(&config, false), "warn");
        assert_eq!(filter_directive(&config, true), "warn,tripsmith=debug");
    }
}
