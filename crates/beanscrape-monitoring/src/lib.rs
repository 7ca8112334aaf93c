//! Structured logging for the beanscrape tools.
//!
//! Both binaries call [`init_logging`] once at startup. Output goes to
//! stderr, either as human-readable lines or as JSON for log aggregation.

use anyhow::Context;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for initializing logging
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,beanscrape_fetch=debug")
    pub log_filter: String,
    /// Emit JSON lines instead of pretty output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "beanscrape".to_string(),
            log_filter: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Build a config for `service_name`, reading `LOG_FILTER` and `LOG_FORMAT`
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let mut config = Self {
            service_name: service_name.into(),
            ..Self::default()
        };

        if let Ok(filter) = env::var("LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.json = format.eq_ignore_ascii_case("json");
        }

        config
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`LoggingConfig::log_filter`] when set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
    });

    let pretty_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = if config.json { "json" } else { "pretty" },
        "Logging initialized"
    );

    Ok(())
}

/// Logs a result on its way through a `?` chain
pub trait LogExt<T, E> {
    /// Emit `message` and the error at `error` level when `self` is `Err`
    fn log_err(self, message: &str) -> Result<T, E>;

    /// Emit `message` at `info` level when `self` is `Ok`
    fn log_ok(self, message: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_err(self, message: &str) -> Result<T, E> {
        if let Err(e) = &self {
            error!(error = %e, "{}", message);
        }
        self
    }

    fn log_ok(self, message: &str) -> Result<T, E> {
        if self.is_ok() {
            info!("{}", message);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.service_name, "beanscrape");
        assert_eq!(config.log_filter, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_log_ext_passes_results_through() {
        let ok: Result<u32, String> = Ok(7);
        assert_eq!(ok.log_ok("done").log_err("failed"), Ok(7));

        let err: Result<u32, String> = Err("boom".to_string());
        assert_eq!(err.log_err("failed"), Err("boom".to_string()));
    }
}
