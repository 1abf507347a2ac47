//! Structured logging setup
//!
//! Initialization and configuration for `tracing`-based logging. Build
//! commands and captured tool output go to stdout through the engine's
//! output sink; diagnostics go to stderr through this subscriber so the
//! two streams stay separable.
//!
//! # Example
//!
//! ```no_run
//! use incremake::util::logging;
//!
//! logging::init_default();
//!
//! use tracing::{debug, info};
//! info!("runner started");
//! debug!(module = "LedDriver", "building module");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Controls subscriber behavior
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Include the module target (e.g. `incremake::engine`) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Configuration with the given minimum level
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Initializes the global subscriber from a [`LoggingConfig`]
///
/// Subsequent calls are no-ops; the first configuration wins.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter.add_directive(
                format!("incremake={}", config.level)
                    .parse()
                    .expect("static directive is well-formed"),
            );
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(config.include_target)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_writer(std::io::stderr),
            )
            .init();
    });
}

/// Initializes logging with defaults (INFO level)
pub fn init_default() {
    init_logging(&LoggingConfig::default());
}

/// Initializes logging from `INCREMAKE_LOG_LEVEL` (and `RUST_LOG`)
pub fn init_from_env() {
    let level = env::var("INCREMAKE_LOG_LEVEL")
        .ok()
        .and_then(|value| parse_level(&value))
        .unwrap_or(Level::INFO);
    init_logging(&LoggingConfig::with_level(level));
}

/// Parses a level name, returning `None` for unknown values
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
