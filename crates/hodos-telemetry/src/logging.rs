//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
//! single formatting layer. JSON output is the default; development builds
//! switch to the pretty format with span events and source locations.
//!
//! # Example
//!
//! ```rust,no_run
//! use hodos_telemetry::logging::{fields, init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::debug!(url = "/posts/view/5", template = "/:controller/:action/*", "matched route");
//! # Ok::<(), hodos_telemetry::TelemetryError>(())
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `hodos_router=trace,info`.
    pub level: String,

    /// Emit one JSON object per event instead of the pretty format.
    pub json_format: bool,

    /// Emit span open/close events.
    pub span_events: bool,

    /// Include source file and line.
    pub file_line_info: bool,

    /// Include thread IDs.
    pub thread_ids: bool,

    /// Include the event target (module path).
    pub include_target: bool,

    /// Colourise output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable output at `debug`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            ansi: true,
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            ansi: false,
        }
    }

    /// Checks the filter directive without installing anything.
    pub fn validate(&self) -> TelemetryResult<()> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log level {:?}: {e}", self.level)))
    }
}

/// Installs the global subscriber described by `config`.
///
/// A disabled config is a no-op. Fails if the level does not parse or a
/// global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level: {e}")))?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_ansi(config.ansi)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_ansi(config.ansi)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::debug!(level = %config.level, json = config.json_format, "logging initialized");
    Ok(())
}

/// Parses a filter directive string such as `hodos_router=trace,warn`.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Field names used in routing log events.
pub mod fields {
    /// Incoming URL being parsed.
    pub const URL: &str = "url";

    /// Request path after decoding.
    pub const PATH: &str = "path";

    /// HTTP method.
    pub const METHOD: &str = "method";

    /// Route template, e.g. `/articles/:id`.
    pub const TEMPLATE: &str = "template";

    /// Derived route key, e.g. `articles:view`.
    pub const KEY: &str = "key";

    /// Explicit route name.
    pub const NAME: &str = "name";

    /// Registered middleware name.
    pub const MIDDLEWARE: &str = "middleware";

    /// Per-request identifier.
    pub const REQUEST_ID: &str = "request_id";
}
