//! Structured logging for Hodos.
//!
//! The router crates emit `tracing` events; this crate installs the
//! subscriber that renders them. Production deployments get one JSON object
//! per line, development gets the pretty multi-line format.
//!
//! # Example
//!
//! ```rust,no_run
//! use hodos_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).unwrap();
//!
//! tracing::info!(url = "/articles/view/5", "routed request");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
