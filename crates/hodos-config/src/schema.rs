//! Configuration schema types.
//!
//! Every section rejects unknown fields so a typo in a route entry fails at
//! load time instead of silently producing a different route.

use hodos_telemetry::LogConfig;
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ConfigError;

/// Root configuration.
///
/// # Example
///
/// ```
/// use hodos_config::HodosConfig;
///
/// let config = HodosConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(config.routing.routes.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HodosConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Routes, middleware and scopes.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl HodosConfig {
    /// Development preset: pretty debug logs with colours and source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config
    }

    /// Validate the configuration.
    ///
    /// Checks that the log level parses, every route template is non-empty
    /// and rooted, explicit route names are unique, HTTP methods are valid,
    /// middleware names are unique and every scope references declared
    /// middleware.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging
            .to_log_config()
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        self.routing.validate()
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts to the settings `hodos_telemetry::init_logging` takes.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ansi: self.ansi_enabled,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Routing section: global extensions, routes, middleware and scopes.
///
/// ```toml
/// [routing]
/// extensions = ["json"]
///
/// [[routing.routes]]
/// template = "/articles/:id"
/// name = "article"
/// defaults = { controller = "Articles", action = "view" }
/// patterns = { id = "[0-9]+" }
/// pass = ["id"]
///
/// [[routing.middleware]]
/// name = "auth"
/// handler = "session_auth"
///
/// [[routing.scopes]]
/// path = "/admin"
/// middleware = ["auth"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Extensions accepted by routes that declare none of their own.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Routes, connected in order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Middleware to register, by name.
    #[serde(default)]
    pub middleware: Vec<MiddlewareConfig>,

    /// Path scopes, enabled in order.
    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,
}

impl RoutingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for (i, route) in self.routes.iter().enumerate() {
            let field = format!("routing.routes[{i}]");
            if route.template.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("{field}.template"),
                    "must not be empty",
                ));
            }
            if !route.template.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    format!("{field}.template"),
                    format!("must start with '/': {}", route.template),
                ));
            }
            if let Some(name) = &route.name {
                if !names.insert(name.as_str()) {
                    return Err(ConfigError::validation_error(format!(
                        "route name \"{name}\" is used more than once"
                    )));
                }
            }
            route.parsed_methods().map_err(|method| {
                ConfigError::invalid_value(format!("{field}.methods"), format!("invalid HTTP method: {method}"))
            })?;
        }

        let mut declared = HashSet::new();
        for entry in &self.middleware {
            if !declared.insert(entry.name.as_str()) {
                return Err(ConfigError::validation_error(format!(
                    "middleware \"{}\" is declared more than once",
                    entry.name
                )));
            }
        }

        for (i, scope) in self.scopes.iter().enumerate() {
            if scope.path.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("routing.scopes[{i}].path"),
                    "must not be empty",
                ));
            }
            if let Some(missing) = scope.middleware.iter().find(|name| !declared.contains(name.as_str())) {
                return Err(ConfigError::validation_error(format!(
                    "scope \"{}\" references undeclared middleware \"{missing}\"",
                    scope.path
                )));
            }
        }

        Ok(())
    }
}

/// A single route entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Route template, e.g. `/articles/:id/*`.
    pub template: String,

    /// Explicit route name.
    #[serde(default)]
    pub name: Option<String>,

    /// Default parameter values.
    #[serde(default)]
    pub defaults: IndexMap<String, String>,

    /// Regex constraints per route element.
    #[serde(default)]
    pub patterns: IndexMap<String, String>,

    /// Elements passed positionally.
    #[serde(default)]
    pub pass: Vec<String>,

    /// Parameters carried over from the current request when generating URLs.
    #[serde(default)]
    pub persist: Vec<String>,

    /// Accepted extensions; empty inherits `routing.extensions`.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Accepted HTTP methods; empty accepts any.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Host pattern, `*` matching any run of characters.
    #[serde(default)]
    pub host: Option<String>,
}

impl RouteConfig {
    /// Parses `methods`, returning the first invalid entry on failure.
    pub(crate) fn parsed_methods(&self) -> Result<Vec<Method>, String> {
        self.methods
            .iter()
            .map(|m| Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|_| m.clone()))
            .collect()
    }
}

/// Binds a middleware name to a handler id from a
/// [`MiddlewareCatalog`](crate::MiddlewareCatalog).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareConfig {
    /// Name used by scopes.
    pub name: String,

    /// Catalog handler id.
    pub handler: String,
}

/// Middleware applied to every path starting with `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    /// Path prefix; `:name` placeholders match one segment.
    pub path: String,

    /// Middleware names, in order.
    #[serde(default)]
    pub middleware: Vec<String>,
}
