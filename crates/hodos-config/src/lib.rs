//! Typed configuration for Hodos.
//!
//! Loads logging settings and a declarative route table from TOML or JSON,
//! applies environment overrides, validates, and builds a
//! [`RouteCollection`](hodos_router::RouteCollection).
//!
//! # Example
//!
//! ```no_run
//! use hodos_config::{build_routes, ConfigLoader, MiddlewareCatalog};
//!
//! # fn main() -> Result<(), hodos_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("routes.toml")?
//!     .with_env_prefix("HODOS")
//!     .load()?;
//!
//! hodos_telemetry::init_logging(&config.logging.to_log_config()).ok();
//! let routes = build_routes(&config.routing, &MiddlewareCatalog::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [routing]
//! extensions = ["json"]
//!
//! [[routing.routes]]
//! template = "/articles/:id"
//! name = "article"
//! defaults = { controller = "Articles", action = "view" }
//! patterns = { id = "[0-9]+" }
//!
//! [[routing.routes]]
//! template = "/:controller/:action/*"
//!
//! [[routing.middleware]]
//! name = "auth"
//! handler = "session_auth"
//!
//! [[routing.scopes]]
//! path = "/admin"
//! middleware = ["auth"]
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HODOS__LOGGING__ENABLED`, `HODOS__LOGGING__LEVEL`, `HODOS__LOGGING__FORMAT`
//! - `HODOS__LOGGING__ANSI_ENABLED`, `HODOS__LOGGING__INCLUDE_LOCATION`
//! - `HODOS__ROUTING__EXTENSIONS` (comma separated)

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
mod routes;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use routes::{build_routes, MiddlewareCatalog};
pub use schema::{
    HodosConfig, LogFormat, LoggingConfig, MiddlewareConfig, RouteConfig, RoutingConfig,
    ScopeConfig,
};
