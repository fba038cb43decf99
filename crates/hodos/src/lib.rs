//! # Hodos
//!
//! **Bidirectional URL routing with scoped middleware**
//!
//! - **Parse** – turn a URL or request into routing parameters
//! - **Reverse match** – turn parameters back into a URL, by route name or
//!   by controller/action convention
//! - **Middleware scopes** – resolve which named middleware apply to a path
//!
//! ## Quick Start
//!
//! ```rust
//! use hodos::prelude::*;
//!
//! let mut routes = RouteCollection::new();
//! routes
//!     .add(
//!         TemplateRoute::builder("/articles/:id")
//!             .default("controller", "Articles")
//!             .default("action", "view")
//!             .pattern("id", "[0-9]+")
//!             .build()
//!             .unwrap(),
//!         RouteOptions::named("article"),
//!     )
//!     .unwrap();
//!
//! let params = routes.parse("/articles/5", None).unwrap();
//! assert_eq!(params.get_str("id"), Some("5"));
//!
//! let link: Params = [("_name", "article"), ("id", "9")].into_iter().collect();
//! assert_eq!(routes.match_params(&link, &UrlContext::new()).unwrap(), "/articles/9");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! routes.toml ─► hodos-config ─► RouteCollection ─► SharedRoutes (hot swap)
//!                                      │
//!          request ─► parse_request ───┤──► Params
//!                                      └──► matching_middleware ─► MiddlewareQueue ─► endpoint
//! ```

#![doc(html_root_url = "https://docs.rs/hodos/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export router types
pub use hodos_router as router;

// Re-export middleware types
pub use hodos_middleware as middleware;

// Re-export configuration types
pub use hodos_config as config;

// Re-export logging setup
pub use hodos_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hodos::prelude::*;
/// ```
pub mod prelude {
    pub use hodos_router::{
        keys, MissingRoute, ParamValue, Params, RoutableRequest, Route, RouteCollection,
        RouteOptions, RoutingError, RoutingResult, SharedRoute, SharedRoutes, TemplateRoute,
        UrlContext,
    };

    pub use hodos_middleware::{
        BoxedMiddleware, FnMiddleware, Middleware, MiddlewareContext, MiddlewareQueue, Next,
        RequestId, ResponseExt,
    };

    pub use hodos_config::{build_routes, ConfigError, ConfigLoader, HodosConfig, MiddlewareCatalog};

    pub use hodos_telemetry::{init_logging, LogConfig};
}
