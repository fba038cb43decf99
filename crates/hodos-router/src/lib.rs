//! Route collection for Hodos.
//!
//! This crate indexes connected routes for both routing directions:
//!
//! - **Parse**: URL or request → [`Params`], probing routes by static path
//!   prefix, longest first.
//! - **Reverse match**: [`Params`] → URL, by explicit `_name` or by derived
//!   [`RouteKey`] candidates, most specific first.
//!
//! It also resolves which named middleware apply to a path. The collection
//! never invokes middleware; it hands the ordered list to a
//! [`MiddlewareQueue`](hodos_middleware::MiddlewareQueue).
//!
//! # Example
//!
//! ```rust
//! use hodos_router::{Params, RouteCollection, RouteOptions, TemplateRoute, UrlContext};
//!
//! let mut routes = RouteCollection::new();
//! routes
//!     .add(
//!         TemplateRoute::builder("/:controller/:action/*").build().unwrap(),
//!         RouteOptions::default(),
//!     )
//!     .unwrap();
//!
//! let parsed = routes.parse("/posts/view/5", None).unwrap();
//! assert_eq!(parsed.get_str("controller"), Some("posts"));
//! assert_eq!(parsed.pass(), ["5".to_string()]);
//!
//! let params: Params = [("controller", "posts"), ("action", "index")].into_iter().collect();
//! assert_eq!(routes.match_params(&params, &UrlContext::new()).unwrap(), "posts/index");
//! ```
//!
//! # Architecture
//!
//! ```text
//!   add(route) ──┬──► paths        (static prefix → routes)   ──► parse / parse_request
//!                ├──► route_table  (RouteKey → routes)        ──► match_params
//!                └──► named        (name → route)             ──► match_params(_name)
//!
//!   register_middleware ──► registry ◄── enable_middleware(path)  ──► matching_middleware
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collection;
mod context;
mod error;
pub mod key;
pub mod middleware;
mod params;
pub mod query;
mod request;
mod route;
mod shared;
mod template;

pub use collection::{RouteCollection, RouteOptions};
pub use context::UrlContext;
pub use error::{MissingRoute, RoutingError, RoutingResult};
pub use key::{candidate_keys, RouteKey, Segment};
pub use middleware::{MiddlewareHandler, MiddlewareRegistry};
pub use params::{keys, ParamValue, Params};
pub use request::RoutableRequest;
pub use route::{Route, SharedRoute};
pub use shared::SharedRoutes;
pub use template::{TemplateRoute, TemplateRouteBuilder};
