//! # Hodos Middleware
//!
//! Middleware contract and queue runner for Hodos.
//!
//! The route collection in `hodos-router` never invokes middleware. It only
//! resolves, for a given request path, the ordered list of handlers whose
//! scopes match. This crate defines what those handlers are and how an
//! external dispatcher runs them.
//!
//! ## Flow
//!
//! ```text
//! path ──► RouteCollection::matching_middleware ──► [auth, csrf, cors]
//!                                                        │
//!                      MiddlewareQueue::run ◄────────────┘
//!                              │
//! Request → auth → csrf → cors → endpoint
//!                                   ↓
//! Response ← auth ← csrf ← cors ←───┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use hodos_middleware::{BoxedMiddleware, FnMiddleware, MiddlewareQueue};
//!
//! let timing: BoxedMiddleware = Arc::new(FnMiddleware::new("timing", |ctx, req, next| {
//!     Box::pin(async move { next.run(ctx, req).await })
//! }));
//!
//! let queue = MiddlewareQueue::new(vec![timing]);
//! assert_eq!(queue.names(), vec!["timing"]);
//! ```

#![doc(html_root_url = "https://docs.rs/hodos-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod queue;
pub mod types;

pub use context::{MiddlewareContext, RequestId};
pub use middleware::{BoxFuture, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use queue::MiddlewareQueue;
pub use types::{Request, Response, ResponseExt};
