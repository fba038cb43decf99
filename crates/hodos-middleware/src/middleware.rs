//! Core middleware trait and continuation types.
//!
//! A [`Middleware`] receives the mutable [`MiddlewareContext`], the request,
//! and a [`Next`] continuation. Calling `next.run()` hands the request to the
//! rest of the queue; returning without calling it short-circuits.
//!
//! # Example
//!
//! ```
//! use hodos_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//!
//! struct Audit;
//!
//! impl Middleware for Audit {
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             tracing::info!(request_id = %ctx.request_id(), "audit");
//!             next.run(ctx, request).await
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shareable, type-erased middleware handler.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The middleware contract.
///
/// # Invariants
///
/// - `next.run()` is called at most once (it consumes `next`)
/// - Not calling `next.run()` short-circuits the rest of the queue
pub trait Middleware: Send + Sync + 'static {
    /// Returns a short name used in logs.
    fn name(&self) -> &str;

    /// Processes the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

impl fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").field("name", &self.name()).finish()
    }
}

/// Terminal handler invoked once every middleware has passed the request on.
pub(crate) type Endpoint<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// Continuation that invokes the rest of the queue.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(Endpoint<'a>),
}

impl<'a> Next<'a> {
    /// Creates a continuation that runs `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation.
    pub(crate) fn endpoint<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Endpoint(Box::new(f)),
        }
    }

    /// Invokes the next middleware, or the endpoint at the end of the queue.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                tracing::trace!(middleware = middleware.name(), "entering middleware");
                middleware.process(ctx, request, *next).await
            }
            NextInner::Endpoint(endpoint) => endpoint(ctx, request).await,
        }
    }
}

/// A middleware built from a closure.
///
/// # Example
///
/// ```
/// use hodos_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |ctx, req, next| {
///     Box::pin(async move { next.run(ctx, req).await })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new closure-based middleware.
    pub fn new(name: &'static str, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MiddlewareContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Visit {
        name: &'static str,
    }

    #[derive(Debug, Default)]
    struct Visited(Vec<&'static str>);

    impl Middleware for Visit {
        fn name(&self) -> &str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut visited = ctx.remove_extension::<Visited>().unwrap_or_default();
                visited.0.push(self.name);
                ctx.set_extension(visited);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/posts")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok(_ctx: &mut MiddlewareContext, _req: Request) -> BoxFuture<'static, Response> {
        Box::pin(async {
            http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("OK")))
                .unwrap()
        })
    }

    #[tokio::test]
    async fn test_endpoint_only() {
        let mut ctx = MiddlewareContext::new();
        let response = Next::endpoint(ok).run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let first = Visit { name: "first" };
        let second = Visit { name: "second" };

        let mut ctx = MiddlewareContext::new();
        let next = Next::new(&first, Next::new(&second, Next::endpoint(ok)));
        let response = next.run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            ctx.get_extension::<Visited>().unwrap().0,
            vec!["first", "second"]
        );
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuit() {
        let deny = FnMiddleware::new("deny", |_ctx, _req, _next| {
            Box::pin(async {
                http::Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .body(Full::new(Bytes::new()))
                    .unwrap()
            })
        });
        assert_eq!(deny.name(), "deny");

        let mut ctx = MiddlewareContext::new();
        let response = Next::new(&deny, Next::endpoint(ok))
            .run(&mut ctx, request())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_debug_for_trait_object() {
        let mw: BoxedMiddleware = Arc::new(Visit { name: "auth" });
        assert!(format!("{mw:?}").contains("auth"));
    }
}
