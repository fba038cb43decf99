//! Running a resolved middleware list.
//!
//! The route collection resolves which handlers apply to a path; the
//! [`MiddlewareQueue`] turns that ordered list into a chain of [`Next`]
//! continuations ending at an endpoint.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, BoxedMiddleware, Next};
use crate::types::{Request, Response};

/// An ordered list of middleware ready to run.
///
/// The first middleware in the list is the outermost one: it sees the
/// request first and the response last.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareQueue {
    middleware: Vec<BoxedMiddleware>,
}

impl MiddlewareQueue {
    /// Creates a queue from an already-resolved list.
    #[must_use]
    pub fn new(middleware: Vec<BoxedMiddleware>) -> Self {
        Self { middleware }
    }

    /// Appends a middleware to the end of the queue.
    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    /// Returns the names of the queued middleware, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.middleware.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of queued middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns true if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Runs the request through every queued middleware and then `endpoint`.
    pub async fn run<H>(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        endpoint: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response>
            + Send
            + 'static,
    {
        tracing::debug!(
            request_id = %ctx.request_id(),
            middleware = ?self.names(),
            "running middleware queue"
        );

        let mut next = Next::endpoint(endpoint);
        for middleware in self.middleware.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next.run(ctx, request).await
    }
}

impl From<Vec<BoxedMiddleware>> for MiddlewareQueue {
    fn from(middleware: Vec<BoxedMiddleware>) -> Self {
        Self::new(middleware)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::Arc;

    fn tag(name: &'static str) -> BoxedMiddleware {
        Arc::new(FnMiddleware::new(name, |ctx, req, next| {
            Box::pin(async move {
                let mut response = next.run(ctx, req).await;
                response
                    .headers_mut()
                    .append("x-trail", http::HeaderValue::from_static("mw"));
                response
            })
        }))
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/api/posts")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_empty_queue() {
        let queue = MiddlewareQueue::default();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.names().is_empty());
    }

    #[test]
    fn test_names_in_order() {
        let mut queue = MiddlewareQueue::new(vec![tag("auth"), tag("csrf")]);
        queue.push(tag("cors"));
        assert_eq!(queue.names(), vec!["auth", "csrf", "cors"]);
        assert_eq!(queue.len(), 3);
    }

    #[tokio::test]
    async fn test_run_reaches_endpoint() {
        let queue = MiddlewareQueue::from(vec![tag("auth"), tag("csrf")]);
        let mut ctx = MiddlewareContext::new();

        let response = queue
            .run(&mut ctx, request(), |_ctx, _req| {
                Box::pin(async {
                    http::Response::builder()
                        .status(StatusCode::CREATED)
                        .body(Full::new(Bytes::new()))
                        .unwrap()
                })
            })
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get_all("x-trail").iter().count(), 2);
    }
}
