//! Per-request state shared by the middleware in a queue.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Context that flows through a middleware queue.
///
/// The dispatcher that resolved the route typically stores the parsed route
/// parameters as an extension before running the queue, so middleware can
/// inspect them without this crate depending on the router.
///
/// # Example
///
/// ```
/// use hodos_middleware::MiddlewareContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Tenant(String);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_matched_route("/articles/view/:id");
/// ctx.set_extension(Tenant("acme".to_string()));
///
/// assert_eq!(ctx.matched_route(), Some("/articles/view/:id"));
/// assert_eq!(ctx.get_extension::<Tenant>(), Some(&Tenant("acme".to_string())));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,

    /// Template of the route that accepted the request, if any.
    matched_route: Option<String>,

    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was propagated by an upstream service.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            matched_route: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the template of the matched route, if set.
    #[must_use]
    pub fn matched_route(&self) -> Option<&str> {
        self.matched_route.as_deref()
    }

    /// Records the template of the matched route.
    pub fn set_matched_route(&mut self, template: impl Into<String>) {
        self.matched_route = Some(template.into());
    }

    /// Returns when processing started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time elapsed since processing started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a typed extension.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Removes and returns a typed extension.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns true if an extension of the given type is present.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
