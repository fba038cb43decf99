//! A hot-swappable handle to the active route collection.
//!
//! Request handlers take a [`snapshot`](SharedRoutes::snapshot) and route
//! against it without locking. Rebuilds happen on a private copy under an
//! exclusive writer lock and are published atomically, so a request always
//! sees either the old collection or the new one, never a partial build.

use crate::collection::RouteCollection;
use crate::error::RoutingResult;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A cloneable handle to the current [`RouteCollection`].
///
/// # Example
///
/// ```rust
/// use hodos_router::{RouteCollection, RouteOptions, SharedRoutes, TemplateRoute};
///
/// let shared = SharedRoutes::new(RouteCollection::new());
/// let before = shared.snapshot();
///
/// shared
///     .update(|routes| {
///         routes.add(
///             TemplateRoute::builder("/health").default("controller", "Health").build()?,
///             RouteOptions::default(),
///         )
///     })
///     .unwrap();
///
/// assert!(before.is_empty());
/// assert_eq!(shared.snapshot().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SharedRoutes {
    current: Arc<ArcSwap<RouteCollection>>,
    writer: Arc<Mutex<()>>,
}

impl SharedRoutes {
    /// Wraps a built collection.
    #[must_use]
    pub fn new(routes: RouteCollection) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(routes)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the collection currently being served.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RouteCollection> {
        self.current.load_full()
    }

    /// Publishes a new collection, returning the one it replaced.
    pub fn replace(&self, routes: RouteCollection) -> Arc<RouteCollection> {
        let _guard = self.writer.lock();
        let previous = self.current.swap(Arc::new(routes));
        tracing::info!(routes = previous.len(), "replaced route collection");
        previous
    }

    /// Applies `f` to a copy of the current collection and publishes it.
    ///
    /// If `f` fails, nothing is published and the error is returned.
    pub fn update<F>(&self, f: F) -> RoutingResult<()>
    where
        F: FnOnce(&mut RouteCollection) -> RoutingResult<()>,
    {
        let _guard = self.writer.lock();
        let mut next = RouteCollection::clone(&self.current.load());
        f(&mut next)?;
        tracing::info!(routes = next.len(), "updated route collection");
        self.current.store(Arc::new(next));
        Ok(())
    }
}

impl Default for SharedRoutes {
    fn default() -> Self {
        Self::new(RouteCollection::new())
    }
}

impl From<RouteCollection> for SharedRoutes {
    fn from(routes: RouteCollection) -> Self {
        Self::new(routes)
    }
}
