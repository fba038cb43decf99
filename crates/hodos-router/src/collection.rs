//! The route collection.
//!
//! Routes are indexed three ways:
//!
//! ```text
//! paths        "/articles/view/" -> [r1]      forward parse, longest prefix first
//!              "/articles"       -> [r2, r3]
//!              "/"               -> [r4]
//!
//! route_table  articles:view     -> [r1]      reverse match by derived key
//!              _controller:_action -> [r4]
//!
//! named        "article"         -> r1        reverse match by explicit name
//! ```
//!
//! The collection never inspects templates; it narrows the candidates and
//! lets each [`Route`] decide.

use crate::context::UrlContext;
use crate::error::{MissingRoute, RoutingError, RoutingResult};
use crate::key::{candidate_keys, RouteKey};
use crate::middleware::{MiddlewareHandler, MiddlewareRegistry};
use crate::params::{keys, ParamValue, Params};
use crate::query::parse_query;
use crate::request::RoutableRequest;
use crate::route::{Route, SharedRoute};
use crate::template::decode_path;
use hodos_middleware::BoxedMiddleware;
use http::Method;
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

/// Options for [`RouteCollection::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Explicit name, overriding any name the route carries itself.
    pub name: Option<String>,
}

impl RouteOptions {
    /// Options binding the route to an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// An indexed set of routes plus scoped middleware.
///
/// Built once during configuration, then shared read-only.
///
/// # Example
///
/// ```rust
/// use hodos_router::{Params, RouteCollection, RouteOptions, TemplateRoute, UrlContext};
///
/// let mut routes = RouteCollection::new();
/// routes
///     .add(
///         TemplateRoute::builder("/articles/view/:id")
///             .default("controller", "Articles")
///             .default("action", "view")
///             .build()
///             .unwrap(),
///         RouteOptions::named("article"),
///     )
///     .unwrap();
///
/// let parsed = routes.parse("/articles/view/5?ref=home", None).unwrap();
/// assert_eq!(parsed.get_str("id"), Some("5"));
/// assert_eq!(parsed.query().and_then(|q| q.get_str("ref")), Some("home"));
///
/// let params: Params = [("_name", "article"), ("id", "5")].into_iter().collect();
/// let url = routes.match_params(&params, &UrlContext::new()).unwrap();
/// assert_eq!(url, "/articles/view/5");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<SharedRoute>,
    paths: BTreeMap<String, Vec<SharedRoute>>,
    route_table: HashMap<RouteKey, Vec<SharedRoute>>,
    named: IndexMap<String, SharedRoute>,
    extensions: IndexSet<String>,
    middleware: MiddlewareRegistry,
}

impl RouteCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a route.
    pub fn add(&mut self, route: impl Route + 'static, options: RouteOptions) -> RoutingResult<()> {
        self.add_shared(Arc::new(route), options)
    }

    /// Connects an already shared route.
    ///
    /// Fails with [`RoutingError::DuplicateNamedRoute`] if the explicit name
    /// is taken, leaving the collection unchanged.
    pub fn add_shared(&mut self, route: SharedRoute, options: RouteOptions) -> RoutingResult<()> {
        let name = options
            .name
            .or_else(|| route.explicit_name().map(str::to_owned));

        if let Some(name) = &name {
            if let Some(existing) = self.named.get(name) {
                return Err(RoutingError::duplicate_named_route(name.as_str(), existing.clone()));
            }
        }

        debug!(
            template = route.template(),
            key = %route.key(),
            static_path = route.static_path(),
            name = name.as_deref(),
            "connected route"
        );

        self.routes.push(route.clone());
        if let Some(name) = name {
            self.named.insert(name, route.clone());
        }
        self.route_table
            .entry(route.key().clone())
            .or_default()
            .push(route.clone());
        self.paths
            .entry(route.static_path().to_owned())
            .or_default()
            .push(route.clone());

        if !route.extensions().is_empty() {
            self.extensions.extend(route.extensions().iter().cloned());
        }
        Ok(())
    }

    /// Parses a URL, optionally with the request method.
    ///
    /// The query string, if any, is returned under the `?` key.
    pub fn parse(&self, url: &str, method: Option<&Method>) -> RoutingResult<Params> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let decoded = decode_path(path);

        for route in self.candidates(&decoded) {
            trace!(template = route.template(), url, "trying route");
            if let Some(mut params) = route.parse(path, method) {
                attach_query(&mut params, query);
                return Ok(params);
            }
        }

        debug!(url, method = method.map(Method::as_str), "no route matched");
        Err(MissingRoute::for_url(url, method).into())
    }

    /// Parses a request.
    pub fn parse_request<R: RoutableRequest>(&self, request: &R) -> RoutingResult<Params> {
        let decoded = decode_path(request.path());

        for route in self.candidates(&decoded) {
            trace!(template = route.template(), path = %decoded, "trying route");
            if let Some(mut params) = route.parse_request(request) {
                attach_query(&mut params, request.query());
                return Ok(params);
            }
        }

        debug!(path = %decoded, method = %request.method(), "no route matched request");
        Err(MissingRoute::for_url(decoded.into_owned(), Some(request.method())).into())
    }

    /// Routes whose static path is a prefix of `path`, longest prefix first.
    fn candidates<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a SharedRoute> + 'a {
        self.paths
            .iter()
            .rev()
            .filter(move |(prefix, _)| path.starts_with(prefix.as_str()))
            .flat_map(|(_, routes)| routes)
    }

    /// Generates a URL for `params`.
    ///
    /// With `_name`, only that route is tried and its output is returned as
    /// is. Otherwise routes are tried by candidate key and the URL loses a
    /// single leading and trailing `/`.
    pub fn match_params(&self, params: &Params, context: &UrlContext) -> RoutingResult<String> {
        if let Some(name) = params.get(keys::NAME) {
            return self.match_named(name, params, context);
        }

        for key in candidate_keys(params) {
            let Some(routes) = self.route_table.get(&key) else {
                continue;
            };
            for route in routes {
                trace!(key = %key, template = route.template(), "trying reverse route");
                if let Some(url) = route.match_params(params, context) {
                    return Ok(trim_slashes(url));
                }
            }
        }

        debug!(params = %params, "no route matched params");
        Err(MissingRoute::NoMatch {
            params: params.clone(),
            context: context.clone(),
        }
        .into())
    }

    fn match_named(
        &self,
        name: &ParamValue,
        params: &Params,
        context: &UrlContext,
    ) -> RoutingResult<String> {
        let name = match name {
            ParamValue::Str(name) => name.clone(),
            other => other.to_string(),
        };

        let Some(route) = self.named.get(&name) else {
            debug!(name = %name, "named route not found");
            return Err(MissingRoute::NamedNotFound {
                name,
                context: context.clone(),
            }
            .into());
        };

        let mut url = params.clone();
        url.remove(keys::NAME);
        url.merge_defaults(route.defaults());

        route.match_params(&url, context).ok_or_else(|| {
            debug!(name = %name, template = route.template(), "named route failed to match");
            MissingRoute::NamedMismatch {
                name,
                context: context.clone(),
            }
            .into()
        })
    }

    /// Returns every route in connection order.
    #[must_use]
    pub fn routes(&self) -> &[SharedRoute] {
        &self.routes
    }

    /// Returns the explicitly named routes.
    #[must_use]
    pub fn named(&self) -> &IndexMap<String, SharedRoute> {
        &self.named
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the static paths in the order `parse` probes them.
    pub fn static_paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().rev().map(String::as_str)
    }

    /// Returns the accepted extensions.
    #[must_use]
    pub fn extensions(&self) -> &IndexSet<String> {
        &self.extensions
    }

    /// Merges into or replaces the accepted extensions.
    pub fn set_extensions<I, S>(&mut self, extensions: I, merge: bool) -> &IndexSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !merge {
            self.extensions.clear();
        }
        self.extensions.extend(extensions.into_iter().map(Into::into));
        &self.extensions
    }

    /// Registers a named middleware handler.
    pub fn register_middleware(
        &mut self,
        name: impl Into<String>,
        handler: impl Into<MiddlewareHandler>,
    ) -> RoutingResult<&mut Self> {
        self.middleware.register(name, handler)?;
        Ok(self)
    }

    /// Returns true if a middleware is registered under `name`.
    #[must_use]
    pub fn has_middleware(&self, name: &str) -> bool {
        self.middleware.contains(name)
    }

    /// Applies registered middleware to every path starting with `path`.
    pub fn enable_middleware<I, S>(&mut self, path: &str, names: I) -> RoutingResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.enable(path, names)?;
        Ok(self)
    }

    /// Returns the middleware that apply to `path`, deduplicated by name.
    #[must_use]
    pub fn matching_middleware(&self, path: &str) -> Vec<BoxedMiddleware> {
        self.middleware.matching(path)
    }

    /// Returns the names of the middleware that apply to `path`.
    #[must_use]
    pub fn matching_middleware_names(&self, path: &str) -> Vec<&str> {
        self.middleware.matching_names(path)
    }

    /// Returns the middleware registry.
    #[must_use]
    pub fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }
}

fn attach_query(params: &mut Params, query: Option<&str>) {
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        params.insert(keys::QUERY, parse_query(query));
    }
}

/// Drops a single leading and trailing `/`, leaving `/` alone.
fn trim_slashes(mut url: String) -> String {
    if url.len() > 1 {
        if url.ends_with('/') {
            url.pop();
        }
        if url.starts_with('/') {
            url.remove(0);
        }
    }
    url
}
