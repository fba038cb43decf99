//! The route contract used by [`RouteCollection`](crate::RouteCollection).

use crate::context::UrlContext;
use crate::key::RouteKey;
use crate::params::Params;
use crate::request::RoutableRequest;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// A shareable, type-erased route.
pub type SharedRoute = Arc<dyn Route>;

/// A single connectable route.
///
/// The collection only indexes routes and delegates matching to them: it
/// never inspects a template itself. [`TemplateRoute`](crate::TemplateRoute)
/// is the provided implementation.
pub trait Route: fmt::Debug + Send + Sync {
    /// Returns the template the route was declared with, for diagnostics.
    fn template(&self) -> &str;

    /// Returns the default parameters.
    fn defaults(&self) -> &Params;

    /// Returns the literal text every matching path starts with.
    fn static_path(&self) -> &str;

    /// Returns the derived reverse-lookup key.
    fn key(&self) -> &RouteKey;

    /// Returns the derived name, the rendered [`key`](Route::key).
    fn name(&self) -> String {
        self.key().to_string()
    }

    /// Returns the explicit name the route was declared with, if any.
    fn explicit_name(&self) -> Option<&str> {
        None
    }

    /// Returns the file extensions the route accepts.
    fn extensions(&self) -> &[String];

    /// Matches a path (percent-encoded, without query) and extracts parameters.
    ///
    /// `method` is the request method, if known.
    fn parse(&self, path: &str, method: Option<&Method>) -> Option<Params>;

    /// Matches a full request.
    fn parse_request(&self, request: &dyn RoutableRequest) -> Option<Params> {
        self.parse(request.path(), Some(request.method()))
    }

    /// Generates a URL for `params`, or `None` if the route cannot produce one.
    fn match_params(&self, params: &Params, context: &UrlContext) -> Option<String>;
}
