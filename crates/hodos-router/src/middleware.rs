//! Named middleware and path scopes.
//!
//! Middleware is registered under a name, then enabled for path scopes.
//! A scope path compiles to a start-anchored matcher, so `/api` applies to
//! `/api/v1/users` as well:
//!
//! ```text
//! enable("/api", [cors])              ^/api
//! enable("/api/:version", [auth])     ^/api/[^/]+
//!
//! resolve("/api/v1/users") -> [cors, auth]
//! ```
//!
//! The registry only resolves handlers; running them is the job of a
//! [`MiddlewareQueue`](hodos_middleware::MiddlewareQueue).

use crate::error::{RoutingError, RoutingResult};
use hodos_middleware::{BoxedMiddleware, Middleware};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A value offered as a middleware handler.
#[derive(Clone)]
pub enum MiddlewareHandler {
    /// A handler that can be invoked.
    Invokable(BoxedMiddleware),
    /// An unresolved reference, such as a handler id from configuration.
    Reference(String),
}

impl MiddlewareHandler {
    /// Wraps a middleware instance.
    pub fn new(middleware: impl Middleware) -> Self {
        Self::Invokable(Arc::new(middleware))
    }
}

impl fmt::Debug for MiddlewareHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invokable(mw) => f.debug_tuple("Invokable").field(&mw.name()).finish(),
            Self::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
        }
    }
}

impl From<BoxedMiddleware> for MiddlewareHandler {
    fn from(middleware: BoxedMiddleware) -> Self {
        Self::Invokable(middleware)
    }
}

impl From<&str> for MiddlewareHandler {
    fn from(reference: &str) -> Self {
        Self::Reference(reference.to_owned())
    }
}

impl From<String> for MiddlewareHandler {
    fn from(reference: String) -> Self {
        Self::Reference(reference)
    }
}

#[derive(Debug, Clone)]
struct Scope {
    path: String,
    matcher: Regex,
    names: Vec<String>,
}

/// Registered middleware and the path scopes they apply to.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    handlers: IndexMap<String, BoxedMiddleware>,
    scopes: Vec<Scope>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a handler, replacing any previous binding.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Into<MiddlewareHandler>,
    ) -> RoutingResult<()> {
        let name = name.into();
        match handler.into() {
            MiddlewareHandler::Invokable(middleware) => {
                tracing::debug!(middleware = %name, handler = middleware.name(), "registered middleware");
                self.handlers.insert(name, middleware);
                Ok(())
            }
            MiddlewareHandler::Reference(reference) => {
                tracing::debug!(middleware = %name, reference = %reference, "rejected non-invokable middleware");
                Err(RoutingError::MiddlewareNotInvokable { name })
            }
        }
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns the handler registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedMiddleware> {
        self.handlers.get(name)
    }

    /// Returns the registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Applies the named middleware to every path starting with `path`.
    ///
    /// All names are checked before anything changes. Enabling the same
    /// path again appends to its list.
    pub fn enable<I, S>(&mut self, path: &str, names: I) -> RoutingResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(unknown) = names.iter().find(|name| !self.contains(name)) {
            return Err(RoutingError::UnregisteredMiddleware {
                name: unknown.clone(),
                path: path.to_owned(),
            });
        }

        let pattern = compile_scope_pattern(path);
        tracing::debug!(path, pattern = %pattern, middleware = ?names, "enabled middleware scope");

        if let Some(scope) = self
            .scopes
            .iter_mut()
            .find(|scope| scope.matcher.as_str() == pattern)
        {
            scope.names.extend(names);
            return Ok(());
        }

        let matcher = Regex::new(&pattern).map_err(|source| RoutingError::InvalidPattern {
            template: path.to_owned(),
            element: "path".to_owned(),
            source,
        })?;
        self.scopes.push(Scope {
            path: path.to_owned(),
            matcher,
            names,
        });
        Ok(())
    }

    /// Returns the middleware names that apply to `path`, first occurrence wins.
    #[must_use]
    pub fn matching_names(&self, path: &str) -> Vec<&str> {
        let mut resolved: IndexSet<&str> = IndexSet::new();
        for scope in self.scopes.iter().filter(|scope| scope.matcher.is_match(path)) {
            resolved.extend(scope.names.iter().map(String::as_str));
        }
        resolved.into_iter().collect()
    }

    /// Returns the handlers that apply to `path`, in resolution order.
    #[must_use]
    pub fn matching(&self, path: &str) -> Vec<BoxedMiddleware> {
        self.matching_names(path)
            .into_iter()
            .filter_map(|name| self.handlers.get(name).cloned())
            .collect()
    }

    /// Returns each scope's path and names, in registration order.
    pub fn scopes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.scopes
            .iter()
            .map(|scope| (scope.path.as_str(), scope.names.as_slice()))
    }
}

/// Compiles a scope path into a start-anchored regular expression.
///
/// Literal text is escaped and each `:token` (ASCII letters, digits and
/// `_`, not ending in `_`) becomes `[^/]+`.
///
/// ```rust
/// use hodos_router::middleware::compile_scope_pattern;
///
/// assert_eq!(compile_scope_pattern("/api/:version"), "^/api/[^/]+");
/// assert_eq!(compile_scope_pattern("/v1.0"), r"^/v1\.0");
/// ```
#[must_use]
pub fn compile_scope_pattern(path: &str) -> String {
    let mut pattern = String::from("^");
    let mut literal = String::new();
    let mut chars = path.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != ':' {
            literal.push(c);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(i, next)) = chars.peek() {
            if !(next.is_ascii_alphanumeric() || next == '_') {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }

        let token = &path[start + 1..end];
        let name = token.trim_end_matches('_');
        if name.is_empty() {
            literal.push_str(&path[start..end]);
            continue;
        }

        pattern.push_str(&regex::escape(&literal));
        literal.clear();
        pattern.push_str("[^/]+");
        literal.push_str(&token[name.len()..]);
    }

    pattern.push_str(&regex::escape(&literal));
    pattern
}
