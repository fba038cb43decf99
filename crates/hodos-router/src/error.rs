//! Routing errors.
//!
//! [`RoutingError`] covers both registration-time mistakes (duplicate names,
//! unknown middleware, bad templates) and lookup-time misses
//! ([`MissingRoute`]). Misses map to `404 Not Found`; everything else is a
//! configuration error and maps to `500`.

use crate::context::UrlContext;
use crate::params::Params;
use crate::route::SharedRoute;
use http::{Method, StatusCode};
use thiserror::Error;

/// Result type alias using [`RoutingError`].
pub type RoutingResult<T> = Result<T, RoutingError>;

/// A lookup that produced no route, in either direction.
#[derive(Error, Debug, Clone)]
pub enum MissingRoute {
    /// Forward parse without a method.
    #[error("A route matching \"{url}\" could not be found.")]
    Url {
        /// The URL that was parsed.
        url: String,
    },

    /// Forward parse with a method.
    #[error("A \"{method}\" route matching \"{url}\" could not be found.")]
    UrlWithMethod {
        /// The request method.
        method: Method,
        /// The URL that was parsed.
        url: String,
    },

    /// Reverse match by explicit name, where the name is unknown.
    #[error("A route named \"{name}\" could not be found.")]
    NamedNotFound {
        /// The requested name.
        name: String,
        /// The context the match ran with.
        context: UrlContext,
    },

    /// Reverse match by explicit name, where the route rejected the params.
    #[error("A named route was found for \"{name}\", but matching failed.")]
    NamedMismatch {
        /// The requested name.
        name: String,
        /// The context the match ran with.
        context: UrlContext,
    },

    /// Reverse match by convention where no candidate route matched.
    #[error("A route matching \"{params}\" could not be found.")]
    NoMatch {
        /// The parameters that were matched.
        params: Params,
        /// The context the match ran with.
        context: UrlContext,
    },
}

impl MissingRoute {
    /// Creates a forward-parse miss.
    pub fn for_url(url: impl Into<String>, method: Option<&Method>) -> Self {
        let url = url.into();
        match method {
            Some(method) => Self::UrlWithMethod {
                method: method.clone(),
                url,
            },
            None => Self::Url { url },
        }
    }

    /// Returns the URL of a forward-parse miss.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url { url } | Self::UrlWithMethod { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Returns the method of a forward-parse miss.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        match self {
            Self::UrlWithMethod { method, .. } => Some(method),
            _ => None,
        }
    }

    /// Returns the context of a reverse-match miss.
    #[must_use]
    pub fn context(&self) -> Option<&UrlContext> {
        match self {
            Self::NamedNotFound { context, .. }
            | Self::NamedMismatch { context, .. }
            | Self::NoMatch { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Errors raised by the route collection and routes.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// An explicit route name was already bound.
    #[error("A route named \"{name}\" has already been connected to \"{template}\".")]
    DuplicateNamedRoute {
        /// The colliding name.
        name: String,
        /// Template of the route already bound to the name.
        template: String,
        /// The route already bound to the name.
        existing: SharedRoute,
    },

    /// No route matched.
    #[error(transparent)]
    MissingRoute(#[from] MissingRoute),

    /// A middleware was registered without an invokable handler.
    #[error("The middleware \"{name}\" is not an invokable handler.")]
    MiddlewareNotInvokable {
        /// Name the handler was registered under.
        name: String,
    },

    /// A scope referenced a middleware name that was never registered.
    #[error("Cannot apply \"{name}\" middleware to path \"{path}\". It has not been registered.")]
    UnregisteredMiddleware {
        /// The unknown middleware name.
        name: String,
        /// The scope path.
        path: String,
    },

    /// A route template could not be compiled.
    #[error("Invalid route template \"{template}\": {reason}")]
    InvalidTemplate {
        /// The template.
        template: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A custom element pattern is not a valid regular expression.
    #[error("Invalid pattern for \"{element}\" in route \"{template}\"")]
    InvalidPattern {
        /// The template.
        template: String,
        /// The element the pattern was declared for.
        element: String,
        /// The regex error.
        #[source]
        source: regex::Error,
    },
}

impl RoutingError {
    /// Creates a duplicate-name error for `existing`.
    pub fn duplicate_named_route(name: impl Into<String>, existing: SharedRoute) -> Self {
        Self::DuplicateNamedRoute {
            name: name.into(),
            template: existing.template().to_owned(),
            existing,
        }
    }

    /// Creates an invalid-template error.
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a lookup miss.
    #[must_use]
    pub const fn is_missing_route(&self) -> bool {
        matches!(self, Self::MissingRoute(_))
    }

    /// Returns the HTTP status code a dispatcher should respond with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingRoute(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_messages() {
        let err = MissingRoute::for_url("/nonexistent", None);
        assert_eq!(
            err.to_string(),
            "A route matching \"/nonexistent\" could not be found."
        );
        assert_eq!(err.url(), Some("/nonexistent"));
        assert!(err.method().is_none());

        let err = MissingRoute::for_url("/x", Some(&Method::GET));
        assert_eq!(
            err.to_string(),
            "A \"GET\" route matching \"/x\" could not be found."
        );
        assert_eq!(err.method(), Some(&Method::GET));
    }

    #[test]
    fn test_reverse_messages() {
        let context = UrlContext::new();
        let not_found = MissingRoute::NamedNotFound {
            name: "blog_index".into(),
            context: context.clone(),
        };
        let mismatch = MissingRoute::NamedMismatch {
            name: "blog_index".into(),
            context: context.clone(),
        };
        let params: Params = [("controller", "posts")].into_iter().collect();
        let no_match = MissingRoute::NoMatch { params, context };

        assert_eq!(
            not_found.to_string(),
            "A route named \"blog_index\" could not be found."
        );
        assert_eq!(
            mismatch.to_string(),
            "A named route was found for \"blog_index\", but matching failed."
        );
        assert_eq!(
            no_match.to_string(),
            "A route matching \"{controller: \"posts\"}\" could not be found."
        );
        assert!(no_match.context().is_some());
        assert!(no_match.url().is_none());
    }

    #[test]
    fn test_status_codes() {
        let missing = RoutingError::from(MissingRoute::for_url("/", None));
        assert!(missing.is_missing_route());
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let config = RoutingError::UnregisteredMiddleware {
            name: "csrf".into(),
            path: "/api".into(),
        };
        assert!(!config.is_missing_route());
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            config.to_string(),
            "Cannot apply \"csrf\" middleware to path \"/api\". It has not been registered."
        );
    }
}
