//! Builds a [`RouteCollection`] from a [`RoutingConfig`].
//!
//! Middleware cannot be expressed in a config file, so configuration names a
//! handler id and the application supplies the handlers in a
//! [`MiddlewareCatalog`].

use hodos_middleware::BoxedMiddleware;
use hodos_router::{Params, RouteCollection, RouteOptions, TemplateRoute};
use indexmap::IndexMap;

use crate::schema::{RouteConfig, RoutingConfig};
use crate::ConfigError;

/// Middleware handlers available to configuration, keyed by handler id.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hodos_config::MiddlewareCatalog;
/// use hodos_middleware::FnMiddleware;
///
/// let mut catalog = MiddlewareCatalog::new();
/// catalog.insert(
///     "session_auth",
///     Arc::new(FnMiddleware::new("session_auth", |ctx, req, next| {
///         Box::pin(async move { next.run(ctx, req).await })
///     })),
/// );
/// assert!(catalog.contains("session_auth"));
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareCatalog {
    handlers: IndexMap<String, BoxedMiddleware>,
}

impl MiddlewareCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler under `id`, replacing any previous one.
    pub fn insert(&mut self, id: impl Into<String>, handler: BoxedMiddleware) -> &mut Self {
        self.handlers.insert(id.into(), handler);
        self
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, handler: BoxedMiddleware) -> Self {
        self.insert(id, handler);
        self
    }

    /// Returns true if a handler is available under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Looks up a handler.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoxedMiddleware> {
        self.handlers.get(id)
    }
}

impl std::fmt::Debug for MiddlewareCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

/// Connects every configured route, registers middleware and enables scopes.
///
/// Routes that declare no extensions inherit `routing.extensions`. The
/// global extensions are also set on the collection itself.
pub fn build_routes(
    routing: &RoutingConfig,
    catalog: &MiddlewareCatalog,
) -> Result<RouteCollection, ConfigError> {
    let mut routes = RouteCollection::new();
    routes.set_extensions(routing.extensions.iter().cloned(), false);

    for config in &routing.routes {
        let route = build_route(config, &routing.extensions)?;
        let options = match &config.name {
            Some(name) => RouteOptions::named(name.as_str()),
            None => RouteOptions::default(),
        };
        routes.add(route, options)?;
    }

    for entry in &routing.middleware {
        let handler = catalog.get(&entry.handler).ok_or_else(|| {
            ConfigError::UnknownMiddlewareHandler {
                name: entry.name.clone(),
                handler: entry.handler.clone(),
            }
        })?;
        routes.register_middleware(entry.name.as_str(), handler.clone())?;
    }

    for scope in &routing.scopes {
        routes.enable_middleware(&scope.path, scope.middleware.iter().cloned())?;
    }

    tracing::info!(
        routes = routes.len(),
        named = routes.named().len(),
        middleware = routing.middleware.len(),
        scopes = routing.scopes.len(),
        "built route collection from configuration"
    );

    Ok(routes)
}

fn build_route(config: &RouteConfig, inherited: &[String]) -> Result<TemplateRoute, ConfigError> {
    let defaults: Params = config
        .defaults
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let methods = config.parsed_methods().map_err(|method| {
        ConfigError::invalid_value(
            format!("routes[{}].methods", config.template),
            format!("invalid HTTP method: {method}"),
        )
    })?;
    let extensions = if config.extensions.is_empty() {
        inherited
    } else {
        &config.extensions
    };

    let mut builder = TemplateRoute::builder(config.template.as_str())
        .defaults(defaults)
        .pass(config.pass.iter().cloned())
        .persist(config.persist.iter().cloned())
        .extensions(extensions.iter().cloned())
        .methods(methods);
    for (element, pattern) in &config.patterns {
        builder = builder.pattern(element.as_str(), pattern.as_str());
    }
    if let Some(host) = &config.host {
        builder = builder.host(host.as_str());
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MiddlewareConfig, ScopeConfig};
    use hodos_middleware::FnMiddleware;
    use hodos_router::{keys, RoutingError, UrlContext};
    use std::sync::Arc;

    fn noop(name: &'static str) -> BoxedMiddleware {
        Arc::new(FnMiddleware::new(name, |ctx, req, next| {
            Box::pin(async move { next.run(ctx, req).await })
        }))
    }

    fn route(template: &str, defaults: &[(&str, &str)]) -> RouteConfig {
        RouteConfig {
            template: template.to_string(),
            defaults: defaults
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..RouteConfig::default()
        }
    }

    #[test]
    fn test_build_routes() {
        let mut article = route("/articles/:id", &[("controller", "Articles"), ("action", "view")]);
        article.name = Some("article".to_string());
        article.patterns.insert("id".to_string(), "[0-9]+".to_string());
        article.pass = vec!["id".to_string()];

        let routing = RoutingConfig {
            extensions: vec!["json".to_string()],
            routes: vec![article],
            ..RoutingConfig::default()
        };

        let routes = build_routes(&routing, &MiddlewareCatalog::new()).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes.named().contains_key("article"));

        let parsed = routes.parse("/articles/12.json", None).unwrap();
        assert_eq!(parsed.get_str("id"), Some("12"));
        assert_eq!(parsed.get_str(keys::EXT), Some("json"));
        assert_eq!(parsed.pass(), ["12".to_string()]);
        assert!(routes.parse("/articles/abc", None).is_err());
    }

    #[test]
    fn test_route_extensions_override_global() {
        let mut feed = route("/feed", &[("controller", "Feed"), ("action", "index")]);
        feed.extensions = vec!["rss".to_string()];
        let routing = RoutingConfig {
            extensions: vec!["json".to_string()],
            routes: vec![feed],
            ..RoutingConfig::default()
        };

        let routes = build_routes(&routing, &MiddlewareCatalog::new()).unwrap();
        assert!(routes.parse("/feed.rss", None).is_ok());
        assert!(routes.parse("/feed.json", None).is_err());
    }

    #[test]
    fn test_build_routes_methods() {
        let mut add = route("/posts", &[("controller", "Posts"), ("action", "add")]);
        add.methods = vec!["post".to_string()];
        let routing = RoutingConfig {
            routes: vec![add],
            ..RoutingConfig::default()
        };

        let routes = build_routes(&routing, &MiddlewareCatalog::new()).unwrap();
        assert!(routes.parse("/posts", Some(&http::Method::POST)).is_ok());
        assert!(routes.parse("/posts", Some(&http::Method::GET)).is_err());
    }

    #[test]
    fn test_build_routes_middleware() {
        let routing = RoutingConfig {
            middleware: vec![
                MiddlewareConfig {
                    name: "auth".to_string(),
                    handler: "session".to_string(),
                },
                MiddlewareConfig {
                    name: "cors".to_string(),
                    handler: "cors".to_string(),
                },
            ],
            scopes: vec![
                ScopeConfig {
                    path: "/".to_string(),
                    middleware: vec!["cors".to_string()],
                },
                ScopeConfig {
                    path: "/admin".to_string(),
                    middleware: vec!["auth".to_string(), "cors".to_string()],
                },
            ],
            ..RoutingConfig::default()
        };
        let catalog = MiddlewareCatalog::new()
            .with("session", noop("session"))
            .with("cors", noop("cors"));

        let routes = build_routes(&routing, &catalog).unwrap();
        assert_eq!(routes.matching_middleware_names("/admin/users"), vec!["cors", "auth"]);

        let matched = routes.matching_middleware("/admin/users");
        let handlers: Vec<&str> = matched
            .iter()
            .map(|mw| mw.name())
            .collect();
        assert_eq!(handlers, vec!["cors", "session"]);
    }

    #[test]
    fn test_unknown_handler() {
        let routing = RoutingConfig {
            middleware: vec![MiddlewareConfig {
                name: "auth".to_string(),
                handler: "missing".to_string(),
            }],
            ..RoutingConfig::default()
        };

        let err = build_routes(&routing, &MiddlewareCatalog::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownMiddlewareHandler { ref name, ref handler } if name == "auth" && handler == "missing"
        ));
    }

    #[test]
    fn test_routing_errors_propagate() {
        let mut first = route("/blog", &[("controller", "Posts")]);
        first.name = Some("blog".to_string());
        let second = first.clone();
        let routing = RoutingConfig {
            routes: vec![first, second],
            ..RoutingConfig::default()
        };

        let err = build_routes(&routing, &MiddlewareCatalog::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Routing(RoutingError::DuplicateNamedRoute { .. })
        ));

        let mut bad = route("/items/:id", &[]);
        bad.patterns.insert("id".to_string(), "[0-9".to_string());
        let routing = RoutingConfig {
            routes: vec![bad],
            ..RoutingConfig::default()
        };
        let err = build_routes(&routing, &MiddlewareCatalog::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Routing(RoutingError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_reverse_from_config() {
        let mut article = route("/articles/:id", &[("controller", "Articles"), ("action", "view")]);
        article.name = Some("article".to_string());
        let routing = RoutingConfig {
            routes: vec![article],
            ..RoutingConfig::default()
        };
        let routes = build_routes(&routing, &MiddlewareCatalog::new()).unwrap();

        let params: Params = [("_name", "article"), ("id", "3")].into_iter().collect();
        assert_eq!(
            routes.match_params(&params, &UrlContext::new()).unwrap(),
            "/articles/3"
        );
    }
}
