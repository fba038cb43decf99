//! Request context for URL generation.

use crate::params::Params;
use std::fmt;

/// Information about the current request used when generating URLs.
///
/// Routes read the base path, the scheme/host/port for absolute URLs, and
/// the current request's parameters for `persist`.
///
/// # Example
///
/// ```rust
/// use hodos_router::UrlContext;
///
/// let ctx = UrlContext::new()
///     .with_base("/app")
///     .with_scheme("https")
///     .with_host("example.com")
///     .with_port(443);
///
/// assert_eq!(ctx.base.as_deref(), Some("/app"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlContext {
    /// Base path the application is mounted under.
    pub base: Option<String>,
    /// Request scheme (`http`, `https`).
    pub scheme: Option<String>,
    /// Request host name.
    pub host: Option<String>,
    /// Request port.
    pub port: Option<u16>,
    /// Parameters of the current request.
    pub params: Params,
}

impl UrlContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base path.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Sets the scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the current request's parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

impl fmt::Display for UrlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(base) = &self.base {
            parts.push(format!("_base: {base:?}"));
        }
        if let Some(scheme) = &self.scheme {
            parts.push(format!("_scheme: {scheme:?}"));
        }
        if let Some(host) = &self.host {
            parts.push(format!("_host: {host:?}"));
        }
        if let Some(port) = self.port {
            parts.push(format!("_port: {port}"));
        }
        if !self.params.is_empty() {
            parts.push(format!("params: {}", self.params));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}
