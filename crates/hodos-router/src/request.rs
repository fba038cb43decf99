//! The request view routes need.

use http::header::HOST;
use http::{HeaderMap, Method, Uri};

/// The parts of an HTTP request that routing reads.
///
/// Implemented for [`http::Request`] and [`http::request::Parts`].
pub trait RoutableRequest {
    /// Returns the URI path, still percent-encoded.
    fn path(&self) -> &str;

    /// Returns the raw query string, without the `?`.
    fn query(&self) -> Option<&str>;

    /// Returns the HTTP method.
    fn method(&self) -> &Method;

    /// Returns the host name, without a port.
    fn host(&self) -> Option<&str>;
}

fn host_of<'a>(uri: &'a Uri, headers: &'a HeaderMap) -> Option<&'a str> {
    uri.host().or_else(|| {
        headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(':').next())
            .filter(|host| !host.is_empty())
    })
}

impl<B> RoutableRequest for http::Request<B> {
    fn path(&self) -> &str {
        self.uri().path()
    }

    fn query(&self) -> Option<&str> {
        self.uri().query()
    }

    fn method(&self) -> &Method {
        self.method()
    }

    fn host(&self) -> Option<&str> {
        host_of(self.uri(), self.headers())
    }
}

impl RoutableRequest for http::request::Parts {
    fn path(&self) -> &str {
        self.uri.path()
    }

    fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn host(&self) -> Option<&str> {
        host_of(&self.uri, &self.headers)
    }
}
