//! Template-based routes.
//!
//! A template is a path with `:element` placeholders and an optional greedy
//! tail:
//!
//! | Template                         | Matches                    |
//! |----------------------------------|----------------------------|
//! | `/articles/view/:id`             | `/articles/view/5`         |
//! | `/:controller/:action`           | `/posts/index`             |
//! | `/pages/*`                       | `/pages/about/team` (pass) |
//! | `/files/**`                      | `/files/a/b.txt` (one arg) |
//!
//! The template is compiled once, at build time, into an anchored regular
//! expression. Element names are mapped to synthetic capture groups so any
//! element name and any custom pattern compile.

use crate::context::UrlContext;
use crate::error::{RoutingError, RoutingResult};
use crate::key::RouteKey;
use crate::params::{keys, ParamValue, Params};
use crate::query::build_query;
use crate::request::RoutableRequest;
use crate::route::Route;
use http::Method;
use indexmap::IndexMap;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Matches `:element` placeholders.
fn element_regex() -> &'static Regex {
    static ELEMENT: OnceLock<Regex> = OnceLock::new();
    ELEMENT.get_or_init(|| Regex::new(r":([A-Za-z0-9_-]+)").expect("element regex is valid"))
}

/// Capture group holding the greedy tail.
const GREEDY_GROUP: &str = "greedy";

/// How a route treats path text after its last element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Greedy {
    /// No tail allowed.
    None,
    /// `/*`: each remaining segment is a passed argument.
    Args,
    /// `/**`: the whole remainder is one passed argument.
    Trailing,
}

/// A piece of a parsed template, used to write URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Element(String),
    Tail,
}

/// Configures and builds a [`TemplateRoute`].
///
/// # Example
///
/// ```rust
/// use hodos_router::TemplateRoute;
/// use http::Method;
///
/// let route = TemplateRoute::builder("/articles/:id")
///     .default("controller", "Articles")
///     .default("action", "view")
///     .pattern("id", "[0-9]+")
///     .pass(["id"])
///     .methods([Method::GET])
///     .name("article")
///     .build()
///     .unwrap();
///
/// assert_eq!(route.template(), "/articles/:id");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateRouteBuilder {
    template: String,
    name: Option<String>,
    defaults: Params,
    patterns: IndexMap<String, String>,
    pass: Vec<String>,
    persist: Vec<String>,
    extensions: Vec<String>,
    methods: Vec<Method>,
    host: Option<String>,
}

impl TemplateRouteBuilder {
    fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            name: None,
            defaults: Params::new(),
            patterns: IndexMap::new(),
            pass: Vec::new(),
            persist: Vec::new(),
            extensions: Vec::new(),
            methods: Vec::new(),
            host: None,
        }
    }

    /// Sets the explicit route name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets one default parameter.
    pub fn default(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Sets several default parameters.
    pub fn defaults(mut self, defaults: Params) -> Self {
        self.defaults.extend(defaults.iter().map(|(k, v)| (k, v.clone())));
        self
    }

    /// Restricts an element to a regular expression.
    pub fn pattern(mut self, element: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(element.into(), pattern.into());
        self
    }

    /// Elements copied into the passed arguments, in order.
    pub fn pass<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pass = elements.into_iter().map(Into::into).collect();
        self
    }

    /// Keys copied from the current request's params when generating URLs.
    pub fn persist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist = keys.into_iter().map(Into::into).collect();
        self
    }

    /// File extensions the route accepts.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// HTTP methods the route accepts. Empty means any.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Host pattern; `*` matches any run of characters.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Compiles the template.
    pub fn build(self) -> RoutingResult<TemplateRoute> {
        TemplateRoute::compile(self)
    }
}

/// A route matched against a `:element` template.
#[derive(Debug, Clone)]
pub struct TemplateRoute {
    template: String,
    name: Option<String>,
    defaults: Params,
    pass: Vec<String>,
    persist: Vec<String>,
    extensions: Vec<String>,
    methods: Vec<Method>,
    host: Option<String>,

    /// Element names, in template order.
    elements: Vec<String>,
    parts: Vec<Part>,
    greedy: Greedy,
    compiled: Regex,
    host_matcher: Option<Regex>,
    /// Element patterns anchored for whole-value checks.
    element_matchers: IndexMap<String, Regex>,
    static_path: String,
    key: RouteKey,
}

impl TemplateRoute {
    /// Starts building a route for `template`.
    pub fn builder(template: impl Into<String>) -> TemplateRouteBuilder {
        TemplateRouteBuilder::new(template)
    }

    /// Builds a route with only defaults.
    pub fn new(template: impl Into<String>, defaults: Params) -> RoutingResult<Self> {
        Self::builder(template).defaults(defaults).build()
    }

    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the element names in template order.
    #[must_use]
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Returns true if the route accepts passed arguments.
    #[must_use]
    pub fn is_greedy(&self) -> bool {
        self.greedy != Greedy::None
    }

    /// Returns the accepted HTTP methods. Empty means any.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the compiled regular expression.
    #[must_use]
    pub fn compiled(&self) -> &Regex {
        &self.compiled
    }

    fn compile(builder: TemplateRouteBuilder) -> RoutingResult<Self> {
        let TemplateRouteBuilder {
            template,
            name,
            defaults,
            patterns,
            pass,
            persist,
            extensions,
            methods,
            host,
        } = builder;

        if template.is_empty() {
            return Err(RoutingError::invalid_template(template, "template is empty"));
        }

        let mut element_matchers = IndexMap::new();
        for (element, pattern) in &patterns {
            let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                RoutingError::InvalidPattern {
                    template: template.clone(),
                    element: element.clone(),
                    source,
                }
            })?;
            element_matchers.insert(element.clone(), anchored);
        }

        let (body, greedy) = if let Some(body) = template.strip_suffix("/**") {
            (body, Greedy::Trailing)
        } else if let Some(body) = template.strip_suffix("/*") {
            (body, Greedy::Args)
        } else {
            (template.as_str(), Greedy::None)
        };

        let mut regex = String::from("^");
        let mut parts = Vec::new();
        let mut elements = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in element_regex().captures_iter(body) {
            let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = token.as_str().trim_end_matches(['-', '_']);
            if name.is_empty() {
                continue;
            }

            literal.push_str(&body[last..whole.start()]);
            let index = elements.len();

            if let Some(pattern) = patterns.get(name) {
                let optional = name != keys::PLUGIN && defaults.contains_key(name);
                let q = if optional { "?" } else { "" };
                if literal.ends_with('/') {
                    literal.pop();
                    flush(&mut regex, &mut parts, &mut literal);
                    parts.push(Part::Literal("/".to_owned()));
                    regex.push_str(&format!("(?:/(?P<e{index}>{pattern}){q}){q}"));
                } else {
                    flush(&mut regex, &mut parts, &mut literal);
                    regex.push_str(&format!("(?:(?P<e{index}>{pattern}){q}){q}"));
                }
            } else {
                flush(&mut regex, &mut parts, &mut literal);
                regex.push_str(&format!("(?P<e{index}>[^/]+)"));
            }

            parts.push(Part::Element(name.to_owned()));
            elements.push(name.to_owned());
            last = whole.start() + 1 + name.len();
        }
        literal.push_str(&body[last..]);

        match greedy {
            Greedy::None => flush(&mut regex, &mut parts, &mut literal),
            Greedy::Args | Greedy::Trailing => {
                literal.push('/');
                parts.push(Part::Literal(literal.clone()));
                literal.pop();
                regex.push_str(&regex::escape(&literal));
                regex.push_str(&format!("(?:/(?P<{GREEDY_GROUP}>.*))?"));
                parts.push(Part::Tail);
            }
        }
        regex.push_str("[/]*$");

        let compiled = Regex::new(&regex)
            .map_err(|err| RoutingError::invalid_template(template.as_str(), err.to_string()))?;

        let host_matcher = host
            .as_deref()
            .map(|host| Regex::new(&format!("^{}$", regex::escape(host).replace(r"\*", ".*"))))
            .transpose()
            .map_err(|err| RoutingError::invalid_template(template.as_str(), err.to_string()))?;

        let static_path = static_path_of(&template);
        let key = RouteKey::for_route(elements.iter().map(String::as_str), &defaults);

        tracing::trace!(template = %template, regex = %regex, key = %key, "compiled route");

        Ok(Self {
            template,
            name,
            defaults,
            pass,
            persist,
            extensions,
            methods,
            host,
            elements,
            parts,
            greedy,
            compiled,
            host_matcher,
            element_matchers,
            static_path,
            key,
        })
    }

    fn host_matches(&self, host: Option<&str>) -> bool {
        match (&self.host_matcher, host) {
            (None, _) => true,
            (Some(matcher), Some(host)) => matcher.is_match(host),
            (Some(_), None) => false,
        }
    }

    fn method_allowed(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    /// Splits a known extension off the end of the path.
    fn split_extension<'a>(&self, path: &'a str) -> (&'a str, Option<&str>) {
        if self.extensions.is_empty() || !path.contains('.') {
            return (path, None);
        }
        for ext in &self.extensions {
            if let Some(stem) = path
                .strip_suffix(ext.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
            {
                return (stem, Some(ext.as_str()));
            }
        }
        (path, None)
    }

    /// Checks `_method` in reverse-match params. Missing means GET.
    fn requested_method_allowed(&self, params: &Params) -> bool {
        if self.methods.is_empty() {
            return true;
        }
        let allowed = |name: &str| {
            self.methods
                .iter()
                .any(|m| m.as_str().eq_ignore_ascii_case(name))
        };
        match params.get(keys::METHOD) {
            None => allowed(Method::GET.as_str()),
            Some(ParamValue::Str(name)) => allowed(name),
            Some(ParamValue::List(names)) => names.iter().any(|name| allowed(name)),
            Some(ParamValue::Map(_)) => false,
        }
    }

    fn write_url(
        &self,
        params: &Params,
        pass: &[String],
        query: &Params,
        ext: Option<&str>,
        host: &HostOptions,
    ) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Element(name) => {
                    if let Some(value) = params.get_str(name) {
                        out.push_str(&urlencoding::encode(value));
                    }
                }
                Part::Tail => {
                    let encoded: Vec<Cow<'_, str>> =
                        pass.iter().map(|arg| urlencoding::encode(arg)).collect();
                    let joined = encoded.join("/");
                    if self.greedy == Greedy::Trailing {
                        out.push_str(&joined.replace("%2F", "/"));
                    } else {
                        out.push_str(&joined);
                    }
                }
            }
        }

        if let Some(base) = &host.base {
            out.insert_str(0, base);
        }
        while out.contains("//") {
            out = out.replace("//", "/");
        }

        if host.is_absolute() {
            let scheme = host.scheme.as_deref().unwrap_or("http");
            let authority = host.host.as_deref().unwrap_or_default();
            let port = host.port.map(|p| format!(":{p}")).unwrap_or_default();
            out = format!("{scheme}://{authority}{port}{out}");
        }

        if ext.is_some() || !query.is_empty() {
            out.truncate(out.trim_end_matches('/').len());
        }
        if let Some(ext) = ext {
            out.push('.');
            out.push_str(ext);
        }
        if !query.is_empty() {
            out.push('?');
            out.push_str(&build_query(query));
        }
        out
    }
}

fn flush(regex: &mut String, parts: &mut Vec<Part>, literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    regex.push_str(&regex::escape(literal));
    parts.push(Part::Literal(std::mem::take(literal)));
}

/// Literal text every matching path starts with.
fn static_path_of(template: &str) -> String {
    if let Some(colon) = template.find(':') {
        return template[..colon].to_owned();
    }
    if let Some(star) = template.find('*') {
        let path = template[..star].trim_end_matches('/');
        return if path.is_empty() { "/".to_owned() } else { path.to_owned() };
    }
    template.to_owned()
}

/// Percent-decodes a path, reading `+` as a space.
pub(crate) fn decode_path(value: &str) -> Cow<'_, str> {
    if !value.contains('+') {
        return urlencoding::decode(value).unwrap_or(Cow::Borrowed(value));
    }
    let spaced = value.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    Cow::Owned(decoded.unwrap_or(spaced))
}

/// Scheme, host, port and base for a single URL generation.
#[derive(Debug, Default)]
struct HostOptions {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    base: Option<String>,
}

impl HostOptions {
    /// Takes explicit `_scheme`, `_host`, `_port` and `_base` out of `params`.
    fn take(params: &mut Params) -> Option<Self> {
        let mut take_str = |key: &str| match params.remove(key) {
            Some(ParamValue::Str(value)) => Some(value),
            _ => None,
        };
        let scheme = take_str(keys::SCHEME);
        let host = take_str(keys::HOST);
        let port = match take_str(keys::PORT) {
            Some(port) => Some(port.parse().ok()?),
            None => None,
        };
        let base = take_str(keys::BASE);
        Some(Self {
            scheme,
            host,
            port,
            base,
        })
    }

    fn fill_from(&mut self, context: &UrlContext) {
        if self.scheme.is_none() {
            self.scheme.clone_from(&context.scheme);
        }
        if self.host.is_none() {
            self.host.clone_from(&context.host);
        }
        if self.port.is_none() {
            self.port = context.port;
        }
        if self.base.is_none() {
            self.base.clone_from(&context.base);
        }
    }

    fn is_absolute(&self) -> bool {
        self.scheme.is_some() || self.host.is_some() || self.port.is_some()
    }

    fn drop_default_port(&mut self) {
        let default = match self.scheme.as_deref().unwrap_or("http") {
            "http" | "ws" => Some(80),
            "https" | "wss" => Some(443),
            _ => None,
        };
        if self.port.is_some() && self.port == default {
            self.port = None;
        }
    }
}

impl Route for TemplateRoute {
    fn template(&self) -> &str {
        &self.template
    }

    fn defaults(&self) -> &Params {
        &self.defaults
    }

    fn static_path(&self) -> &str {
        &self.static_path
    }

    fn key(&self) -> &RouteKey {
        &self.key
    }

    fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn parse(&self, path: &str, method: Option<&Method>) -> Option<Params> {
        let (path, ext) = self.split_extension(path);
        let decoded = decode_path(path);
        let caps = self.compiled.captures(&decoded)?;

        if !self.method_allowed(method.unwrap_or(&Method::GET)) {
            return None;
        }

        let mut params = Params::with_capacity(self.elements.len() + self.defaults.len() + 3);
        for (index, element) in self.elements.iter().enumerate() {
            if let Some(value) = caps.name(&format!("e{index}")) {
                params.insert(element.as_str(), value.as_str());
            }
        }
        for (key, value) in &self.defaults {
            if key != keys::PASS && !params.contains_key(key) {
                params.insert(key.as_str(), value.clone());
            }
        }

        let mut pass = Vec::new();
        for element in self.pass.iter().rev() {
            if let Some(value) = params.get_str(element) {
                pass.insert(0, value.to_owned());
            }
        }
        if let Some(tail) = caps.name(GREEDY_GROUP) {
            match self.greedy {
                Greedy::Args => pass.extend(
                    tail.as_str()
                        .split('/')
                        .filter(|segment| !segment.is_empty())
                        .map(str::to_owned),
                ),
                Greedy::Trailing => pass.push(tail.as_str().to_owned()),
                Greedy::None => {}
            }
        }
        params.insert(keys::PASS, pass);

        if let Some(ext) = ext {
            params.insert(keys::EXT, ext);
        }
        if let Some(name) = &self.name {
            params.insert(keys::NAME, name.as_str());
        }
        params.insert(keys::MATCHED_ROUTE, self.template.as_str());
        Some(params)
    }

    fn parse_request(&self, request: &dyn RoutableRequest) -> Option<Params> {
        if !self.host_matches(request.host()) {
            return None;
        }
        self.parse(request.path(), Some(request.method()))
    }

    fn match_params(&self, params: &Params, context: &UrlContext) -> Option<String> {
        let mut url = params.clone();
        url.remove(keys::NAME);
        url.remove(keys::MATCHED_ROUTE);

        for key in &self.persist {
            if !url.contains_key(key) {
                if let Some(value) = context.params.get(key) {
                    url.insert(key.as_str(), value.clone());
                }
            }
        }

        let mut host = HostOptions::take(&mut url)?;
        if let Some(pattern) = &self.host {
            if host.host.is_none() && !pattern.contains('*') {
                host.host = Some(pattern.clone());
            }
            host.fill_from(context);
            if !self.host_matches(host.host.as_deref()) {
                return None;
            }
        }
        if host.is_absolute() {
            host.fill_from(context);
            host.drop_default_port();
        }
        if host.base.is_none() {
            host.base.clone_from(&context.base);
        }

        let mut query = match url.remove(keys::QUERY) {
            Some(ParamValue::Map(query)) => query,
            _ => Params::new(),
        };
        let ext = match url.remove(keys::EXT) {
            Some(ParamValue::Str(ext)) => Some(ext),
            _ => None,
        };

        if !self.requested_method_allowed(&url) {
            return None;
        }
        url.remove(keys::METHOD);

        // Element defaults only fill in parses; any value may be written.
        for (key, default) in &self.defaults {
            if key == keys::PASS || self.elements.iter().any(|e| e == key) {
                continue;
            }
            if url.get(key) != Some(default) {
                return None;
            }
        }

        let mut slots: Vec<Option<String>> = match url.remove(keys::PASS) {
            Some(ParamValue::List(items)) => items.into_iter().map(Some).collect(),
            Some(ParamValue::Str(item)) => vec![Some(item)],
            _ => Vec::new(),
        };
        for (index, element) in self.pass.iter().enumerate() {
            if url.contains_key(element) {
                continue;
            }
            if let Some(value) = slots.get_mut(index).and_then(Option::take) {
                url.insert(element.as_str(), value);
            }
        }
        let pass: Vec<String> = slots.into_iter().flatten().collect();

        if self.elements.iter().any(|element| !url.contains_key(element)) {
            return None;
        }

        let extra: Vec<String> = url
            .iter()
            .filter(|(key, value)| {
                !value.is_empty()
                    && !self.elements.iter().any(|e| e == key)
                    && !self.defaults.contains_key(key)
            })
            .map(|(key, _)| key.to_owned())
            .collect();
        for key in extra {
            if let Some(value) = url.remove(&key) {
                query.insert(key, value);
            }
        }

        if self.greedy == Greedy::None && !pass.is_empty() {
            return None;
        }

        for (element, matcher) in &self.element_matchers {
            match url.get(element) {
                Some(ParamValue::Str(value)) if matcher.is_match(value) => {}
                None => {}
                Some(_) => return None,
            }
        }
        if self
            .elements
            .iter()
            .any(|element| url.get_str(element).is_none())
        {
            return None;
        }

        Some(self.write_url(&url, &pass, &query, ext.as_deref(), &host))
    }
}
