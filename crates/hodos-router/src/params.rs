//! Routing parameter bags.
//!
//! Both directions of routing speak [`Params`]: parsing a URL produces one,
//! and reverse matching consumes one. Values are strings, except for the
//! passed-argument list (`pass`) and the query map (`?`).

use indexmap::IndexMap;
use std::fmt;

/// Well-known parameter keys.
pub mod keys {
    /// Controller axis of a route key.
    pub const CONTROLLER: &str = "controller";
    /// Action axis of a route key.
    pub const ACTION: &str = "action";
    /// Plugin axis of a route key.
    pub const PLUGIN: &str = "plugin";
    /// Prefix axis of a route key.
    pub const PREFIX: &str = "prefix";
    /// Positional arguments captured by greedy routes.
    pub const PASS: &str = "pass";
    /// Explicit route name.
    pub const NAME: &str = "_name";
    /// File extension stripped from the URL.
    pub const EXT: &str = "_ext";
    /// HTTP method constraint used when generating URLs.
    pub const METHOD: &str = "_method";
    /// Template of the route that parsed the URL.
    pub const MATCHED_ROUTE: &str = "_matchedRoute";
    /// Scheme for absolute URL generation.
    pub const SCHEME: &str = "_scheme";
    /// Host for absolute URL generation.
    pub const HOST: &str = "_host";
    /// Port for absolute URL generation.
    pub const PORT: &str = "_port";
    /// Base path prepended to generated URLs.
    pub const BASE: &str = "_base";
    /// Query string parameters.
    pub const QUERY: &str = "?";
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A plain string value.
    Str(String),
    /// An ordered list of strings (`pass`, `tags[]=a&tags[]=b`).
    List(Vec<String>),
    /// A nested map (the `?` query entry, `filter[status]=open`).
    Map(Params),
}

impl ParamValue {
    /// Returns the value as a string slice if it is a [`ParamValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a list if it is a [`ParamValue::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the value as a nested map if it is a [`ParamValue::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true for the empty string, an empty list or an empty map.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<Params> for ParamValue {
    fn from(value: Params) -> Self {
        Self::Map(value)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => write!(f, "{map}"),
        }
    }
}

/// An ordered map of routing parameters.
///
/// Insertion order is kept for display and iteration; equality ignores it.
///
/// # Example
///
/// ```rust
/// use hodos_router::Params;
///
/// let params: Params = [("controller", "Articles"), ("action", "view"), ("id", "5")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(params.get_str("id"), Some("5"));
/// assert!(params.pass().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: IndexMap<String, ParamValue>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty parameter set with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a value, returning the previous value for the key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.inner.insert(key.into(), value.into())
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.inner.get(key)
    }

    /// Returns a mutable reference to the value for a key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParamValue> {
        self.inner.get_mut(key)
    }

    /// Returns the value for a key if it is a plain string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(ParamValue::as_str)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.inner.shift_remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Returns the passed arguments, or an empty slice.
    #[must_use]
    pub fn pass(&self) -> &[String] {
        self.get(keys::PASS)
            .and_then(ParamValue::as_list)
            .unwrap_or_default()
    }

    /// Returns the parsed query map stored under `?`, if any.
    #[must_use]
    pub fn query(&self) -> Option<&Params> {
        self.get(keys::QUERY).and_then(ParamValue::as_map)
    }

    /// Copies every entry of `defaults` whose key is not already present.
    pub fn merge_defaults(&mut self, defaults: &Params) {
        for (key, value) in &defaults.inner {
            if !self.inner.contains_key(key) {
                self.inner.insert(key.clone(), value.clone());
            }
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.inner.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = indexmap::map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.inner.insert(k.into(), v.into());
        }
    }
}
