//! Route keys for reverse lookup.
//!
//! Every route is filed under a [`RouteKey`] built from the four naming
//! axes: prefix, plugin, controller and action. A lookup derives an ordered
//! list of candidate keys from the caller's parameters, crossing concrete
//! values with wildcards so generic routes are still found by specific
//! lookups.
//!
//! ```text
//! params {prefix: admin, controller: posts, action: index}
//!
//!   admin:posts:index        most specific
//!   admin:posts:_action
//!   admin:_controller:index
//!   admin:_controller:_action
//!   _prefix:posts:index
//!   ...
//!   _prefix:_controller:_action   least specific
//! ```

use crate::params::{keys, Params};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of candidate keys (both prefix and plugin present).
const MAX_CANDIDATES: usize = 16;

/// Candidate keys in lookup order.
pub type CandidateKeys = SmallVec<[RouteKey; MAX_CANDIDATES]>;

/// One axis of a [`RouteKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// The axis plays no part in the key.
    Absent,
    /// Any value is accepted (the template has a `:axis` element).
    Any,
    /// A fixed, lowercased value.
    Value(String),
}

impl Segment {
    fn lowered(value: &str) -> Self {
        Self::Value(value.to_lowercase())
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, axis: &str, glue: &str) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Any => write!(f, "_{axis}{glue}"),
            Self::Value(value) => write!(f, "{value}{glue}"),
        }
    }
}

/// The derived reverse-lookup key of a route.
///
/// Renders with the colon/dot grammar: `admin:blog.posts:index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// Routing prefix (`admin`).
    pub prefix: Segment,
    /// Plugin name (`blog`).
    pub plugin: Segment,
    /// Controller name (`posts`).
    pub controller: Segment,
    /// Action name (`index`).
    pub action: Segment,
}

impl RouteKey {
    /// Derives the key of a route from its template elements and defaults.
    ///
    /// An axis is a wildcard when the template has an element of that name,
    /// the lowercased default when one is set, and absent otherwise.
    pub fn for_route<'a>(elements: impl IntoIterator<Item = &'a str>, defaults: &Params) -> Self {
        let elements: Vec<&str> = elements.into_iter().collect();
        let axis = |name: &str| {
            if elements.contains(&name) {
                Segment::Any
            } else if let Some(value) = defaults.get_str(name) {
                Segment::lowered(value)
            } else {
                Segment::Absent
            }
        };

        Self {
            prefix: axis(keys::PREFIX),
            plugin: axis(keys::PLUGIN),
            controller: axis(keys::CONTROLLER),
            action: axis(keys::ACTION),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.prefix.write(f, keys::PREFIX, ":")?;
        self.plugin.write(f, keys::PLUGIN, ".")?;
        self.controller.write(f, keys::CONTROLLER, ":")?;
        self.action.write(f, keys::ACTION, "")
    }
}

/// Derives the ordered candidate keys for reverse lookup.
///
/// The result always has 4, 8, 8 or 16 entries depending on whether a
/// plugin and/or prefix is present. A missing controller or action counts
/// as the empty value.
pub fn candidate_keys(params: &Params) -> CandidateKeys {
    let value = |key: &str| params.get_str(key).unwrap_or_default().to_lowercase();
    let optional = |key: &str| {
        params
            .get_str(key)
            .filter(|v| !v.is_empty())
            .map(Segment::lowered)
    };

    let choices = |concrete: Option<Segment>| -> SmallVec<[Segment; 2]> {
        match concrete {
            Some(concrete) => smallvec::smallvec![concrete, Segment::Any],
            None => smallvec::smallvec![Segment::Absent],
        }
    };

    let prefixes = choices(optional(keys::PREFIX));
    let plugins = choices(optional(keys::PLUGIN));
    let controllers = choices(Some(Segment::Value(value(keys::CONTROLLER))));
    let actions = choices(Some(Segment::Value(value(keys::ACTION))));

    let mut out = CandidateKeys::new();
    for prefix in &prefixes {
        for plugin in &plugins {
            for controller in &controllers {
                for action in &actions {
                    out.push(RouteKey {
                        prefix: prefix.clone(),
                        plugin: plugin.clone(),
                        controller: controller.clone(),
                        action: action.clone(),
                    });
                }
            }
        }
    }
    out
}
