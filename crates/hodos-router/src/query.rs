//! Query string encoding.
//!
//! Bracketed keys nest one level: `tags[]=a&tags[]=b` becomes a list and
//! `filter[status]=open` becomes a map.

use crate::params::{ParamValue, Params};
use url::form_urlencoded;

/// Parses an `application/x-www-form-urlencoded` query string.
///
/// # Example
///
/// ```rust
/// use hodos_router::query::parse_query;
///
/// let query = parse_query("a=1&b[]=2&b[]=3&c[x]=4");
/// assert_eq!(query.get_str("a"), Some("1"));
/// assert_eq!(query.get("b").and_then(|v| v.as_list()).map(<[String]>::len), Some(2));
/// ```
#[must_use]
pub fn parse_query(query: &str) -> Params {
    let mut params = Params::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        insert_pair(&mut params, &key, value.into_owned());
    }
    params
}

fn insert_pair(params: &mut Params, key: &str, value: String) {
    let bracket = key
        .find('[')
        .filter(|&open| open > 0 && key.ends_with(']'));

    let Some(open) = bracket else {
        params.insert(key, value);
        return;
    };

    let base = &key[..open];
    let inner = &key[open + 1..key.len() - 1];

    if inner.is_empty() {
        match params.get_mut(base) {
            Some(ParamValue::List(items)) => items.push(value),
            _ => {
                params.insert(base, vec![value]);
            }
        }
    } else {
        match params.get_mut(base) {
            Some(ParamValue::Map(map)) => {
                map.insert(inner, value);
            }
            _ => {
                let mut map = Params::new();
                map.insert(inner, value);
                params.insert(base, map);
            }
        }
    }
}

/// Encodes parameters as a query string, without the leading `?`.
#[must_use]
pub fn build_query(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &ParamValue) {
    match value {
        ParamValue::Str(s) => {
            serializer.append_pair(key, s);
        }
        ParamValue::List(items) => {
            let name = format!("{key}[]");
            for item in items {
                serializer.append_pair(&name, item);
            }
        }
        ParamValue::Map(map) => {
            for (inner, nested) in map {
                append(serializer, &format!("{key}[{inner}]"), nested);
            }
        }
    }
}
