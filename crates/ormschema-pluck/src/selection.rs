//! Selection maps.
//!
//! A selection map says which attributes to pluck: `1` to include, `0` to
//! skip, a nested map to descend into a relationship or a JSON document.
//!
//! ```
//! use ormschema_pluck::PluckMap;
//! use serde_json::json;
//!
//! let map = PluckMap::from_json(&json!({
//!     "id": 1,
//!     "login": 1,
//!     "articles": {"id": 1, "title": 1},
//! })).unwrap();
//! assert_eq!(map.len(), 3);
//! ```

use indexmap::IndexMap;
use serde_json::Value;

use ormschema_core::{Error, Result};

/// What to do with one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Include {
    /// `1` (true) to include, `0` (false) to skip.
    Flag(bool),
    /// Descend, selecting with the nested map.
    Nested(PluckMap),
}

impl Include {
    /// True unless this is an explicit `0`. An empty nested map counts as included.
    #[must_use]
    pub const fn is_included(&self) -> bool {
        !matches!(self, Include::Flag(false))
    }
}

impl From<bool> for Include {
    fn from(value: bool) -> Self {
        Include::Flag(value)
    }
}

impl From<PluckMap> for Include {
    fn from(map: PluckMap) -> Self {
        Include::Nested(map)
    }
}

/// An ordered selection map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PluckMap {
    entries: IndexMap<String, Include>,
}

impl PluckMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a key.
    #[must_use]
    pub fn include(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), Include::Flag(true));
        self
    }

    /// Explicitly skip a key.
    #[must_use]
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), Include::Flag(false));
        self
    }

    /// Descend into a key.
    #[must_use]
    pub fn nested(mut self, key: impl Into<String>, map: PluckMap) -> Self {
        self.entries.insert(key.into(), Include::Nested(map));
        self
    }

    /// Parse from JSON: numbers and booleans are flags (non-zero includes),
    /// objects are nested maps.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::MalformedSelection {
                attribute: String::new(),
                reason: format!("expected an object, got {value}"),
            });
        };

        let mut entries = IndexMap::with_capacity(object.len());
        for (key, include) in object {
            let include = match include {
                Value::Bool(b) => Include::Flag(*b),
                Value::Number(n) => Include::Flag(n.as_f64().is_some_and(|f| f != 0.0)),
                Value::Object(_) => Include::Nested(Self::from_json(include)?),
                other => {
                    return Err(Error::MalformedSelection {
                        attribute: key.clone(),
                        reason: format!("expected 0, 1 or an object, got {other}"),
                    });
                }
            };
            entries.insert(key.clone(), include);
        }
        Ok(Self { entries })
    }

    /// Entries, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Include)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Include> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nesting depth: 1 for a flat map, 0 for an empty one.
    pub fn depth(&self) -> usize {
        self.entries
            .values()
            .map(|include| match include {
                Include::Flag(_) => 1,
                Include::Nested(map) => 1 + map.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl<K: Into<String>> FromIterator<(K, Include)> for PluckMap {
    fn from_iter<T: IntoIterator<Item = (K, Include)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl TryFrom<Value> for PluckMap {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(&value)
    }
}
