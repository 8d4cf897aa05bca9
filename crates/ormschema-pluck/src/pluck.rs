//! The pluck engine.

use serde_json::{Map, Value};

use ormschema_core::{AttrValue, Error, Instance, RawAttribute, Result};
use ormschema_info::Inspector;

use crate::selection::{Include, PluckMap};

/// Log target for pluck warnings.
pub const LOG_TARGET: &str = "ormschema::pluck";

/// What to do with a selected attribute that is not loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unloaded {
    /// Fail with `Error::AttributeNotLoaded`.
    Raise,
    /// Use `null`; an empty list for to-many relationships.
    Null,
    /// Load it.
    #[default]
    Lazy,
    /// Load it, and log a warning: this is an N+1 in the making.
    LazyWarn,
    /// Leave the key out of the result.
    Skip,
}

/// Plucks instances with one inspector and one unloaded-attribute policy.
#[derive(Debug, Clone, Copy)]
pub struct Plucker<'a> {
    inspector: &'a Inspector,
    unloaded: Unloaded,
}

impl<'a> Plucker<'a> {
    /// A plucker with the default policy, [`Unloaded::Lazy`].
    pub fn new(inspector: &'a Inspector) -> Self {
        Self {
            inspector,
            unloaded: Unloaded::default(),
        }
    }

    /// Set the unloaded-attribute policy.
    #[must_use]
    pub const fn unloaded(mut self, policy: Unloaded) -> Self {
        self.unloaded = policy;
        self
    }

    /// Copy the selected attributes of `instance` into a JSON object.
    ///
    /// Recursion follows the selection map only, so a finite map terminates
    /// even on cyclic object graphs.
    pub fn pluck(&self, instance: &dyn Instance, map: &PluckMap) -> Result<Value> {
        let model = instance.model();
        let attributes = self.inspector.all_attributes(model)?;

        let mut out = Map::new();
        for (key, include) in map.iter() {
            if !include.is_included() {
                continue;
            }

            let attr = attributes.get(key).ok_or_else(|| Error::NoSuchAttribute {
                model: model.name().to_string(),
                attribute: key.to_string(),
            })?;
            let relationship = attr.as_relationship();
            if relationship.is_some() && matches!(include, Include::Flag(_)) {
                return Err(relationship_needs_map(key));
            }

            let value = if attr.is_storage_backed() && !instance.is_loaded(key) {
                match self.unloaded {
                    Unloaded::Raise => {
                        return Err(Error::AttributeNotLoaded {
                            model: model.name().to_string(),
                            attribute: key.to_string(),
                        });
                    }
                    Unloaded::Null => {
                        let to_many = relationship.is_some_and(|r| r.uselist());
                        out.insert(key.to_string(), empty_for(to_many));
                        continue;
                    }
                    Unloaded::Skip => {
                        tracing::debug!(
                            target: LOG_TARGET,
                            model = model.name(),
                            attribute = key,
                            "skipping unloaded attribute"
                        );
                        continue;
                    }
                    Unloaded::Lazy => instance.fetch(key)?,
                    Unloaded::LazyWarn => {
                        tracing::warn!(
                            target: LOG_TARGET,
                            model = model.name(),
                            attribute = key,
                            "plucking unloaded attribute triggers a lazy load"
                        );
                        instance.fetch(key)?
                    }
                }
            } else {
                instance.get(key)?
            };

            let plucked = self.convert(key, attr, value, include)?;
            out.insert(key.to_string(), plucked);
        }
        Ok(Value::Object(out))
    }

    fn convert(
        &self,
        key: &str,
        attr: &RawAttribute,
        value: AttrValue,
        include: &Include,
    ) -> Result<Value> {
        match (value, include) {
            (AttrValue::Scalar(Value::Null), _) if attr.as_relationship().is_some() => {
                Ok(empty_for(attr.as_relationship().is_some_and(|r| r.uselist())))
            }
            (AttrValue::Scalar(value @ Value::Object(_)), Include::Nested(map)) => {
                Ok(pluck_dict(&value, map))
            }
            (AttrValue::Scalar(value), _) => Ok(value),
            (AttrValue::Object(_) | AttrValue::Collection(_), Include::Flag(_)) => {
                Err(relationship_needs_map(key))
            }
            (AttrValue::Object(None), Include::Nested(_)) => Ok(Value::Null),
            (AttrValue::Object(Some(related)), Include::Nested(map)) => {
                self.pluck(related.as_ref(), map)
            }
            (AttrValue::Collection(items), Include::Nested(map)) => items
                .unwrap_or_default()
                .into_iter()
                .map(|item| self.pluck(item.as_ref(), map))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }
}

/// Pluck `instance` with `map` under the given policy.
///
/// Shortcut for [`Plucker::pluck`].
pub fn pluck(
    inspector: &Inspector,
    instance: &dyn Instance,
    map: &PluckMap,
    unloaded: Unloaded,
) -> Result<Value> {
    Plucker::new(inspector).unloaded(unloaded).pluck(instance, map)
}

/// Pluck a plain JSON document.
///
/// Keys missing from the document are skipped, and so are nested maps
/// applied to non-object values: plain data is selected forgivingly.
pub fn pluck_dict(value: &Value, map: &PluckMap) -> Value {
    let Value::Object(object) = value else {
        return value.clone();
    };
    let plucked = map
        .iter()
        .filter(|(_, include)| include.is_included())
        .filter_map(|(key, include)| {
            let item = object.get(key)?;
            let item = match (item, include) {
                (Value::Object(_), Include::Nested(nested)) => pluck_dict(item, nested),
                _ => item.clone(),
            };
            Some((key.to_string(), item))
        })
        .collect();
    Value::Object(plucked)
}

fn empty_for(to_many: bool) -> Value {
    if to_many {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}

fn relationship_needs_map(key: &str) -> Error {
    Error::MalformedSelection {
        attribute: key.to_string(),
        reason: "a relationship must be selected with a nested map, not a flag".to_string(),
    }
}
