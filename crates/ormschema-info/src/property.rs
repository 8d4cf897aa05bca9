//! Properties that declare what they read.
//!
//! A computed property that lists the stored attributes its getter reads can
//! be evaluated on a partially loaded object without triggering a load, as
//! long as every listed attribute is loaded. That is what the loaded-only
//! dump relies on.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use indexmap::{IndexMap, IndexSet};

use ormschema_core::{
    AttrValue, Error, Getter, Instance, ModelClass, ModelRef, PropertyAttr, RawAttribute, Result,
};

use crate::inspector::Inspector;

/// The attributes a property reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadsAttributes {
    names: Vec<String>,
}

impl LoadsAttributes {
    /// Take the author's word for it.
    pub fn declare<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Find out by running the getter against a recording object.
    ///
    /// Every attribute the getter asks for is recorded; each read returns
    /// `null`. A getter that fails halfway still reports what it read so far.
    pub fn traced(getter: &Getter) -> Self {
        let recorder = RecordingInstance::new();
        let _ = getter(&recorder);
        Self {
            names: recorder.reads().into_iter().collect(),
        }
    }

    /// Declare, and verify the declaration against a trace of the getter.
    ///
    /// Fails with `Error::LoadsAttributesMismatch` listing every name found
    /// on one side only.
    pub fn checked<I, S>(property: &str, names: I, getter: &Getter) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared = Self::declare(names);
        let traced = Self::traced(getter);

        let declared_set: BTreeSet<&String> = declared.names.iter().collect();
        let traced_set: BTreeSet<&String> = traced.names.iter().collect();
        let mismatch: Vec<String> = declared_set
            .symmetric_difference(&traced_set)
            .map(|name| (*name).clone())
            .collect();

        if mismatch.is_empty() {
            Ok(declared)
        } else {
            Err(Error::LoadsAttributesMismatch {
                property: property.to_string(),
                mismatch,
            })
        }
    }

    /// The names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Record these names on a property.
    #[must_use]
    pub fn apply(self, property: PropertyAttr) -> PropertyAttr {
        property.loads_attributes(self.names)
    }
}

/// Stand-in object that remembers which attributes were read.
struct RecordingInstance {
    reads: RefCell<IndexSet<String>>,
}

impl RecordingInstance {
    fn new() -> Self {
        Self {
            reads: RefCell::new(IndexSet::new()),
        }
    }

    fn reads(&self) -> IndexSet<String> {
        self.reads.borrow().clone()
    }
}

fn recording_model() -> &'static ModelRef {
    static MODEL: OnceLock<ModelRef> = OnceLock::new();
    MODEL.get_or_init(|| ModelClass::builder("<recording>").build())
}

impl Instance for RecordingInstance {
    fn model(&self) -> &ModelRef {
        recording_model()
    }

    fn is_loaded(&self, _name: &str) -> bool {
        true
    }

    fn loaded_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    fn get(&self, name: &str) -> Result<AttrValue> {
        self.reads.borrow_mut().insert(name.to_string());
        Ok(AttrValue::null())
    }

    fn fetch(&self, name: &str) -> Result<AttrValue> {
        self.get(name)
    }
}

impl Inspector {
    /// Readable properties that declare what they read, with their declarations.
    pub fn safe_properties(&self, model: &ModelRef) -> Result<Arc<IndexMap<String, Vec<String>>>> {
        self.safe_properties.get_or_try_insert_with(model, || {
            let attributes = self.all_attributes(model)?;
            Ok(attributes
                .iter()
                .filter_map(|(name, handle)| match handle.as_ref() {
                    RawAttribute::Property(prop) | RawAttribute::HybridProperty(prop)
                        if prop.is_readable() =>
                    {
                        prop.loads_attributes
                            .clone()
                            .map(|names| (name.clone(), names))
                    }
                    _ => None,
                })
                .collect())
        })
    }

    /// Can the property be read without loading anything?
    ///
    /// True only for a property that declares what it reads, when all of
    /// that is loaded on `instance`.
    pub fn is_safe_to_evaluate(&self, instance: &dyn Instance, name: &str) -> Result<bool> {
        let safe = self.safe_properties(instance.model())?;
        Ok(safe
            .get(name)
            .is_some_and(|reads| reads.iter().all(|attr| instance.is_loaded(attr))))
    }
}
