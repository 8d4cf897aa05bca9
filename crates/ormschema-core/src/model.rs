//! Mapped-class metadata and the model registry.
//!
//! A [`ModelClass`] is what the ORM knows about one class: its table, its
//! parent in an inheritance hierarchy, and its own attributes in declaration
//! order. Classes are immutable once built and shared as [`ModelRef`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::attribute::{
    AttributeHandle, ColumnAttr, CompositeAttr, CustomAttr, ExpressionAttr, MethodAttr,
    PropertyAttr, ProxyAttr, RawAttribute, RelationshipAttr,
};
use crate::error::{Error, Result};

/// Shared handle to a mapped class.
pub type ModelRef = Arc<ModelClass>;

/// Identity of a model class, usable as a cache key.
///
/// Two keys are equal only if they come from the same `ModelRef` allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey(usize);

impl ModelKey {
    /// Key of the given class.
    #[must_use]
    pub fn of(model: &ModelRef) -> Self {
        Self(Arc::as_ptr(model) as usize)
    }
}

/// Metadata of one mapped class.
pub struct ModelClass {
    name: String,
    table: Option<String>,
    parent: Option<ModelRef>,
    attributes: IndexMap<String, AttributeHandle>,
    primary_key: Vec<String>,
    doc: Option<String>,
}

impl ModelClass {
    /// Start building a class.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            table: None,
            parent: None,
            attributes: IndexMap::new(),
            primary_key: Vec::new(),
            doc: None,
        }
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own table, if any. Single-table inheritance subclasses have none.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Parent class.
    pub fn parent(&self) -> Option<&ModelRef> {
        self.parent.as_ref()
    }

    /// Documentation string.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Attributes declared on this class itself, in declaration order.
    pub fn own_attributes(&self) -> &IndexMap<String, AttributeHandle> {
        &self.attributes
    }

    /// True if the class, or one of its ancestors, is mapped to a table.
    pub fn is_mapped(&self) -> bool {
        self.table.is_some() || self.parent.as_ref().is_some_and(|p| p.is_mapped())
    }

    /// Fail with [`Error::UnmappedClass`] unless the class is mapped.
    pub fn ensure_mapped(&self) -> Result<()> {
        if self.is_mapped() {
            Ok(())
        } else {
            Err(Error::UnmappedClass {
                model: self.name.clone(),
            })
        }
    }

    /// Ancestors, root first, ending with this class.
    pub fn lineage(&self) -> Vec<&ModelClass> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            chain.push(class);
            current = class.parent.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Look up an attribute on this class or its ancestors.
    ///
    /// An attribute redeclared in a subclass shadows the inherited one.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeHandle> {
        self.attributes
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.find_attribute(name)))
    }

    /// Look up an attribute, failing with [`Error::NoSuchAttribute`].
    pub fn attribute(&self, name: &str) -> Result<&AttributeHandle> {
        self.find_attribute(name).ok_or_else(|| Error::NoSuchAttribute {
            model: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// Primary key column names, in declaration order.
    ///
    /// Uses the explicit list when one was given; otherwise collects the
    /// columns flagged as primary key, inherited ones first.
    pub fn primary_key_names(&self) -> Vec<String> {
        if !self.primary_key.is_empty() {
            return self.primary_key.clone();
        }
        if let Some(parent) = &self.parent {
            let inherited = parent.primary_key_names();
            if !inherited.is_empty() {
                return inherited;
            }
        }
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.as_column().is_some_and(|c| c.primary_key))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True if `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &ModelClass) -> bool {
        std::ptr::eq(self, other) || self.parent.as_ref().is_some_and(|p| p.is_subclass_of(other))
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ModelClass`].
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    table: Option<String>,
    parent: Option<ModelRef>,
    attributes: IndexMap<String, AttributeHandle>,
    primary_key: Vec<String>,
    doc: Option<String>,
}

impl ModelBuilder {
    /// Map the class to a table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Inherit from `parent`.
    #[must_use]
    pub fn parent(mut self, parent: &ModelRef) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Set the primary key explicitly.
    #[must_use]
    pub fn primary_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declare any raw attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attr: RawAttribute) -> Self {
        self.attributes.insert(name.into(), attr.into_handle());
        self
    }

    /// Declare an attribute from an existing handle, keeping its identity.
    #[must_use]
    pub fn handle(mut self, name: impl Into<String>, handle: &AttributeHandle) -> Self {
        self.attributes.insert(name.into(), Arc::clone(handle));
        self
    }

    #[must_use]
    pub fn column(self, name: impl Into<String>, column: ColumnAttr) -> Self {
        self.attribute(name, RawAttribute::Column(column))
    }

    #[must_use]
    pub fn property(self, name: impl Into<String>, property: PropertyAttr) -> Self {
        self.attribute(name, RawAttribute::Property(property))
    }

    #[must_use]
    pub fn hybrid_property(self, name: impl Into<String>, property: PropertyAttr) -> Self {
        self.attribute(name, RawAttribute::HybridProperty(property))
    }

    #[must_use]
    pub fn hybrid_method(self, name: impl Into<String>, method: MethodAttr) -> Self {
        self.attribute(name, RawAttribute::HybridMethod(method))
    }

    #[must_use]
    pub fn composite(self, name: impl Into<String>, composite: CompositeAttr) -> Self {
        self.attribute(name, RawAttribute::Composite(composite))
    }

    #[must_use]
    pub fn relationship(self, name: impl Into<String>, relationship: RelationshipAttr) -> Self {
        self.attribute(name, RawAttribute::Relationship(relationship))
    }

    #[must_use]
    pub fn association_proxy(self, name: impl Into<String>, proxy: ProxyAttr) -> Self {
        self.attribute(name, RawAttribute::AssociationProxy(proxy))
    }

    #[must_use]
    pub fn expression(self, name: impl Into<String>, expression: ExpressionAttr) -> Self {
        self.attribute(name, RawAttribute::Expression(expression))
    }

    #[must_use]
    pub fn custom(self, name: impl Into<String>, custom: CustomAttr) -> Self {
        self.attribute(name, RawAttribute::Custom(custom))
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ModelRef {
        Arc::new(ModelClass {
            name: self.name,
            table: self.table,
            parent: self.parent,
            attributes: self.attributes,
            primary_key: self.primary_key,
            doc: self.doc,
        })
    }
}

/// Catalogue of mapped classes, by name.
///
/// Relationship targets are declared by name and resolved here.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: IndexMap<String, ModelRef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class, replacing any class with the same name.
    pub fn register(&mut self, model: &ModelRef) -> &mut Self {
        self.models
            .insert(model.name().to_string(), Arc::clone(model));
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, model: &ModelRef) -> Self {
        self.register(model);
        self
    }

    /// Find a class by name.
    pub fn get(&self, name: &str) -> Option<&ModelRef> {
        self.models.get(name)
    }

    /// Find a class by name, failing with [`Error::UnknownModel`].
    pub fn resolve(&self, name: &str) -> Result<&ModelRef> {
        self.get(name).ok_or_else(|| Error::UnknownModel {
            model: name.to_string(),
        })
    }

    /// All classes, in registration order.
    pub fn models(&self) -> impl Iterator<Item = &ModelRef> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
