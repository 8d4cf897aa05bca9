//! Attribute descriptors.
//!
//! An [`AttributeInfo`] is the engine's uniform summary of one attribute:
//! its kind, value type, nullability, default and access. The base shape is
//! the same for every kind; kind-specific data lives in [`InfoDetail`].
//!
//! Descriptors are immutable values. The `replace_*` operations return
//! modified copies and never touch the original.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use ormschema_core::{AttributeHandle, AttributeKind, RelationshipKind, TypeRef};

/// A default value, or the lack of one.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    /// No usable default: the field is required.
    #[default]
    NotProvided,
    /// A concrete value. `Value::Null` is a null default.
    Value(Value),
}

impl DefaultValue {
    #[must_use]
    pub const fn is_not_provided(&self) -> bool {
        matches!(self, DefaultValue::NotProvided)
    }

    /// The value, if provided.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            DefaultValue::NotProvided => None,
            DefaultValue::Value(v) => Some(v),
        }
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DefaultValue::NotProvided => serializer.serialize_none(),
            DefaultValue::Value(v) => v.serialize(serializer),
        }
    }
}

/// Builds an empty collection as a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultFactory {
    List,
    Set,
    Dict,
}

impl DefaultFactory {
    /// The empty value this factory produces, in JSON form.
    #[must_use]
    pub fn empty_value(self) -> Value {
        match self {
            DefaultFactory::List | DefaultFactory::Set => Value::Array(Vec::new()),
            DefaultFactory::Dict => Value::Object(serde_json::Map::new()),
        }
    }
}

/// What a collection-valued attribute's container turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionShape {
    List,
    Set,
    Dict,
    /// A custom container that could not be classified.
    Unknown,
}

impl CollectionShape {
    /// Wrap `item` into this container type.
    ///
    /// An unknown container yields `Union[List[item], Dict[Any, item]]`.
    #[must_use]
    pub fn wrap(self, item: TypeRef) -> TypeRef {
        match self {
            CollectionShape::List => TypeRef::list(item),
            CollectionShape::Set => TypeRef::set(item),
            CollectionShape::Dict => TypeRef::dict(TypeRef::Any, item),
            CollectionShape::Unknown => TypeRef::Union(vec![
                TypeRef::list(item.clone()),
                TypeRef::dict(TypeRef::Any, item),
            ]),
        }
    }

    /// Factory for the empty default, if the container is known.
    #[must_use]
    pub const fn default_factory(self) -> Option<DefaultFactory> {
        match self {
            CollectionShape::List => Some(DefaultFactory::List),
            CollectionShape::Set => Some(DefaultFactory::Set),
            CollectionShape::Dict => Some(DefaultFactory::Dict),
            CollectionShape::Unknown => None,
        }
    }
}

/// Kind-specific part of a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum InfoDetail {
    Column {
        primary_key: bool,
        foreign_key: Option<String>,
    },
    /// Plain and hybrid properties.
    Property {
        loads_attributes: Option<Vec<String>>,
    },
    Method,
    Composite {
        class_name: String,
    },
    Expression,
    /// Relationships and dynamic loaders.
    Relationship(RelationshipDetail),
    AssociationProxy(ProxyDetail),
    Custom {
        tag: String,
    },
}

/// Extra data of a relationship descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipDetail {
    /// Name of the target model in the registry.
    pub target_name: String,
    /// Type the target is exposed as. Starts as `Model(target_name)`.
    pub target: TypeRef,
    pub direction: RelationshipKind,
    pub uselist: bool,
    /// Container of a to-many relationship.
    pub collection: Option<CollectionShape>,
    pub viewonly: bool,
    pub back_populates: Option<String>,
}

/// Extra data of an association proxy descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyDetail {
    /// Local relationship the proxy goes through.
    pub relationship: String,
    /// Attribute read on the target.
    pub remote_attr: String,
    /// Descriptor of the remote attribute.
    pub remote: Box<AttributeInfo>,
    /// Type the proxied relationship's target is exposed as.
    pub target: TypeRef,
    pub collection: CollectionShape,
    pub scalar: bool,
}

impl ProxyDetail {
    /// Value type of the proxy for the given target and remote types.
    pub(crate) fn value_type(&self, remote_type: TypeRef) -> TypeRef {
        if self.scalar {
            return remote_type;
        }
        match self.collection {
            CollectionShape::Dict => TypeRef::dict(remote_type, self.target.clone()),
            shape => shape.wrap(remote_type),
        }
    }
}

/// Descriptor of one attribute.
#[derive(Clone, Serialize)]
pub struct AttributeInfo {
    /// The stored kind tag: one primitive kind, or `PROPERTY_RW`-like pairs.
    pub kind: AttributeKind,
    /// The raw attribute this was extracted from.
    #[serde(skip)]
    pub attribute: AttributeHandle,
    pub nullable: bool,
    pub readable: bool,
    pub writable: bool,
    /// Value type, never wrapped into `Optional`. See [`final_value_type`](Self::final_value_type).
    pub value_type: TypeRef,
    #[serde(skip_serializing_if = "DefaultValue::is_not_provided")]
    pub default: DefaultValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_factory: Option<DefaultFactory>,
    pub doc: Option<String>,
    pub detail: InfoDetail,
}

impl AttributeInfo {
    /// Base descriptor with no default, not nullable, read-only.
    pub fn new(
        kind: AttributeKind,
        attribute: &AttributeHandle,
        value_type: TypeRef,
        detail: InfoDetail,
    ) -> Self {
        Self {
            kind,
            attribute: Arc::clone(attribute),
            nullable: false,
            readable: true,
            writable: false,
            value_type,
            default: DefaultValue::NotProvided,
            default_factory: None,
            doc: None,
            detail,
        }
    }

    /// The type consumers should expose.
    ///
    /// Nullable attributes get `Optional[value_type]`, except to-many
    /// relationships: their container is never null, an empty collection
    /// stands for "nothing".
    #[must_use]
    pub fn final_value_type(&self) -> TypeRef {
        if self.nullable && !self.is_to_many() {
            self.value_type.clone().optional()
        } else {
            self.value_type.clone()
        }
    }

    /// True for relationships and dynamic loaders.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        matches!(self.detail, InfoDetail::Relationship(_))
    }

    /// True for collection-valued relationships.
    #[must_use]
    pub fn is_to_many(&self) -> bool {
        matches!(&self.detail, InfoDetail::Relationship(r) if r.uselist)
    }

    /// Relationship data, for relationships and dynamic loaders.
    #[must_use]
    pub fn relationship(&self) -> Option<&RelationshipDetail> {
        match &self.detail {
            InfoDetail::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// Proxy data, for association proxies.
    #[must_use]
    pub fn proxy(&self) -> Option<&ProxyDetail> {
        match &self.detail {
            InfoDetail::AssociationProxy(p) => Some(p),
            _ => None,
        }
    }

    /// True for a primary key column.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        matches!(self.detail, InfoDetail::Column { primary_key: true, .. })
    }

    #[must_use]
    pub fn is_one_to_many(&self) -> bool {
        self.relationship()
            .is_some_and(|r| r.direction == RelationshipKind::OneToMany)
    }

    #[must_use]
    pub fn is_many_to_one(&self) -> bool {
        self.relationship()
            .is_some_and(|r| r.direction == RelationshipKind::ManyToOne)
    }

    #[must_use]
    pub fn is_many_to_many(&self) -> bool {
        self.relationship()
            .is_some_and(|r| r.direction == RelationshipKind::ManyToMany)
    }

    /// Copy pointing at a different target type.
    ///
    /// For relationships, the value type is re-derived from the new target
    /// and the original container. For association proxies, the proxied
    /// relationship's target is replaced. Other kinds are returned unchanged.
    #[must_use]
    pub fn replace_model(&self, model: TypeRef) -> Self {
        let mut info = self.clone();
        match &mut info.detail {
            InfoDetail::Relationship(rel) => {
                rel.target = model.clone();
                info.value_type = match rel.collection {
                    Some(shape) if rel.uselist => shape.wrap(model),
                    _ => model,
                };
            }
            InfoDetail::AssociationProxy(proxy) => {
                proxy.target = model;
                info.value_type = proxy.value_type(proxy.remote.value_type.clone());
            }
            _ => {}
        }
        info
    }

    /// Copy of a proxy whose remote attribute points at a different model.
    ///
    /// Only meaningful when the remote attribute is itself a relationship.
    #[must_use]
    pub fn replace_remote_model(&self, model: TypeRef) -> Self {
        let mut info = self.clone();
        if let InfoDetail::AssociationProxy(proxy) = &mut info.detail {
            if proxy.remote.is_relationship() {
                let remote = proxy.remote.replace_model(model);
                info.value_type = proxy.value_type(remote.value_type.clone());
                proxy.remote = Box::new(remote);
            }
        }
        info
    }

    /// Copy with a different value type. Used to re-type composites.
    #[must_use]
    pub fn replace_value_type(&self, value_type: TypeRef) -> Self {
        let mut info = self.clone();
        info.value_type = value_type;
        info
    }
}

impl PartialEq for AttributeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && Arc::ptr_eq(&self.attribute, &other.attribute)
            && self.nullable == other.nullable
            && self.readable == other.readable
            && self.writable == other.writable
            && self.value_type == other.value_type
            && self.default == other.default
            && self.default_factory == other.default_factory
            && self.doc == other.doc
            && self.detail == other.detail
    }
}

impl fmt::Debug for AttributeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeInfo")
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("value_type", &self.value_type)
            .field("default", &self.default)
            .field("default_factory", &self.default_factory)
            .field("doc", &self.doc)
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}
