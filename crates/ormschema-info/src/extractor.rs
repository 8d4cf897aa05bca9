//! Per-kind extraction strategies.
//!
//! An [`Extractor`] knows one family of attribute kinds: it declares which
//! kinds it builds, tells whether a raw attribute is one of them, and builds
//! the descriptor. The [`ExtractorRegistry`] holds the built-in strategies
//! and any registered by the application.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use ormschema_core::{
    AttributeHandle, AttributeKind, CollectionClass, ColumnAttr, ColumnDefault, Error, Loader,
    ModelRef, PropertyAttr, RawAttribute, Result, TypeRef,
};

use crate::descriptor::{
    AttributeInfo, CollectionShape, DefaultValue, InfoDetail, ProxyDetail, RelationshipDetail,
};
use crate::inspector::Inspector;

/// What an extractor may look at while building a descriptor.
pub struct ExtractContext<'a> {
    /// For resolving other models and their attributes.
    pub inspector: &'a Inspector,
    /// The class the attribute belongs to.
    pub model: &'a ModelRef,
    /// (model, attribute) pairs being extracted, outermost first.
    pub(crate) trail: Vec<(String, String)>,
}

impl ExtractContext<'_> {
    /// Descriptor of an attribute of another class, for extractors that
    /// derive their type from it.
    ///
    /// Fails with `Error::UnsupportedAttribute` when the lookup leads back
    /// to an attribute already being extracted.
    pub fn related_info(&self, model: &ModelRef, name: &str) -> Result<AttributeInfo> {
        self.inspector.attribute_info_within(model, name, &self.trail)
    }
}

/// A strategy for one family of attribute kinds.
pub trait Extractor: Send + Sync {
    /// Category name, e.g. `"column"`.
    fn name(&self) -> &'static str;

    /// Every kind this extractor may produce.
    fn extracts(&self) -> AttributeKind;

    /// Is `attr` one of the requested `kinds`, as far as this extractor is concerned?
    fn matches(&self, attr: &RawAttribute, kinds: AttributeKind) -> bool;

    /// Build the descriptor. Only called when [`matches`](Self::matches) said yes.
    fn extract(&self, cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo>;
}

/// The set of known extractors.
///
/// Starts with one built-in extractor per kind family. Applications add
/// their own for [`AttributeKind::APPLICATION_CUSTOM`] attributes.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// The built-in extractors.
    pub fn builtin() -> Self {
        Self {
            extractors: vec![
                Arc::new(ColumnExtractor),
                Arc::new(PropertyExtractor),
                Arc::new(HybridPropertyExtractor),
                Arc::new(HybridMethodExtractor),
                Arc::new(CompositeExtractor),
                Arc::new(ExpressionExtractor),
                Arc::new(RelationshipExtractor),
                Arc::new(DynamicLoaderExtractor),
                Arc::new(AssociationProxyExtractor),
            ],
        }
    }

    /// No extractors at all.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Add an extractor.
    pub fn register(&mut self, extractor: impl Extractor + 'static) -> &mut Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, extractor: impl Extractor + 'static) -> Self {
        self.register(extractor);
        self
    }

    /// All extractors, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Extractor>> {
        self.extractors.iter()
    }

    /// Extractors that may produce any of `kinds`.
    pub fn for_kinds(&self, kinds: AttributeKind) -> impl Iterator<Item = &Arc<dyn Extractor>> {
        self.extractors
            .iter()
            .filter(move |e| e.extracts().intersects(kinds))
    }

    /// The first extractor that claims `attr` for `kinds`.
    pub fn find(&self, attr: &RawAttribute, kinds: AttributeKind) -> Option<&Arc<dyn Extractor>> {
        self.for_kinds(kinds).find(|e| e.matches(attr, kinds))
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.name()))
            .finish()
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Stored columns.
#[derive(Debug, Clone, Copy)]
pub struct ColumnExtractor;

/// Normalize a column default.
///
/// Callables and server-side expressions are never evaluated; a null default
/// is meaningless on a non-nullable column; a nullable column without a
/// default defaults to null.
pub fn column_default(column: &ColumnAttr) -> DefaultValue {
    match &column.default {
        ColumnDefault::Callable(_) | ColumnDefault::Sql(_) => DefaultValue::NotProvided,
        ColumnDefault::Value(Value::Null) | ColumnDefault::None => {
            if column.nullable {
                DefaultValue::Value(Value::Null)
            } else {
                DefaultValue::NotProvided
            }
        }
        ColumnDefault::Value(v) => DefaultValue::Value(v.clone()),
    }
}

impl Extractor for ColumnExtractor {
    fn name(&self) -> &'static str {
        "column"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::COLUMN
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::Column(_))
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::Column(column) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        let mut info = AttributeInfo::new(
            AttributeKind::COLUMN,
            attr,
            column.sql_type.value_type(),
            InfoDetail::Column {
                primary_key: column.primary_key,
                foreign_key: column.foreign_key.clone(),
            },
        );
        info.nullable = column.nullable;
        info.writable = true;
        info.default = column_default(column);
        info.doc.clone_from(&column.doc);
        Ok(info)
    }
}

// ============================================================================
// Properties and methods
// ============================================================================

/// Shared rules of plain and hybrid properties.
fn property_info(
    attr: &AttributeHandle,
    prop: &PropertyAttr,
    readable_kind: AttributeKind,
    writable_kind: AttributeKind,
) -> AttributeInfo {
    let declared = prop.returns.clone().unwrap_or(TypeRef::Any);
    // unannotated means unknown, and unknown may be null
    let nullable = declared.is_optional();
    let value_type = if nullable {
        declared.unwrap_optional()
    } else {
        declared
    };

    let mut kind = AttributeKind::NONE;
    if prop.is_readable() {
        kind |= readable_kind;
    }
    if prop.setter {
        kind |= writable_kind;
    }

    let mut info = AttributeInfo::new(
        kind,
        attr,
        value_type,
        InfoDetail::Property {
            loads_attributes: prop.loads_attributes.clone(),
        },
    );
    info.nullable = nullable;
    info.readable = prop.is_readable();
    info.writable = prop.setter;
    info.default = prop
        .setter_default
        .clone()
        .map_or(DefaultValue::NotProvided, DefaultValue::Value);
    info.doc.clone_from(&prop.doc);
    info
}

fn property_matches(
    prop: &PropertyAttr,
    kinds: AttributeKind,
    readable_kind: AttributeKind,
    writable_kind: AttributeKind,
) -> bool {
    (kinds.intersects(readable_kind) && prop.is_readable())
        || (kinds.intersects(writable_kind) && prop.setter)
}

/// Plain computed properties.
#[derive(Debug, Clone, Copy)]
pub struct PropertyExtractor;

impl Extractor for PropertyExtractor {
    fn name(&self) -> &'static str {
        "property"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::PROPERTY_RW
    }

    fn matches(&self, attr: &RawAttribute, kinds: AttributeKind) -> bool {
        match attr {
            RawAttribute::Property(prop) => property_matches(
                prop,
                kinds,
                AttributeKind::PROPERTY_R,
                AttributeKind::PROPERTY_W,
            ),
            _ => false,
        }
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::Property(prop) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        Ok(property_info(
            attr,
            prop,
            AttributeKind::PROPERTY_R,
            AttributeKind::PROPERTY_W,
        ))
    }
}

/// Hybrid properties. Same rules as plain properties, different kinds.
#[derive(Debug, Clone, Copy)]
pub struct HybridPropertyExtractor;

impl Extractor for HybridPropertyExtractor {
    fn name(&self) -> &'static str {
        "hybrid_property"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::HYBRID_PROPERTY_RW
    }

    fn matches(&self, attr: &RawAttribute, kinds: AttributeKind) -> bool {
        match attr {
            RawAttribute::HybridProperty(prop) => property_matches(
                prop,
                kinds,
                AttributeKind::HYBRID_PROPERTY_R,
                AttributeKind::HYBRID_PROPERTY_W,
            ),
            _ => false,
        }
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::HybridProperty(prop) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        Ok(property_info(
            attr,
            prop,
            AttributeKind::HYBRID_PROPERTY_R,
            AttributeKind::HYBRID_PROPERTY_W,
        ))
    }
}

/// Computed methods.
#[derive(Debug, Clone, Copy)]
pub struct HybridMethodExtractor;

impl Extractor for HybridMethodExtractor {
    fn name(&self) -> &'static str {
        "hybrid_method"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::HYBRID_METHOD
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::HybridMethod(_))
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::HybridMethod(method) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        let value_type = method.returns.clone().unwrap_or(TypeRef::Any);
        let mut info = AttributeInfo::new(
            AttributeKind::HYBRID_METHOD,
            attr,
            value_type,
            InfoDetail::Method,
        );
        info.nullable = info.value_type.is_optional();
        info.doc.clone_from(&method.doc);
        Ok(info)
    }
}

// ============================================================================
// Composites and expressions
// ============================================================================

/// Multi-column composites.
#[derive(Debug, Clone, Copy)]
pub struct CompositeExtractor;

impl Extractor for CompositeExtractor {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::COMPOSITE
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::Composite(_))
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::Composite(composite) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        let mut info = AttributeInfo::new(
            AttributeKind::COMPOSITE,
            attr,
            TypeRef::Class(composite.class_name.clone()),
            InfoDetail::Composite {
                class_name: composite.class_name.clone(),
            },
        );
        info.writable = true;
        info.doc.clone_from(&composite.doc);
        Ok(info)
    }
}

/// SQL expressions.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionExtractor;

impl Extractor for ExpressionExtractor {
    fn name(&self) -> &'static str {
        "expression"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::EXPRESSION
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::Expression(_))
    }

    fn extract(&self, _cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::Expression(expr) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };
        let mut info = AttributeInfo::new(
            AttributeKind::EXPRESSION,
            attr,
            expr.sql_type.value_type(),
            InfoDetail::Expression,
        );
        // nothing proves an arbitrary expression is never null
        info.nullable = true;
        info.doc.clone_from(&expr.doc);
        Ok(info)
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// Classify a declared collection class.
///
/// A custom class is instantiated to see what it builds; if that fails, or
/// builds something that is neither a list nor a mapping, the shape is
/// [`CollectionShape::Unknown`].
pub fn collection_shape(class: &CollectionClass) -> CollectionShape {
    match class {
        CollectionClass::List => CollectionShape::List,
        CollectionClass::Set => CollectionShape::Set,
        CollectionClass::Dict => CollectionShape::Dict,
        CollectionClass::Custom { name, factory } => match factory() {
            Ok(Value::Array(_)) => CollectionShape::List,
            Ok(Value::Object(_)) => CollectionShape::Dict,
            Ok(_) => CollectionShape::Unknown,
            Err(err) => {
                tracing::debug!(
                    collection_class = name.as_str(),
                    error = %err,
                    "collection factory failed, value type left ambiguous"
                );
                CollectionShape::Unknown
            }
        },
    }
}

fn relationship_info(
    kind: AttributeKind,
    cx: &ExtractContext<'_>,
    attr: &AttributeHandle,
) -> Result<AttributeInfo> {
    let RawAttribute::Relationship(rel) = attr.as_ref() else {
        return Err(mismatch("relationship", attr));
    };
    // the target must exist, even though only its name is kept
    cx.inspector.registry().resolve(&rel.target)?;

    let uselist = rel.uselist();
    let target = TypeRef::model(rel.target.clone());
    let collection = uselist.then(|| {
        rel.collection_class
            .as_ref()
            .map_or(CollectionShape::List, collection_shape)
    });
    let value_type = match collection {
        Some(shape) => shape.wrap(target.clone()),
        None => target.clone(),
    };
    let nullable = !uselist;

    let mut info = AttributeInfo::new(
        kind,
        attr,
        value_type,
        InfoDetail::Relationship(RelationshipDetail {
            target_name: rel.target.clone(),
            target,
            direction: rel.kind,
            uselist,
            collection,
            viewonly: rel.viewonly,
            back_populates: rel.back_populates.clone(),
        }),
    );
    info.nullable = nullable;
    info.writable = !rel.viewonly;
    info.default = if nullable {
        DefaultValue::Value(Value::Null)
    } else {
        DefaultValue::NotProvided
    };
    info.default_factory = collection.and_then(CollectionShape::default_factory);
    info.doc.clone_from(&rel.doc);
    Ok(info)
}

/// Relationships loaded once and kept in memory.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipExtractor;

impl Extractor for RelationshipExtractor {
    fn name(&self) -> &'static str {
        "relationship"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::RELATIONSHIP
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::Relationship(rel) if rel.loader != Loader::Dynamic)
    }

    fn extract(&self, cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        relationship_info(AttributeKind::RELATIONSHIP, cx, attr)
    }
}

/// Relationships queried on every access.
#[derive(Debug, Clone, Copy)]
pub struct DynamicLoaderExtractor;

impl Extractor for DynamicLoaderExtractor {
    fn name(&self) -> &'static str {
        "dynamic_loader"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::DYNAMIC_LOADER
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::Relationship(rel) if rel.loader == Loader::Dynamic)
    }

    fn extract(&self, cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        relationship_info(AttributeKind::DYNAMIC_LOADER, cx, attr)
    }
}

/// Association proxies.
#[derive(Debug, Clone, Copy)]
pub struct AssociationProxyExtractor;

impl Extractor for AssociationProxyExtractor {
    fn name(&self) -> &'static str {
        "association_proxy"
    }

    fn extracts(&self) -> AttributeKind {
        AttributeKind::ASSOCIATION_PROXY
    }

    fn matches(&self, attr: &RawAttribute, _kinds: AttributeKind) -> bool {
        matches!(attr, RawAttribute::AssociationProxy(_))
    }

    fn extract(&self, cx: &ExtractContext<'_>, attr: &AttributeHandle) -> Result<AttributeInfo> {
        let RawAttribute::AssociationProxy(proxy) = attr.as_ref() else {
            return Err(mismatch(self.name(), attr));
        };

        // Walk model.relationship -> target.remote_attr
        let through = cx.model.attribute(&proxy.relationship)?;
        let Some(rel) = through.as_relationship() else {
            return Err(Error::custom(format!(
                "association proxy on {} goes through {:?}, which is not a relationship",
                cx.model.name(),
                proxy.relationship
            )));
        };
        let target_model = cx.inspector.registry().resolve(&rel.target)?;
        let remote = cx.related_info(target_model, &proxy.remote_attr)?;

        let collection = proxy
            .collection_class
            .as_ref()
            .map_or(CollectionShape::Dict, collection_shape);
        let detail = ProxyDetail {
            relationship: proxy.relationship.clone(),
            remote_attr: proxy.remote_attr.clone(),
            remote: Box::new(remote),
            target: TypeRef::model(rel.target.clone()),
            collection,
            scalar: proxy.scalar,
        };
        let value_type = detail.value_type(detail.remote.value_type.clone());
        let default_factory = if proxy.scalar {
            None
        } else {
            collection.default_factory()
        };

        let mut info = AttributeInfo::new(
            AttributeKind::ASSOCIATION_PROXY,
            attr,
            value_type,
            InfoDetail::AssociationProxy(detail),
        );
        info.nullable = proxy.scalar;
        info.default_factory = default_factory;
        Ok(info)
    }
}

fn mismatch(extractor: &str, attr: &RawAttribute) -> Error {
    Error::custom(format!(
        "{extractor} extractor called on a {} attribute",
        attr.mechanism()
    ))
}
