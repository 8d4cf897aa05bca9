//! Raw attribute metadata, as declared by the ORM integration.
//!
//! Each mapped attribute is one [`RawAttribute`] variant, shared as an
//! [`AttributeHandle`] so it can be compared by identity. These are the
//! undigested inputs of the info extractors: nothing here is normalized.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxError, Result};
use crate::instance::{AttrValue, Instance};
use crate::types::{SqlType, TypeRef};

/// Shared, identity-comparable handle to a raw attribute.
pub type AttributeHandle = Arc<RawAttribute>;

/// Reads a computed attribute from a live instance.
pub type Getter = Arc<dyn Fn(&dyn Instance) -> Result<AttrValue> + Send + Sync>;

/// Produces a column default at insert time.
pub type DefaultCallable = Arc<dyn Fn() -> Value + Send + Sync>;

/// Instantiates an empty custom collection.
pub type CollectionFactory = Arc<dyn Fn() -> std::result::Result<Value, BoxError> + Send + Sync>;

/// One attribute of a mapped class.
#[derive(Debug, Clone)]
pub enum RawAttribute {
    /// A stored column.
    Column(ColumnAttr),
    /// A plain computed property.
    Property(PropertyAttr),
    /// A computed property that also has a query-level expression.
    HybridProperty(PropertyAttr),
    /// A computed method.
    HybridMethod(MethodAttr),
    /// One value backed by several columns.
    Composite(CompositeAttr),
    /// A reference to another mapped class.
    Relationship(RelationshipAttr),
    /// A value reached through a relationship.
    AssociationProxy(ProxyAttr),
    /// A read-only SQL expression.
    Expression(ExpressionAttr),
    /// Something only an application-provided extractor understands.
    Custom(CustomAttr),
}

impl RawAttribute {
    /// Wrap into a shared handle.
    #[must_use]
    pub fn into_handle(self) -> AttributeHandle {
        Arc::new(self)
    }

    /// Short name of the mechanism behind this attribute.
    #[must_use]
    pub fn mechanism(&self) -> &str {
        match self {
            RawAttribute::Column(_) => "column",
            RawAttribute::Property(_) => "property",
            RawAttribute::HybridProperty(_) => "hybrid_property",
            RawAttribute::HybridMethod(_) => "hybrid_method",
            RawAttribute::Composite(_) => "composite",
            RawAttribute::Relationship(r) if r.loader == Loader::Dynamic => "dynamic_loader",
            RawAttribute::Relationship(_) => "relationship",
            RawAttribute::AssociationProxy(_) => "association_proxy",
            RawAttribute::Expression(_) => "expression",
            RawAttribute::Custom(c) => &c.tag,
        }
    }

    /// True for attributes whose value lives in storage and may be unloaded.
    ///
    /// Properties and methods are computed on access; proxies go through a
    /// relationship that is checked on its own.
    #[must_use]
    pub fn is_storage_backed(&self) -> bool {
        matches!(
            self,
            RawAttribute::Column(_)
                | RawAttribute::Composite(_)
                | RawAttribute::Relationship(_)
                | RawAttribute::Expression(_)
        )
    }

    /// The relationship metadata, if this is a relationship.
    #[must_use]
    pub fn as_relationship(&self) -> Option<&RelationshipAttr> {
        match self {
            RawAttribute::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// The column metadata, if this is a column.
    #[must_use]
    pub fn as_column(&self) -> Option<&ColumnAttr> {
        match self {
            RawAttribute::Column(c) => Some(c),
            _ => None,
        }
    }

    /// The property metadata, for plain and hybrid properties.
    #[must_use]
    pub fn as_property(&self) -> Option<&PropertyAttr> {
        match self {
            RawAttribute::Property(p) | RawAttribute::HybridProperty(p) => Some(p),
            _ => None,
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// A column default, as declared.
#[derive(Clone, Default)]
pub enum ColumnDefault {
    /// No default.
    #[default]
    None,
    /// A literal value. `Value::Null` is an explicit null default.
    Value(Value),
    /// Computed by application code on insert.
    Callable(DefaultCallable),
    /// Computed by the server (a SQL expression).
    Sql(String),
}

impl fmt::Debug for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDefault::None => f.write_str("None"),
            ColumnDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ColumnDefault::Callable(_) => f.write_str("Callable(..)"),
            ColumnDefault::Sql(expr) => f.debug_tuple("Sql").field(expr).finish(),
        }
    }
}

/// A stored column.
#[derive(Debug, Clone)]
pub struct ColumnAttr {
    /// Storage type.
    pub sql_type: SqlType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Foreign key reference (`table.column`).
    pub foreign_key: Option<String>,
    /// Declared default.
    pub default: ColumnDefault,
    /// Documentation string.
    pub doc: Option<String>,
}

impl ColumnAttr {
    /// A nullable column with no default.
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            nullable: true,
            primary_key: false,
            foreign_key: None,
            default: ColumnDefault::None,
            doc: None,
        }
    }

    /// Mark as primary key. Primary keys are never nullable.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Set nullable flag.
    #[must_use]
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set a literal default.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = ColumnDefault::Value(value.into());
        self
    }

    /// Set a default computed by application code.
    #[must_use]
    pub fn default_callable(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = ColumnDefault::Callable(Arc::new(f));
        self
    }

    /// Set a default computed by the server.
    #[must_use]
    pub fn server_default(mut self, expr: impl Into<String>) -> Self {
        self.default = ColumnDefault::Sql(expr.into());
        self
    }

    /// Set foreign key reference.
    #[must_use]
    pub fn foreign_key(mut self, reference: impl Into<String>) -> Self {
        self.foreign_key = Some(reference.into());
        self
    }

    /// Set documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

// ============================================================================
// Properties and methods
// ============================================================================

/// A computed property: plain or hybrid.
#[derive(Clone, Default)]
pub struct PropertyAttr {
    /// Reads the value. A property without a getter is write-only.
    pub getter: Option<Getter>,
    /// Declared return type. `None` means the getter is unannotated.
    pub returns: Option<TypeRef>,
    /// Whether a setter exists.
    pub setter: bool,
    /// Default of the setter's value argument, if it declares one.
    pub setter_default: Option<Value>,
    /// Names of the attributes the getter reads, if declared.
    pub loads_attributes: Option<Vec<String>>,
    /// Documentation string.
    pub doc: Option<String>,
}

impl PropertyAttr {
    /// A read-only property.
    pub fn getter(f: impl Fn(&dyn Instance) -> Result<AttrValue> + Send + Sync + 'static) -> Self {
        Self {
            getter: Some(Arc::new(f)),
            ..Self::default()
        }
    }

    /// A property with a setter and no getter.
    #[must_use]
    pub fn write_only() -> Self {
        Self {
            setter: true,
            ..Self::default()
        }
    }

    /// Declare the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Add a setter.
    #[must_use]
    pub fn with_setter(mut self) -> Self {
        self.setter = true;
        self
    }

    /// Add a setter whose value argument has a default.
    #[must_use]
    pub fn with_setter_default(mut self, default: impl Into<Value>) -> Self {
        self.setter = true;
        self.setter_default = Some(default.into());
        self
    }

    /// Declare the attributes the getter reads.
    #[must_use]
    pub fn loads_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loads_attributes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Whether the property can be read.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }
}

impl fmt::Debug for PropertyAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAttr")
            .field("getter", &self.getter.is_some())
            .field("returns", &self.returns)
            .field("setter", &self.setter)
            .field("setter_default", &self.setter_default)
            .field("loads_attributes", &self.loads_attributes)
            .field("doc", &self.doc)
            .finish()
    }
}

/// A computed method.
#[derive(Debug, Clone, Default)]
pub struct MethodAttr {
    /// Declared return type; `None` if unannotated.
    pub returns: Option<TypeRef>,
    /// Documentation string.
    pub doc: Option<String>,
}

impl MethodAttr {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = Some(ty);
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

// ============================================================================
// Composites and expressions
// ============================================================================

/// Several columns exposed as one object.
#[derive(Debug, Clone)]
pub struct CompositeAttr {
    /// Name of the value class.
    pub class_name: String,
    /// Names of the columns it is made of.
    pub columns: Vec<String>,
    /// Documentation string.
    pub doc: Option<String>,
}

impl CompositeAttr {
    pub fn new<I, S>(class_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_name: class_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            doc: None,
        }
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// A read-only SQL expression, e.g. a `column_property` or a SELECT.
#[derive(Debug, Clone)]
pub struct ExpressionAttr {
    /// Storage type of the expression's result.
    pub sql_type: SqlType,
    /// The expression itself, for display.
    pub sql: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
}

impl ExpressionAttr {
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            sql: None,
            doc: None,
        }
    }

    #[must_use]
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// The direction of a relationship between two models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// One-to-one: `User` has one `Profile`.
    OneToOne,
    /// Many-to-one: many `Article`s belong to one `User`.
    #[default]
    ManyToOne,
    /// One-to-many: one `User` has many `Article`s.
    OneToMany,
    /// Many-to-many, through a link table.
    ManyToMany,
}

impl RelationshipKind {
    /// True if the relationship holds a collection.
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}

/// How a relationship is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Loader {
    /// Loaded once, then kept in memory.
    #[default]
    Select,
    /// Queried again on every access; never materialized.
    Dynamic,
}

/// Container type of a to-many relationship.
#[derive(Clone)]
pub enum CollectionClass {
    List,
    Set,
    Dict,
    /// A custom container. The factory is called to see what it builds.
    Custom {
        name: String,
        factory: CollectionFactory,
    },
}

impl CollectionClass {
    /// A custom collection class.
    pub fn custom(
        name: impl Into<String>,
        factory: impl Fn() -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        CollectionClass::Custom {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }
}

impl fmt::Debug for CollectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionClass::List => f.write_str("List"),
            CollectionClass::Set => f.write_str("Set"),
            CollectionClass::Dict => f.write_str("Dict"),
            CollectionClass::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

/// A reference to another mapped class.
#[derive(Debug, Clone)]
pub struct RelationshipAttr {
    /// Name of the target model, resolved through the registry.
    pub target: String,
    /// Direction.
    pub kind: RelationshipKind,
    /// Explicit multiplicity override. Derived from `kind` when unset.
    pub uselist: Option<bool>,
    /// Declared collection class.
    pub collection_class: Option<CollectionClass>,
    /// Read-only relationship.
    pub viewonly: bool,
    /// The field on the target that points back.
    pub back_populates: Option<String>,
    /// Loader strategy.
    pub loader: Loader,
    /// Documentation string.
    pub doc: Option<String>,
}

impl RelationshipAttr {
    /// Create a relationship to `target`.
    pub fn new(target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            target: target.into(),
            kind,
            uselist: None,
            collection_class: None,
            viewonly: false,
            back_populates: None,
            loader: Loader::Select,
            doc: None,
        }
    }

    /// Many-to-one shortcut.
    pub fn many_to_one(target: impl Into<String>) -> Self {
        Self::new(target, RelationshipKind::ManyToOne)
    }

    /// One-to-many shortcut.
    pub fn one_to_many(target: impl Into<String>) -> Self {
        Self::new(target, RelationshipKind::OneToMany)
    }

    /// Whether this relationship holds a collection.
    #[must_use]
    pub fn uselist(&self) -> bool {
        self.uselist.unwrap_or_else(|| self.kind.is_to_many())
    }

    /// Override multiplicity.
    #[must_use]
    pub fn with_uselist(mut self, value: bool) -> Self {
        self.uselist = Some(value);
        self
    }

    /// Set the collection class.
    #[must_use]
    pub fn collection_class(mut self, class: CollectionClass) -> Self {
        self.collection_class = Some(class);
        self
    }

    /// Mark as view-only.
    #[must_use]
    pub fn viewonly(mut self) -> Self {
        self.viewonly = true;
        self
    }

    /// Set the back-populates field name.
    #[must_use]
    pub fn back_populates(mut self, field: impl Into<String>) -> Self {
        self.back_populates = Some(field.into());
        self
    }

    /// Use the dynamic loader.
    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.loader = Loader::Dynamic;
        self
    }

    /// Set documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// An attribute proxied through a relationship: `target.remote_attr` for
/// every target reached by `relationship`.
#[derive(Debug, Clone)]
pub struct ProxyAttr {
    /// Local relationship to go through.
    pub relationship: String,
    /// Attribute read on the target.
    pub remote_attr: String,
    /// Declared collection class.
    pub collection_class: Option<CollectionClass>,
    /// True when the proxy yields one value rather than a collection.
    pub scalar: bool,
}

impl ProxyAttr {
    pub fn new(relationship: impl Into<String>, remote_attr: impl Into<String>) -> Self {
        Self {
            relationship: relationship.into(),
            remote_attr: remote_attr.into(),
            collection_class: None,
            scalar: false,
        }
    }

    #[must_use]
    pub fn collection_class(mut self, class: CollectionClass) -> Self {
        self.collection_class = Some(class);
        self
    }

    #[must_use]
    pub fn scalar(mut self) -> Self {
        self.scalar = true;
        self
    }
}

/// An application-defined attribute.
#[derive(Debug, Clone)]
pub struct CustomAttr {
    /// Tag an application extractor recognizes.
    pub tag: String,
    /// Anything the extractor needs.
    pub payload: Value,
    /// Documentation string.
    pub doc: Option<String>,
}

impl CustomAttr {
    pub fn new(tag: impl Into<String>, payload: Value) -> Self {
        Self {
            tag: tag.into(),
            payload,
            doc: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_builder_chain() {
        let col = ColumnAttr::new(SqlType::Integer).primary_key();
        assert!(col.primary_key);
        assert!(!col.nullable);

        let col = ColumnAttr::new(SqlType::Text)
            .nullable(false)
            .default("active")
            .doc("Account status");
        assert!(matches!(col.default, ColumnDefault::Value(ref v) if *v == json!("active")));
        assert_eq!(col.doc.as_deref(), Some("Account status"));
    }

    #[test]
    fn test_relationship_uselist_follows_kind() {
        assert!(!RelationshipAttr::many_to_one("User").uselist());
        assert!(RelationshipAttr::one_to_many("Article").uselist());
        assert!(
            RelationshipAttr::new("Tag", RelationshipKind::ManyToMany).uselist()
        );
        assert!(!RelationshipAttr::one_to_many("Article").with_uselist(false).uselist());
        assert_eq!(RelationshipKind::default(), RelationshipKind::ManyToOne);
    }

    #[test]
    fn test_mechanism_names() {
        let dynamic = RawAttribute::Relationship(RelationshipAttr::one_to_many("A").dynamic());
        assert_eq!(dynamic.mechanism(), "dynamic_loader");
        assert!(dynamic.is_storage_backed());

        let prop = RawAttribute::Property(PropertyAttr::write_only());
        assert_eq!(prop.mechanism(), "property");
        assert!(!prop.is_storage_backed());
        assert!(!prop.as_property().is_some_and(PropertyAttr::is_readable));
    }
}
