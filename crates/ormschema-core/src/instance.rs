//! Live instances of mapped classes.
//!
//! The [`Instance`] trait is the narrow contract the pluck engine and the
//! loaded-only dumper need from an ORM object: which attributes are already
//! in memory, how to read one, and how to force a load.
//!
//! [`DynamicInstance`] is an in-memory implementation for applications
//! without a real ORM session, and for tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::attribute::{Loader, RawAttribute};
use crate::error::{Error, Result};
use crate::model::ModelRef;

/// Shared handle to a live instance.
pub type InstanceRef = Rc<dyn Instance>;

/// A live object of a mapped class.
pub trait Instance {
    /// The class of this object.
    fn model(&self) -> &ModelRef;

    /// True if the attribute's value is currently in memory.
    fn is_loaded(&self, name: &str) -> bool;

    /// Names of all attributes currently in memory.
    fn loaded_attributes(&self) -> Vec<String>;

    /// Read an attribute. Reading an unloaded stored attribute loads it.
    fn get(&self, name: &str) -> Result<AttrValue>;

    /// Load an attribute from storage, even if it is already in memory.
    ///
    /// Storage failures come back as [`Error::Fetch`].
    fn fetch(&self, name: &str) -> Result<AttrValue>;
}

/// Address of an instance, for identity comparisons.
pub fn instance_id(instance: &dyn Instance) -> usize {
    std::ptr::from_ref(instance).cast::<()>() as usize
}

/// Value of one attribute of a live instance.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain data: numbers, strings, JSON documents, `null`.
    Scalar(Value),
    /// A to-one relationship. `None` when nothing is related.
    Object(Option<InstanceRef>),
    /// A to-many relationship. `None` when the collection was never set.
    Collection(Option<Vec<InstanceRef>>),
}

impl AttrValue {
    /// `Scalar(null)`
    #[must_use]
    pub const fn null() -> Self {
        AttrValue::Scalar(Value::Null)
    }

    /// The plain value, if this is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            AttrValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    /// True for `Scalar(null)`, `Object(None)` and `Collection(None)`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            AttrValue::Scalar(Value::Null) | AttrValue::Object(None) | AttrValue::Collection(None)
        )
    }

    /// A to-one value.
    pub fn object(instance: impl Instance + 'static) -> Self {
        AttrValue::Object(Some(Rc::new(instance)))
    }

    /// A to-many value.
    #[must_use]
    pub fn collection(items: Vec<InstanceRef>) -> Self {
        AttrValue::Collection(Some(items))
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        AttrValue::Scalar(value)
    }
}

impl From<InstanceRef> for AttrValue {
    fn from(instance: InstanceRef) -> Self {
        AttrValue::Object(Some(instance))
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            AttrValue::Object(None) => f.write_str("Object(None)"),
            AttrValue::Object(Some(obj)) => write!(f, "Object(<{}>)", obj.model().name()),
            AttrValue::Collection(None) => f.write_str("Collection(None)"),
            AttrValue::Collection(Some(items)) => {
                write!(f, "Collection(<{} items>)", items.len())
            }
        }
    }
}

/// Value an attribute takes when it is loaded but nothing is stored.
fn empty_value(attr: &RawAttribute) -> AttrValue {
    match attr {
        RawAttribute::Relationship(rel) if rel.uselist() => AttrValue::Collection(Some(Vec::new())),
        RawAttribute::Relationship(_) => AttrValue::Object(None),
        _ => AttrValue::null(),
    }
}

type LoadFn = Box<dyn Fn(&DynamicInstance, &str) -> Result<AttrValue>>;

/// An instance that keeps its values in a map.
///
/// Attributes that were never set count as unloaded. Loading one calls the
/// loader, if there is one, or yields the empty value for its kind
/// (`null`, no object, or an empty collection), like a transient object.
///
/// # Example
///
/// ```
/// use ormschema_core::{ColumnAttr, DynamicInstance, Instance, ModelClass, SqlType};
/// use serde_json::json;
///
/// let user = ModelClass::builder("User")
///     .table("users")
///     .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
///     .column("name", ColumnAttr::new(SqlType::Text))
///     .build();
///
/// let obj = DynamicInstance::new(&user).with("id", json!(7));
/// assert!(obj.is_loaded("id"));
/// assert!(!obj.is_loaded("name"));
/// ```
pub struct DynamicInstance {
    model: ModelRef,
    values: RefCell<IndexMap<String, AttrValue>>,
    loader: Option<LoadFn>,
    fetched: RefCell<Vec<String>>,
}

impl DynamicInstance {
    /// A new object with nothing loaded.
    pub fn new(model: &ModelRef) -> Self {
        Self {
            model: ModelRef::clone(model),
            values: RefCell::new(IndexMap::new()),
            loader: None,
            fetched: RefCell::new(Vec::new()),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Install a loader for unloaded attributes.
    #[must_use]
    pub fn with_loader(
        mut self,
        loader: impl Fn(&DynamicInstance, &str) -> Result<AttrValue> + 'static,
    ) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Store a value, marking the attribute loaded.
    pub fn set(&self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.borrow_mut().insert(name.into(), value.into());
    }

    /// Forget a value, marking the attribute unloaded.
    pub fn expire(&self, name: &str) {
        self.values.borrow_mut().shift_remove(name);
    }

    /// Names of the attributes loaded through [`fetch`](Instance::fetch), in order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }

    /// Share this instance.
    #[must_use]
    pub fn into_ref(self) -> InstanceRef {
        Rc::new(self)
    }

    /// Read a proxied attribute through a relationship.
    ///
    /// A scalar proxy, or one through a to-one relationship, yields the
    /// remote value itself. Through a collection, remote values are gathered
    /// in collection order: scalars into a JSON array, related objects into
    /// a collection. The descriptor's `Dict[remote, target]` type describes
    /// the keyed container an ORM would build; the values read here are
    /// only the remote side of it.
    fn read_proxy(&self, relationship: &str, remote: &str, scalar: bool) -> Result<AttrValue> {
        match self.get(relationship)? {
            AttrValue::Object(Some(target)) => target.get(remote),
            AttrValue::Object(None) => Ok(AttrValue::null()),
            AttrValue::Collection(items) => {
                let mut scalars = Vec::new();
                let mut objects = Vec::new();
                for item in items.unwrap_or_default() {
                    match item.get(remote)? {
                        AttrValue::Scalar(v) => scalars.push(v),
                        AttrValue::Object(Some(obj)) => objects.push(obj),
                        AttrValue::Object(None) => {}
                        AttrValue::Collection(more) => objects.extend(more.unwrap_or_default()),
                    }
                }
                if scalar {
                    return Ok(scalars
                        .into_iter()
                        .next()
                        .map_or_else(AttrValue::null, AttrValue::Scalar));
                }
                if objects.is_empty() {
                    Ok(AttrValue::Scalar(Value::Array(scalars)))
                } else {
                    Ok(AttrValue::collection(objects))
                }
            }
            AttrValue::Scalar(_) => Err(Error::custom(format!(
                "{}.{relationship} is not a relationship",
                self.model.name()
            ))),
        }
    }
}

impl Instance for DynamicInstance {
    fn model(&self) -> &ModelRef {
        &self.model
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    fn loaded_attributes(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Result<AttrValue> {
        let attr = self.model.attribute(name)?;
        match attr.as_ref() {
            RawAttribute::Property(prop) | RawAttribute::HybridProperty(prop) => {
                match &prop.getter {
                    Some(getter) => getter(self),
                    None => Err(Error::custom(format!(
                        "property {}.{name} is write-only",
                        self.model.name()
                    ))),
                }
            }
            RawAttribute::HybridMethod(_) => Err(Error::custom(format!(
                "{}.{name} is a method, not a value",
                self.model.name()
            ))),
            RawAttribute::AssociationProxy(proxy) => {
                self.read_proxy(&proxy.relationship, &proxy.remote_attr, proxy.scalar)
            }
            RawAttribute::Relationship(rel) if rel.loader == Loader::Dynamic => self.fetch(name),
            _ => {
                if let Some(value) = self.values.borrow().get(name) {
                    return Ok(value.clone());
                }
                self.fetch(name)
            }
        }
    }

    fn fetch(&self, name: &str) -> Result<AttrValue> {
        let attr = self.model.attribute(name)?;
        tracing::trace!(model = self.model.name(), attribute = name, "loading attribute");
        self.fetched.borrow_mut().push(name.to_string());
        let value = match &self.loader {
            Some(loader) => loader(self, name)?,
            None => empty_value(attr),
        };
        let dynamic = attr
            .as_relationship()
            .is_some_and(|rel| rel.loader == Loader::Dynamic);
        if attr.is_storage_backed() && !dynamic {
            self.set(name, value.clone());
        }
        Ok(value)
    }
}

impl fmt::Debug for DynamicInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicInstance")
            .field("model", &self.model.name())
            .field("loaded", &self.loaded_attributes())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{ColumnAttr, PropertyAttr, ProxyAttr, RelationshipAttr};
    use crate::model::ModelClass;
    use crate::types::SqlType;
    use serde_json::json;

    fn user() -> ModelRef {
        ModelClass::builder("User")
            .table("users")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .column("name", ColumnAttr::new(SqlType::Text))
            .relationship("articles", RelationshipAttr::one_to_many("Article"))
            .relationship("manager", RelationshipAttr::many_to_one("User"))
            .property(
                "greeting",
                PropertyAttr::getter(|obj| {
                    let name = obj.get("name")?;
                    Ok(json!(format!("hello {}", name.as_str().unwrap_or("?"))).into())
                }),
            )
            .build()
    }

    #[test]
    fn test_set_marks_loaded() {
        let obj = DynamicInstance::new(&user()).with("id", json!(1));
        assert!(obj.is_loaded("id"));
        assert_eq!(obj.loaded_attributes(), vec!["id"]);
        obj.expire("id");
        assert!(!obj.is_loaded("id"));
    }

    #[test]
    fn test_get_unloaded_loads_empty_value() {
        let obj = DynamicInstance::new(&user());
        assert!(obj.get("name").unwrap().is_null());
        assert!(matches!(
            obj.get("articles").unwrap(),
            AttrValue::Collection(Some(ref items)) if items.is_empty()
        ));
        assert!(matches!(obj.get("manager").unwrap(), AttrValue::Object(None)));
        assert_eq!(obj.fetch_log(), vec!["name", "articles", "manager"]);
        assert!(obj.is_loaded("articles"));
    }

    #[test]
    fn test_loader_is_called() {
        let obj = DynamicInstance::new(&user())
            .with_loader(|_, name| Ok(json!(format!("loaded {name}")).into()));
        assert_eq!(obj.get("name").unwrap().as_str(), Some("loaded name"));
        assert!(obj.is_loaded("name"));
    }

    #[test]
    fn test_loader_failure_propagates() {
        let obj = DynamicInstance::new(&user()).with_loader(|_, _| {
            Err(Error::fetch(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no session",
            )))
        });
        assert!(matches!(obj.fetch("name"), Err(Error::Fetch(_))));
        assert!(!obj.is_loaded("name"));
    }

    #[test]
    fn test_property_getter_reads_instance() {
        let obj = DynamicInstance::new(&user()).with("name", json!("kolypto"));
        assert_eq!(
            obj.get("greeting").unwrap().as_str(),
            Some("hello kolypto")
        );
        assert!(!obj.is_loaded("greeting"));
    }

    #[test]
    fn test_unknown_attribute() {
        let obj = DynamicInstance::new(&user());
        assert!(obj.get("nope").unwrap_err().is_no_such_attribute());
    }

    #[test]
    fn test_instance_identity() {
        let a = DynamicInstance::new(&user()).into_ref();
        let b = Rc::clone(&a);
        assert_eq!(instance_id(a.as_ref()), instance_id(b.as_ref()));
    }

    #[test]
    fn test_proxy_reads_remote_values_in_order() {
        let article = ModelClass::builder("Article")
            .table("articles")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .column("title", ColumnAttr::new(SqlType::Text))
            .relationship("author", RelationshipAttr::many_to_one("Blogger"))
            .build();
        let blogger = ModelClass::builder("Blogger")
            .table("bloggers")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .column("name", ColumnAttr::new(SqlType::Text))
            .relationship("articles", RelationshipAttr::one_to_many("Article"))
            .relationship("manager", RelationshipAttr::many_to_one("Blogger"))
            .association_proxy("titles", ProxyAttr::new("articles", "title"))
            .association_proxy("authors", ProxyAttr::new("articles", "author"))
            .association_proxy("manager_name", ProxyAttr::new("manager", "name").scalar())
            .build();

        let boss = DynamicInstance::new(&blogger).with("name", json!("Boss")).into_ref();
        let me = Rc::new(
            DynamicInstance::new(&blogger)
                .with("name", json!("Me"))
                .with("manager", Rc::clone(&boss)),
        );
        let posts: Vec<InstanceRef> = ["First", "Second"]
            .into_iter()
            .map(|title| {
                DynamicInstance::new(&article)
                    .with("title", json!(title))
                    .with("author", Rc::clone(&boss))
                    .into_ref()
            })
            .collect();
        me.set("articles", AttrValue::collection(posts));

        // scalars through a collection: a list, not a keyed dict
        assert_eq!(
            me.get("titles").unwrap().as_scalar(),
            Some(&json!(["First", "Second"]))
        );
        assert!(matches!(
            me.get("authors").unwrap(),
            AttrValue::Collection(Some(ref items)) if items.len() == 2
        ));
        assert_eq!(me.get("manager_name").unwrap().as_str(), Some("Boss"));
        assert!(me.fetch_log().is_empty());
    }
}
