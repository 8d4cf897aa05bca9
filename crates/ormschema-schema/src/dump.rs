//! Dumping live instances through schema models.

use serde_json::{Map, Value};

use ormschema_core::{AttrValue, Error, Instance, RawAttribute, Result, instance_id};

use crate::model::SchemaModel;
use crate::namespace::Models;

/// How much of an instance to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DumpMode {
    /// Read every field, loading whatever is missing.
    #[default]
    All,
    /// Never load anything. Unloaded fields, and properties that cannot be
    /// evaluated without a load, come out as `null`.
    LoadedOnly,
}

impl Models<'_> {
    /// Dump `instance` through the schema model of its class.
    ///
    /// Related objects are dumped through their own schema models, so those
    /// must be in the namespace too. An object met again while it is still
    /// being dumped (a back-reference) comes out as `null`.
    pub fn dump(&self, instance: &dyn Instance, mode: DumpMode) -> Result<Value> {
        let mut dumper = Dumper {
            models: self,
            mode,
            stack: Vec::new(),
        };
        dumper.dump(instance)
    }
}

struct Dumper<'m, 'a> {
    models: &'m Models<'a>,
    mode: DumpMode,
    /// Instances currently being dumped.
    stack: Vec<usize>,
}

impl Dumper<'_, '_> {
    fn schema_for(&self, instance: &dyn Instance) -> Result<&SchemaModel> {
        self.models
            .for_model(instance.model())
            .ok_or_else(|| Error::UnknownModel {
                model: self.models.config().naming.name_for(instance.model().name()),
            })
    }

    fn dump(&mut self, instance: &dyn Instance) -> Result<Value> {
        let id = instance_id(instance);
        if self.stack.contains(&id) {
            return Ok(Value::Null);
        }

        let names: Vec<String> = self.schema_for(instance)?.fields.keys().cloned().collect();
        self.stack.push(id);
        let result = self.dump_fields(instance, &names);
        self.stack.pop();
        result
    }

    fn dump_fields(&mut self, instance: &dyn Instance, names: &[String]) -> Result<Value> {
        let mut out = Map::new();
        for name in names {
            let value = match self.read(instance, name)? {
                Some(value) => self.convert(value)?,
                None => Value::Null,
            };
            out.insert(name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    /// Read one field; `None` when it must not be read in this mode.
    fn read(&self, instance: &dyn Instance, name: &str) -> Result<Option<AttrValue>> {
        let attr = instance.model().attribute(name)?;
        if let RawAttribute::HybridMethod(_) = attr.as_ref() {
            return Ok(None);
        }
        if self.mode == DumpMode::All {
            return instance.get(name).map(Some);
        }

        let readable = match attr.as_ref() {
            RawAttribute::Property(_) | RawAttribute::HybridProperty(_) => self
                .models
                .inspector
                .is_safe_to_evaluate(instance, name)?,
            RawAttribute::AssociationProxy(proxy) => instance.is_loaded(&proxy.relationship),
            attr if attr.is_storage_backed() => instance.is_loaded(name),
            _ => true,
        };
        if readable {
            instance.get(name).map(Some)
        } else {
            tracing::trace!(
                model = instance.model().name(),
                attribute = name,
                "not loaded, dumped as null"
            );
            Ok(None)
        }
    }

    fn convert(&mut self, value: AttrValue) -> Result<Value> {
        match value {
            AttrValue::Scalar(value) => Ok(value),
            AttrValue::Object(None) => Ok(Value::Null),
            AttrValue::Object(Some(related)) => self.dump(related.as_ref()),
            AttrValue::Collection(items) => items
                .unwrap_or_default()
                .into_iter()
                .map(|item| self.dump(item.as_ref()))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use ormschema_core::{
        AttributeKind, ColumnAttr, DynamicInstance, InstanceRef, ModelClass, Registry,
        RelationshipAttr, SqlType,
    };
    use ormschema_info::Inspector;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_loaded_only_never_fetches() {
        let user = ModelClass::builder("User")
            .table("users")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .column("login", ColumnAttr::new(SqlType::Text))
            .build();
        let inspector = Inspector::new(Registry::new().with(&user));
        let mut models = Models::new(&inspector, SchemaConfig::default());
        models.add(&user).unwrap();

        let obj = DynamicInstance::new(&user).with("id", json!(1));
        let out = models.dump(&obj, DumpMode::LoadedOnly).unwrap();
        assert_eq!(out, json!({"id": 1, "login": null}));
        assert!(obj.fetch_log().is_empty());

        let out = models.dump(&obj, DumpMode::All).unwrap();
        assert_eq!(out, json!({"id": 1, "login": null}));
        assert_eq!(obj.fetch_log(), vec!["login"]);
    }

    #[test]
    fn test_back_reference_becomes_null() {
        let user = ModelClass::builder("User")
            .table("users")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .relationship(
                "articles",
                RelationshipAttr::one_to_many("Article").back_populates("author"),
            )
            .build();
        let article = ModelClass::builder("Article")
            .table("articles")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .relationship(
                "author",
                RelationshipAttr::many_to_one("User").back_populates("articles"),
            )
            .build();
        let inspector = Inspector::new(Registry::new().with(&user).with(&article));
        let config = SchemaConfig::new().kinds(AttributeKind::COLUMN | AttributeKind::RELATIONSHIP);
        let mut models = Models::new(&inspector, config);
        models.add(&user).unwrap();
        models.add(&article).unwrap();

        let author = Rc::new(DynamicInstance::new(&user).with("id", json!(1)));
        let post = Rc::new(DynamicInstance::new(&article).with("id", json!(10)));
        let author_ref: InstanceRef = author.clone();
        let post_ref: InstanceRef = post.clone();
        post.set("author", author_ref);
        author.set("articles", AttrValue::collection(vec![post_ref]));

        let out = models.dump(author.as_ref(), DumpMode::LoadedOnly).unwrap();
        assert_eq!(out, json!({"id": 1, "articles": [{"id": 10, "author": null}]}));
    }
}
