//! Schema models and their JSON Schema rendering.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value, json};

use ormschema_core::TypeRef;

use crate::field::{FieldDefault, SchemaField};

/// Where definitions live in a rendered document.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// A schema model synthesized from a mapped class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaModel {
    /// Schema name, from the naming pattern.
    pub name: String,
    /// Name of the mapped class this was built from.
    pub source: String,
    /// Schema name of the parent model, for mapped subclasses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub fields: IndexMap<String, SchemaField>,
}

impl SchemaModel {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    /// Names of required fields, in order.
    pub fn required(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.default.is_required())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every forward reference the fields make.
    pub fn forward_refs(&self) -> Vec<&str> {
        let refs: IndexSet<&str> = self
            .fields
            .values()
            .flat_map(|field| field.ty.forward_refs())
            .collect();
        refs.into_iter().collect()
    }

    /// Render as a JSON Schema object.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), field_schema(name, field)))
            .collect();

        let mut schema = Map::new();
        schema.insert("title".to_string(), json!(self.name));
        if let Some(doc) = &self.doc {
            schema.insert("description".to_string(), json!(doc));
        }
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        let required = self.required();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema.insert("additionalProperties".to_string(), json!(false));
        Value::Object(schema)
    }
}

fn field_schema(name: &str, field: &SchemaField) -> Value {
    let mut schema = match type_schema(&field.ty) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    schema.insert(
        "title".to_string(),
        json!(field.title.clone().unwrap_or_else(|| name.to_string())),
    );
    match &field.default {
        FieldDefault::Value(value) => {
            schema.insert("default".to_string(), value.clone());
        }
        FieldDefault::Factory(factory) => {
            schema.insert("default".to_string(), factory.empty_value());
        }
        FieldDefault::Required => {}
    }
    Value::Object(schema)
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{DEFINITIONS_PREFIX}{name}") })
}

/// JSON Schema of a value type.
pub fn type_schema(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Any | TypeRef::Json => json!({}),
        TypeRef::None => json!({"type": "null"}),
        TypeRef::Bool => json!({"type": "boolean"}),
        TypeRef::Int => json!({"type": "integer"}),
        TypeRef::Float | TypeRef::Decimal => json!({"type": "number"}),
        TypeRef::Str => json!({"type": "string"}),
        TypeRef::Bytes => json!({"type": "string", "format": "binary"}),
        TypeRef::Date => json!({"type": "string", "format": "date"}),
        TypeRef::Time => json!({"type": "string", "format": "time"}),
        TypeRef::DateTime => json!({"type": "string", "format": "date-time"}),
        TypeRef::Interval => json!({"type": "number", "format": "time-delta"}),
        TypeRef::Uuid => json!({"type": "string", "format": "uuid"}),
        TypeRef::Enum(name) => json!({"type": "string", "title": name}),
        TypeRef::Class(name) | TypeRef::Model(name) | TypeRef::ForwardRef(name) => {
            reference(name)
        }
        TypeRef::Optional(inner) => json!({"anyOf": [type_schema(inner), {"type": "null"}]}),
        TypeRef::List(item) => json!({"type": "array", "items": type_schema(item)}),
        TypeRef::Set(item) => {
            json!({"type": "array", "items": type_schema(item), "uniqueItems": true})
        }
        TypeRef::Dict(_, value) => {
            json!({"type": "object", "additionalProperties": type_schema(value)})
        }
        TypeRef::Union(members) => {
            json!({"anyOf": members.iter().map(type_schema).collect::<Vec<_>>()})
        }
    }
}
