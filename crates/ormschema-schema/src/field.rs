//! Field specs derived from attribute descriptors.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use ormschema_core::{ModelRef, Result, TypeRef};
use ormschema_info::{AttributeInfo, DefaultFactory, DefaultValue, InfoDetail, Inspector};

use crate::config::SchemaConfig;

/// Default of a schema field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldDefault {
    /// The field must be provided.
    Required,
    /// The field may be omitted; this value is used instead.
    Value(Value),
    /// The field may be omitted; an empty container is used instead.
    Factory(DefaultFactory),
}

impl FieldDefault {
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, FieldDefault::Required)
    }
}

/// One field of a schema model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub ty: TypeRef,
    pub default: FieldDefault,
    /// Taken from the attribute's doc string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Build the fields of a schema model for `model`.
///
/// Attributes are taken in declaration order, narrowed by the configured
/// kinds, exclusions and access flags. Names starting with `_` are private
/// and always skipped.
pub fn model_fields(
    inspector: &Inspector,
    model: &ModelRef,
    config: &SchemaConfig,
) -> Result<IndexMap<String, SchemaField>> {
    let infos = inspector.info(model, config.kinds, &config.exclude)?;
    let make_optional = config.make_optional.bind(inspector, model)?;

    let fields = infos
        .iter()
        .filter(|(name, info)| {
            (!config.only_readable || info.readable)
                && (!config.only_writable || info.writable)
                && !name.starts_with('_')
        })
        .map(|(name, info)| {
            let mut ty = field_type(info, config);
            if make_optional.matches(name) {
                ty = ty.optional();
            }
            let default = field_default(info, &ty, config.can_omit_nullable);
            let field = SchemaField {
                ty,
                default,
                title: info.doc.clone(),
            };
            (name.clone(), field)
        })
        .collect();
    Ok(fields)
}

/// The exposed type, with model references turned into forward references.
fn field_type(info: &AttributeInfo, config: &SchemaConfig) -> TypeRef {
    let forward = |name: String| TypeRef::ForwardRef(config.naming.name_for(&name));

    let info = match &info.detail {
        InfoDetail::Relationship(rel) => info.replace_model(forward(rel.target_name.clone())),
        InfoDetail::Composite { class_name } => {
            info.replace_value_type(TypeRef::ForwardRef(class_name.clone()))
        }
        _ => info.clone(),
    };
    // Proxies, and anything else that still mentions a model.
    info.final_value_type().map_models(&forward)
}

fn field_default(info: &AttributeInfo, ty: &TypeRef, can_omit_nullable: bool) -> FieldDefault {
    match (&info.default, info.default_factory) {
        (DefaultValue::Value(value), _) => FieldDefault::Value(value.clone()),
        (DefaultValue::NotProvided, Some(factory)) => FieldDefault::Factory(factory),
        (DefaultValue::NotProvided, None) if can_omit_nullable && ty.is_optional() => {
            FieldDefault::Value(Value::Null)
        }
        (DefaultValue::NotProvided, None) => FieldDefault::Required,
    }
}
