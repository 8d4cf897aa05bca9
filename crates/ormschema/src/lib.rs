//! ormschema: introspect ORM-mapped models.
//!
//! This is the facade crate. It re-exports the whole engine:
//!
//! - `ormschema-core`: errors, attribute kinds, value types, mapped-class
//!   metadata and the live-instance contract.
//! - `ormschema-info`: descriptors, extractors, the [`Inspector`] and its
//!   caches, field filters, loads-attributes support.
//! - `ormschema-pluck`: selective extraction of live object graphs.
//! - `ormschema-schema`: schema models, JSON Schema, loaded-only dumping.
//!
//! # Quick Start
//!
//! ```
//! use ormschema::prelude::*;
//! use serde_json::json;
//!
//! let user = ModelClass::builder("User")
//!     .table("users")
//!     .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
//!     .column("login", ColumnAttr::new(SqlType::Text).nullable(false))
//!     .column("bio", ColumnAttr::new(SqlType::Text))
//!     .build();
//! let inspector = Inspector::new(Registry::new().with(&user));
//!
//! let info = inspector.info(&user, AttributeKind::ALL, &Filter::Never).unwrap();
//! assert_eq!(info["bio"].final_value_type(), TypeRef::Str.optional());
//!
//! let obj = DynamicInstance::new(&user)
//!     .with("id", json!(1))
//!     .with("login", json!("kolypto"));
//! let map = PluckMap::from_json(&json!({"login": 1})).unwrap();
//! let out = pluck(&inspector, &obj, &map, Unloaded::Raise).unwrap();
//! assert_eq!(out, json!({"login": "kolypto"}));
//! ```

pub use ormschema_core::{
    AttrValue, AttributeHandle, AttributeKind, BoxError, CollectionClass, ColumnAttr,
    ColumnDefault, CompositeAttr, CustomAttr, DynamicInstance, Error, ExpressionAttr, Getter,
    Instance, InstanceRef, Loader, MethodAttr, ModelBuilder, ModelClass, ModelRef, PropertyAttr,
    ProxyAttr, RawAttribute, Registry, RelationshipAttr, RelationshipKind, Result, SqlType,
    TypeRef,
};
pub use ormschema_info::{
    AttributeInfo, BoundFilter, CollectionShape, DefaultFactory, DefaultValue, ExtractContext,
    Extractor, ExtractorRegistry, Filter, InfoDetail, InfoMap, Inspector, LoadsAttributes,
    ProxyDetail, RelationshipDetail,
};
pub use ormschema_pluck::{Include, PluckMap, Plucker, Unloaded, pluck, pluck_dict};
pub use ormschema_schema::{
    DumpMode, FieldDefault, Models, Naming, SchemaConfig, SchemaField, SchemaModel, model_fields,
};

/// Everything needed to describe models and read them.
pub mod prelude {
    pub use crate::{
        AttrValue, AttributeInfo, AttributeKind, CollectionClass, ColumnAttr, CompositeAttr,
        DefaultValue, DumpMode, DynamicInstance, Error, ExpressionAttr, Filter, Include, Inspector,
        Instance, InstanceRef, LoadsAttributes, MethodAttr, ModelClass, ModelRef, Models,
        PluckMap, PropertyAttr, ProxyAttr, Registry, RelationshipAttr, Result, SchemaConfig,
        SqlType, TypeRef, Unloaded, pluck, pluck_dict,
    };
}
