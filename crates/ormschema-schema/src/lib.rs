//! Schema synthesis from attribute descriptors.
//!
//! `ormschema-schema` turns the descriptors `ormschema-info` extracts into
//! schema models: named field specs with types, defaults and titles, ready to
//! render as JSON Schema or to validate and dump data against.
//!
//! # Role In The Architecture
//!
//! This is the consumer side of the engine. It decides which descriptors
//! become fields ([`SchemaConfig`]), how model references are spelled
//! ([`Naming`]), and groups related models into a [`Models`] namespace so
//! their forward references resolve. [`Models::dump`] reads live instances
//! through those models, optionally without triggering a single load.
//!
//! # Who Uses This Crate
//!
//! - API layers that need input/output schemas for their mapped classes.
//! - The `ormschema` facade, which re-exports everything here.
//!
//! ```
//! use ormschema_core::{ColumnAttr, ModelClass, Registry, SqlType, TypeRef};
//! use ormschema_info::Inspector;
//! use ormschema_schema::{Models, SchemaConfig};
//!
//! let user = ModelClass::builder("User")
//!     .table("users")
//!     .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
//!     .column("login", ColumnAttr::new(SqlType::Text))
//!     .build();
//! let inspector = Inspector::new(Registry::new().with(&user));
//!
//! let config = SchemaConfig::new().naming("{model}Input").unwrap();
//! let mut models = Models::new(&inspector, config);
//! let schema = models.add(&user).unwrap();
//! assert_eq!(schema.name, "UserInput");
//! assert_eq!(schema.fields["login"].ty, TypeRef::Str.optional());
//! ```

pub mod config;
pub mod dump;
pub mod field;
pub mod model;
pub mod namespace;
pub mod naming;

pub use config::SchemaConfig;
pub use dump::DumpMode;
pub use field::{FieldDefault, SchemaField, model_fields};
pub use model::{DEFINITIONS_PREFIX, SchemaModel, type_schema};
pub use namespace::Models;
pub use naming::Naming;
