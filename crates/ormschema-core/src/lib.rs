//! Core types for ormschema.
//!
//! `ormschema-core` is the **foundation layer** of the workspace. It describes
//! what the ORM integration hands to the engine, without interpreting it.
//!
//! # Role In The Architecture
//!
//! - **Metadata**: `ModelClass` and the `RawAttribute` variants are the static
//!   description of a mapped class, built once by the ORM integration.
//! - **Live objects**: the `Instance` trait and `AttrValue` are the contract for
//!   reading values and loadedness from an object graph.
//! - **Vocabulary**: `AttributeKind` flags, `SqlType` and `TypeRef`, and the
//!   shared `Error` type.
//!
//! # Who Uses This Crate
//!
//! - `ormschema-info` turns raw attributes into descriptors.
//! - `ormschema-pluck` walks `Instance` graphs.
//! - `ormschema-schema` renders `TypeRef`s and dumps instances.
//!
//! Most applications should use the `ormschema` facade.

pub mod attribute;
pub mod error;
pub mod instance;
pub mod kind;
pub mod model;
pub mod types;

pub use attribute::{
    AttributeHandle, CollectionClass, CollectionFactory, ColumnAttr, ColumnDefault,
    CompositeAttr, CustomAttr, DefaultCallable, ExpressionAttr, Getter, Loader, MethodAttr,
    PropertyAttr, ProxyAttr, RawAttribute, RelationshipAttr, RelationshipKind,
};
pub use error::{BoxError, Error, Result};
pub use instance::{AttrValue, DynamicInstance, Instance, InstanceRef, instance_id};
pub use kind::AttributeKind;
pub use model::{ModelBuilder, ModelClass, ModelKey, ModelRef, Registry};
pub use types::{SqlType, TypeRef};
