//! Selective extraction of live object graphs.
//!
//! `ormschema-pluck` copies a chosen subset of an instance's attributes into
//! plain JSON, following relationships as deep as the selection map says.
//!
//! # Role In The Architecture
//!
//! Sits on top of `ormschema-info`: the inspector tells the plucker which
//! attributes exist and which of them are relationships; the [`Instance`]
//! contract from `ormschema-core` supplies values and loadedness. Attributes
//! that are not loaded are handled per [`Unloaded`] policy.
//!
//! # Who Uses This Crate
//!
//! - API handlers that serialize a response shape picked by the client.
//! - The `ormschema` facade, which re-exports everything here.
//!
//! [`Instance`]: ormschema_core::Instance

pub mod pluck;
pub mod selection;

pub use pluck::{LOG_TARGET, Plucker, Unloaded, pluck, pluck_dict};
pub use selection::{Include, PluckMap};
