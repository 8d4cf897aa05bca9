//! Attribute enumeration.

use indexmap::IndexMap;

use ormschema_core::{AttributeHandle, ModelClass, Result};

/// Every attribute of a mapped class, in declaration order.
///
/// Inherited attributes come first, in the order their defining ancestor
/// declared them; a subclass redeclaring an inherited name replaces the
/// attribute but keeps the ancestor's position. Private names are included.
///
/// Fails with `Error::UnmappedClass` for a class with no storage mapping.
pub fn collect_attributes(model: &ModelClass) -> Result<IndexMap<String, AttributeHandle>> {
    model.ensure_mapped()?;

    let mut attributes = IndexMap::new();
    for class in model.lineage() {
        for (name, handle) in class.own_attributes() {
            attributes.insert(name.clone(), AttributeHandle::clone(handle));
        }
    }
    Ok(attributes)
}
