//! Model info extraction.
//!
//! The [`Inspector`] is the entry point of this crate. It owns the model
//! registry, the extractor registry and the per-class caches, and answers
//! questions like "which writable attributes does `User` have, and what are
//! their types?".

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use ormschema_core::{AttributeHandle, AttributeKind, Error, ModelRef, Registry, Result};

use crate::attributes::collect_attributes;
use crate::cache::ClassCache;
use crate::descriptor::AttributeInfo;
use crate::extractor::{ExtractContext, Extractor, ExtractorRegistry};
use crate::filter::Filter;

/// Ordered attribute name to descriptor mapping.
pub type InfoMap = IndexMap<String, AttributeInfo>;

/// Introspects mapped classes.
///
/// # Caching
///
/// The attribute listing, the all-kinds descriptor mapping and the safe
/// property listing are computed once per class and never evicted: classes
/// do not change after they are built. Narrowing by kind and applying an
/// exclude filter are done on every call.
///
/// # Example
///
/// ```
/// use ormschema_core::{AttributeKind, ColumnAttr, ModelClass, Registry, SqlType};
/// use ormschema_info::{Filter, Inspector};
///
/// let user = ModelClass::builder("User")
///     .table("users")
///     .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
///     .column("name", ColumnAttr::new(SqlType::Text))
///     .build();
/// let inspector = Inspector::new(Registry::new().with(&user));
///
/// let info = inspector.info(&user, AttributeKind::ALL, &Filter::PrimaryKey).unwrap();
/// assert_eq!(info.keys().collect::<Vec<_>>(), vec!["name"]);
/// ```
pub struct Inspector {
    registry: Registry,
    extractors: ExtractorRegistry,
    attributes: ClassCache<IndexMap<String, AttributeHandle>>,
    infos: ClassCache<InfoMap>,
    pub(crate) safe_properties: ClassCache<IndexMap<String, Vec<String>>>,
}

impl Inspector {
    /// Inspector with the built-in extractors.
    pub fn new(registry: Registry) -> Self {
        Self::with_extractors(registry, ExtractorRegistry::builtin())
    }

    /// Inspector with a custom set of extractors.
    pub fn with_extractors(registry: Registry, extractors: ExtractorRegistry) -> Self {
        Self {
            registry,
            extractors,
            attributes: ClassCache::new(),
            infos: ClassCache::new(),
            safe_properties: ClassCache::new(),
        }
    }

    /// The model registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The extractor registry.
    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    /// Every attribute of the class, in declaration order, parents first.
    pub fn all_attributes(
        &self,
        model: &ModelRef,
    ) -> Result<Arc<IndexMap<String, AttributeHandle>>> {
        self.attributes.get_or_try_insert_with(model, || {
            let attributes = collect_attributes(model)?;
            tracing::debug!(
                model = model.name(),
                count = attributes.len(),
                "enumerated model attributes"
            );
            Ok(attributes)
        })
    }

    /// Names of every attribute of the class.
    pub fn attribute_names(&self, model: &ModelRef) -> Result<Vec<String>> {
        Ok(self.all_attributes(model)?.keys().cloned().collect())
    }

    /// Descriptors of every supported attribute, all kinds, unfiltered.
    ///
    /// Attributes no extractor claims are left out, and so are attributes
    /// whose extraction fails: a relationship to an unregistered class, a
    /// proxy to an unsupported attribute. Use
    /// [`attribute_info`](Self::attribute_info) to see the error.
    pub fn all_info(&self, model: &ModelRef) -> Result<Arc<InfoMap>> {
        self.infos.get_or_try_insert_with(model, || {
            let attributes = self.all_attributes(model)?;

            let mut infos = InfoMap::new();
            for (name, handle) in attributes.iter() {
                let Some(extractor) = self.extractors.find(handle, AttributeKind::ALL) else {
                    tracing::debug!(
                        model = model.name(),
                        attribute = name.as_str(),
                        mechanism = handle.mechanism(),
                        "no extractor for attribute, skipped"
                    );
                    continue;
                };
                match self.extract_with(extractor.as_ref(), model, name, handle, &[]) {
                    Ok(info) => {
                        infos.insert(name.clone(), info);
                    }
                    Err(error) => tracing::debug!(
                        model = model.name(),
                        attribute = name.as_str(),
                        extractor = extractor.name(),
                        %error,
                        "attribute extraction failed, skipped"
                    ),
                }
            }
            tracing::debug!(
                model = model.name(),
                count = infos.len(),
                "extracted model info"
            );
            Ok(infos)
        })
    }

    /// Descriptors of the attributes of the requested kinds.
    ///
    /// Attributes matched by `exclude` are dropped; pass [`Filter::Never`]
    /// to keep everything.
    pub fn info(
        &self,
        model: &ModelRef,
        kinds: AttributeKind,
        exclude: &Filter,
    ) -> Result<InfoMap> {
        let all = self.all_info(model)?;
        let exclude = exclude.bind(self, model)?;
        Ok(all
            .iter()
            .filter(|(_, info)| info.kind.intersects(kinds))
            .filter(|(name, _)| !exclude.matches(name))
            .map(|(name, info)| (name.clone(), info.clone()))
            .collect())
    }

    /// Descriptor of one attribute.
    ///
    /// Unlike [`info`](Self::info), this is strict: an attribute no extractor
    /// supports is `Error::UnsupportedAttribute`, and extraction errors are
    /// returned as they are.
    pub fn attribute_info(&self, model: &ModelRef, name: &str) -> Result<AttributeInfo> {
        self.attribute_info_within(model, name, &[])
    }

    /// [`attribute_info`](Self::attribute_info) from inside another
    /// extraction. `trail` lists the attributes being extracted on the way
    /// here; meeting one of them again is `Error::UnsupportedAttribute`.
    pub(crate) fn attribute_info_within(
        &self,
        model: &ModelRef,
        name: &str,
        trail: &[(String, String)],
    ) -> Result<AttributeInfo> {
        let attributes = self.all_attributes(model)?;
        let handle = attributes.get(name).ok_or_else(|| Error::NoSuchAttribute {
            model: model.name().to_string(),
            attribute: name.to_string(),
        })?;
        let extractor = self
            .extractors
            .find(handle, AttributeKind::ALL)
            .ok_or_else(|| Error::UnsupportedAttribute {
                model: model.name().to_string(),
                attribute: name.to_string(),
            })?;
        self.extract_with(extractor.as_ref(), model, name, handle, trail)
    }

    fn extract_with(
        &self,
        extractor: &dyn Extractor,
        model: &ModelRef,
        name: &str,
        handle: &AttributeHandle,
        trail: &[(String, String)],
    ) -> Result<AttributeInfo> {
        if trail.iter().any(|(m, a)| m == model.name() && a == name) {
            tracing::debug!(
                model = model.name(),
                attribute = name,
                "attribute refers back to itself"
            );
            return Err(Error::UnsupportedAttribute {
                model: model.name().to_string(),
                attribute: name.to_string(),
            });
        }
        let mut trail = trail.to_vec();
        trail.push((model.name().to_string(), name.to_string()));
        let cx = ExtractContext {
            inspector: self,
            model,
            trail,
        };
        extractor.extract(&cx, handle)
    }

    /// Primary key column names.
    pub fn primary_key_names(&self, model: &ModelRef) -> Result<Vec<String>> {
        model.ensure_mapped()?;
        Ok(model.primary_key_names())
    }

    /// Descriptors of the primary key columns.
    pub fn primary_key_info(&self, model: &ModelRef) -> Result<InfoMap> {
        self.primary_key_names(model)?
            .into_iter()
            .map(|name| {
                let info = self.attribute_info(model, &name)?;
                Ok((name, info))
            })
            .collect()
    }

    /// Descriptors grouped by extractor category.
    ///
    /// Every registered category is present, even when the class has no
    /// attribute of that category.
    pub fn attributes_by_category(
        &self,
        model: &ModelRef,
    ) -> Result<IndexMap<&'static str, InfoMap>> {
        let all = self.all_info(model)?;
        Ok(self
            .extractors
            .iter()
            .map(|extractor| {
                let group = all
                    .iter()
                    .filter(|(_, info)| extractor.matches(&info.attribute, AttributeKind::ALL))
                    .map(|(name, info)| (name.clone(), info.clone()))
                    .collect();
                (extractor.name(), group)
            })
            .collect())
    }

    /// Number of classes with cached descriptors.
    pub fn cached_models(&self) -> usize {
        self.infos.len()
    }
}

impl fmt::Debug for Inspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inspector")
            .field("models", &self.registry.len())
            .field("extractors", &self.extractors)
            .field("cached", &self.infos.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DefaultValue;
    use ormschema_core::{ColumnAttr, CustomAttr, ModelClass, RawAttribute, SqlType, TypeRef};
    use serde_json::json;

    fn account() -> ModelRef {
        ModelClass::builder("Account")
            .table("accounts")
            .column("id", ColumnAttr::new(SqlType::Integer).primary_key())
            .column("name", ColumnAttr::new(SqlType::Text))
            .column(
                "status",
                ColumnAttr::new(SqlType::Text).nullable(false).default("active"),
            )
            .custom("_audit", CustomAttr::new("audit_log", json!({})))
            .build()
    }

    #[test]
    fn test_column_scenario() {
        let model = account();
        let inspector = Inspector::new(Registry::new().with(&model));
        let info = inspector
            .info(&model, AttributeKind::ALL, &Filter::Never)
            .unwrap();

        // the custom attribute has no extractor, so it is dropped
        assert_eq!(
            info.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "name", "status"]
        );

        assert!(!info["id"].nullable);
        assert_eq!(info["id"].default, DefaultValue::NotProvided);
        assert!(info["name"].nullable);
        assert_eq!(info["name"].default, DefaultValue::Value(json!(null)));
        assert!(!info["status"].nullable);
        assert_eq!(info["status"].default, DefaultValue::Value(json!("active")));
        assert_eq!(info["name"].final_value_type(), TypeRef::Str.optional());
    }

    #[test]
    fn test_extraction_is_idempotent_and_cached() {
        let model = account();
        let inspector = Inspector::new(Registry::new().with(&model));
        let a = inspector.all_info(&model).unwrap();
        let b = inspector.all_info(&model).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(inspector.cached_models(), 1);

        let fresh = Inspector::new(Registry::new().with(&model));
        assert_eq!(*fresh.all_info(&model).unwrap(), *a);
    }

    #[test]
    fn test_single_attribute_lookup_is_strict() {
        let model = account();
        let inspector = Inspector::new(Registry::new().with(&model));
        assert!(inspector.attribute_info(&model, "status").is_ok());
        assert!(matches!(
            inspector.attribute_info(&model, "_audit"),
            Err(Error::UnsupportedAttribute { .. })
        ));
        assert!(matches!(
            inspector.attribute_info(&model, "missing"),
            Err(Error::NoSuchAttribute { .. })
        ));
    }

    #[test]
    fn test_primary_key_and_categories() {
        let model = account();
        let inspector = Inspector::new(Registry::new().with(&model));
        assert_eq!(inspector.primary_key_names(&model).unwrap(), vec!["id"]);
        let pk = inspector.primary_key_info(&model).unwrap();
        assert!(pk["id"].is_primary_key());

        let groups = inspector.attributes_by_category(&model).unwrap();
        assert_eq!(groups["column"].len(), 3);
        assert!(groups["relationship"].is_empty());
        assert_eq!(groups.len(), inspector.extractors().len());
    }

    #[test]
    fn test_unmapped_class() {
        let plain = ModelClass::builder("Plain").build();
        let inspector = Inspector::new(Registry::new());
        assert!(matches!(
            inspector.all_info(&plain),
            Err(Error::UnmappedClass { .. })
        ));
        assert!(matches!(
            inspector.primary_key_names(&plain),
            Err(Error::UnmappedClass { .. })
        ));
    }

    #[test]
    fn test_dropped_attribute_is_custom() {
        let model = account();
        let attrs = Inspector::new(Registry::new()).all_attributes(&model).unwrap();
        assert!(matches!(attrs["_audit"].as_ref(), RawAttribute::Custom(_)));
    }
}
