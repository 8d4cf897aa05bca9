//! A namespace of schema models that refer to one another.
//!
//! Every model in a [`Models`] namespace is built with the same
//! [`SchemaConfig`], so they share a naming pattern and their forward
//! references line up: with `"{model}Input"`, the `author` relationship of
//! `Article` points at `UserInput`, which is what `User` is added as.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use ormschema_core::{AttributeKind, Error, ModelRef, Result};
use ormschema_info::{Filter, Inspector};

use crate::config::SchemaConfig;
use crate::field::model_fields;
use crate::model::SchemaModel;

/// A group of schema models sharing one configuration.
pub struct Models<'a> {
    pub(crate) inspector: &'a Inspector,
    config: SchemaConfig,
    pub(crate) models: IndexMap<String, SchemaModel>,
}

impl<'a> Models<'a> {
    pub fn new(inspector: &'a Inspector, config: SchemaConfig) -> Self {
        Self {
            inspector,
            config,
            models: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn inspector(&self) -> &'a Inspector {
        self.inspector
    }

    /// Build a schema model for `model` and remember it.
    pub fn add(&mut self, model: &ModelRef) -> Result<&SchemaModel> {
        self.add_with(model, AttributeKind::NONE, Filter::Never)
    }

    /// Like [`add`](Self::add), with more kinds and a model-specific exclusion.
    pub fn add_with(
        &mut self,
        model: &ModelRef,
        extra_kinds: AttributeKind,
        exclude: Filter,
    ) -> Result<&SchemaModel> {
        let mut config = self.config.clone();
        config.kinds |= extra_kinds;
        config.exclude = Filter::either([config.exclude, exclude]);

        let fields = model_fields(self.inspector, model, &config)?;
        let name = config.naming.name_for(model.name());
        let schema = SchemaModel {
            name: name.clone(),
            source: model.name().to_string(),
            parent: model
                .parent()
                .filter(|parent| parent.is_mapped())
                .map(|parent| config.naming.name_for(parent.name())),
            doc: model.doc().map(str::to_string),
            fields,
        };
        tracing::debug!(
            model = model.name(),
            schema = %name,
            fields = schema.fields.len(),
            "schema model added"
        );

        self.models.insert(name.clone(), schema);
        self.get(&name).ok_or(Error::UnknownModel { model: name })
    }

    /// Look a schema model up by its schema name.
    pub fn get(&self, name: &str) -> Option<&SchemaModel> {
        self.models.get(name)
    }

    /// The schema model built for a mapped class.
    pub fn for_model(&self, model: &ModelRef) -> Option<&SchemaModel> {
        self.get(&self.config.naming.name_for(model.name()))
    }

    pub fn models(&self) -> impl Iterator<Item = &SchemaModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Check that every forward reference points at a model in this namespace.
    ///
    /// Parents count as references too.
    pub fn resolve_forward_refs(&self) -> Result<()> {
        for model in self.models.values() {
            let references = model.forward_refs().into_iter().chain(model.parent.as_deref());
            for reference in references {
                if !self.models.contains_key(reference) {
                    return Err(Error::UnresolvedForwardRef {
                        model: model.name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render every model into one JSON Schema document with `definitions`.
    pub fn json_schema(&self) -> Value {
        let definitions: Map<String, Value> = self
            .models
            .iter()
            .map(|(name, model)| (name.clone(), model.json_schema()))
            .collect();
        json!({ "definitions": definitions })
    }
}

impl fmt::Debug for Models<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Models")
            .field("naming", &self.config.naming)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
