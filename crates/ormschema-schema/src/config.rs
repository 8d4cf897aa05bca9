//! Schema synthesis options.

use ormschema_core::{AttributeKind, Result};
use ormschema_info::Filter;

use crate::naming::Naming;

/// Options shared by every schema model built in a namespace.
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Attribute kinds to turn into fields.
    pub kinds: AttributeKind,
    /// Attributes to leave out.
    pub exclude: Filter,
    /// Fields to wrap into `Optional[..]`.
    pub make_optional: Filter,
    /// Only keep readable attributes. Useful for output models.
    pub only_readable: bool,
    /// Only keep writable attributes. Useful for input models.
    pub only_writable: bool,
    /// When false, fields without a default are required even if nullable.
    pub can_omit_nullable: bool,
    /// How schema models are named.
    pub naming: Naming,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            kinds: AttributeKind::COLUMN,
            exclude: Filter::Never,
            make_optional: Filter::Never,
            only_readable: false,
            only_writable: false,
            can_omit_nullable: true,
            naming: Naming::identity(),
        }
    }
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(mut self, kinds: AttributeKind) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn exclude(mut self, filter: impl Into<Filter>) -> Self {
        self.exclude = filter.into();
        self
    }

    pub fn make_optional(mut self, filter: impl Into<Filter>) -> Self {
        self.make_optional = filter.into();
        self
    }

    /// Make every field optional except the primary key.
    pub fn all_optional_but_primary_key(mut self) -> Self {
        self.make_optional = Filter::NotPrimaryKey;
        self
    }

    pub fn only_readable(mut self) -> Self {
        self.only_readable = true;
        self
    }

    pub fn only_writable(mut self) -> Self {
        self.only_writable = true;
        self
    }

    pub fn can_omit_nullable(mut self, can_omit: bool) -> Self {
        self.can_omit_nullable = can_omit;
        self
    }

    /// Set the naming pattern, e.g. `"{model}Input"`.
    pub fn naming(mut self, pattern: &str) -> Result<Self> {
        self.naming = Naming::new(pattern)?;
        Ok(self)
    }
}
