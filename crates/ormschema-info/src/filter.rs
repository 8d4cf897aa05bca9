//! Field filters.
//!
//! A [`Filter`] selects attributes of a model: by name, by identity of the
//! attribute handle, by kind, by access flags, or by any combination. Filters
//! that depend on the model (primary key names, descriptor flags) are bound
//! to a model first; the resulting [`BoundFilter`] is a plain predicate.
//!
//! ```
//! use ormschema_core::AttributeKind;
//! use ormschema_info::Filter;
//!
//! // Everything but the primary key and relationships
//! let exclude = Filter::either([
//!     Filter::PrimaryKey,
//!     Filter::by_kind(AttributeKind::ALL_RELATIONSHIPS),
//! ]);
//! # let _ = exclude;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use ormschema_core::{AttributeHandle, AttributeKind, ModelRef, RawAttribute, Result};

use crate::descriptor::AttributeInfo;
use crate::inspector::Inspector;

type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type AttrPredicate = Arc<dyn Fn(&str, &RawAttribute) -> bool + Send + Sync>;

/// A selection of attributes, not yet bound to a model.
#[derive(Clone, Default)]
pub enum Filter {
    /// Matches everything.
    Always,
    /// Matches nothing.
    #[default]
    Never,
    /// Matches listed names, and attributes listed by handle.
    Names {
        names: HashSet<String>,
        attributes: Vec<AttributeHandle>,
    },
    /// Matches names the function accepts.
    Predicate(NamePredicate),
    /// Matches attributes the function accepts.
    AttrPredicate(AttrPredicate),
    /// Primary key columns.
    PrimaryKey,
    /// Everything but the primary key columns.
    NotPrimaryKey,
    /// Readable attributes.
    Readable,
    /// Writable attributes.
    Writable,
    /// Nullable attributes.
    Nullable,
    /// Attributes of the given kinds that also match the inner filter.
    ByKind {
        kinds: AttributeKind,
        inner: Box<Filter>,
    },
    /// Matches when any sub-filter matches. Empty: nothing.
    Either(Vec<Filter>),
    /// Matches when all sub-filters match. Empty: everything.
    And(Vec<Filter>),
    /// Matches when the sub-filter does not.
    Not(Box<Filter>),
}

impl Filter {
    /// Match by name.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Names {
            names: names.into_iter().map(Into::into).collect(),
            attributes: Vec::new(),
        }
    }

    /// Match by attribute identity.
    pub fn attributes<'a>(handles: impl IntoIterator<Item = &'a AttributeHandle>) -> Self {
        Filter::Names {
            names: HashSet::new(),
            attributes: handles.into_iter().map(Arc::clone).collect(),
        }
    }

    /// Match names the function accepts.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Arc::new(f))
    }

    /// Match attributes the function accepts.
    pub fn attr_predicate(f: impl Fn(&str, &RawAttribute) -> bool + Send + Sync + 'static) -> Self {
        Filter::AttrPredicate(Arc::new(f))
    }

    /// Attributes of the given kinds.
    #[must_use]
    pub fn by_kind(kinds: AttributeKind) -> Self {
        Self::by_kind_where(kinds, Filter::Always)
    }

    /// Attributes of the given kinds that also match `inner`.
    #[must_use]
    pub fn by_kind_where(kinds: AttributeKind, inner: Filter) -> Self {
        Filter::ByKind {
            kinds,
            inner: Box::new(inner),
        }
    }

    pub fn either(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Either(filters.into_iter().collect())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Negate. `!f` does the same.
    #[must_use]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Resolve model-specific data and produce a plain predicate.
    pub fn bind(&self, inspector: &Inspector, model: &ModelRef) -> Result<BoundFilter> {
        let attributes = inspector.all_attributes(model)?;
        let predicate = self.bind_inner(inspector, model)?;
        Ok(BoundFilter {
            attributes,
            predicate,
        })
    }

    fn bind_inner(&self, inspector: &Inspector, model: &ModelRef) -> Result<Bound> {
        let by_flag = |flag: fn(&AttributeInfo) -> bool| -> Result<Bound> {
            let all = inspector.all_info(model)?;
            Ok(Bound::Set(
                all.iter()
                    .filter(|(_, info)| flag(info))
                    .map(|(name, _)| name.clone())
                    .collect(),
            ))
        };

        Ok(match self {
            Filter::Always => Bound::Always,
            Filter::Never => Bound::Never,
            Filter::Names { names, attributes } => Bound::Names {
                names: names.clone(),
                attributes: attributes.clone(),
            },
            Filter::Predicate(f) => Bound::Predicate(Arc::clone(f)),
            Filter::AttrPredicate(f) => Bound::AttrPredicate(Arc::clone(f)),
            Filter::PrimaryKey => {
                Bound::Set(inspector.primary_key_names(model)?.into_iter().collect())
            }
            Filter::NotPrimaryKey => Bound::Not(Box::new(Bound::Set(
                inspector.primary_key_names(model)?.into_iter().collect(),
            ))),
            Filter::Readable => by_flag(|info| info.readable)?,
            Filter::Writable => by_flag(|info| info.writable)?,
            Filter::Nullable => by_flag(|info| info.nullable)?,
            Filter::ByKind { kinds, inner } => {
                let all = inspector.all_info(model)?;
                let of_kind = all
                    .iter()
                    .filter(|(_, info)| info.kind.intersects(*kinds))
                    .map(|(name, _)| name.clone())
                    .collect();
                Bound::And(vec![Bound::Set(of_kind), inner.bind_inner(inspector, model)?])
            }
            Filter::Either(filters) => Bound::Either(
                filters
                    .iter()
                    .map(|f| f.bind_inner(inspector, model))
                    .collect::<Result<_>>()?,
            ),
            Filter::And(filters) => Bound::And(
                filters
                    .iter()
                    .map(|f| f.bind_inner(inspector, model))
                    .collect::<Result<_>>()?,
            ),
            // NOT(f) is "not AND(f)"
            Filter::Not(filter) => Bound::Not(Box::new(Bound::And(vec![
                filter.bind_inner(inspector, model)?,
            ]))),
        })
    }
}

impl From<bool> for Filter {
    fn from(value: bool) -> Self {
        if value { Filter::Always } else { Filter::Never }
    }
}

impl From<Option<Filter>> for Filter {
    fn from(value: Option<Filter>) -> Self {
        value.unwrap_or(Filter::Never)
    }
}

impl From<&[&str]> for Filter {
    fn from(names: &[&str]) -> Self {
        Filter::names(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Filter {
    fn from(names: [&str; N]) -> Self {
        Filter::names(names)
    }
}

impl std::ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::not(self)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Always => f.write_str("Always"),
            Filter::Never => f.write_str("Never"),
            Filter::Names { names, attributes } => {
                let mut sorted: Vec<&String> = names.iter().collect();
                sorted.sort();
                f.debug_struct("Names")
                    .field("names", &sorted)
                    .field("attributes", &attributes.len())
                    .finish()
            }
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
            Filter::AttrPredicate(_) => f.write_str("AttrPredicate(..)"),
            Filter::PrimaryKey => f.write_str("PrimaryKey"),
            Filter::NotPrimaryKey => f.write_str("NotPrimaryKey"),
            Filter::Readable => f.write_str("Readable"),
            Filter::Writable => f.write_str("Writable"),
            Filter::Nullable => f.write_str("Nullable"),
            Filter::ByKind { kinds, inner } => f
                .debug_struct("ByKind")
                .field("kinds", kinds)
                .field("inner", inner)
                .finish(),
            Filter::Either(filters) => f.debug_tuple("Either").field(filters).finish(),
            Filter::And(filters) => f.debug_tuple("And").field(filters).finish(),
            Filter::Not(filter) => f.debug_tuple("Not").field(filter).finish(),
        }
    }
}

/// Resolved filter tree.
#[derive(Clone)]
enum Bound {
    Always,
    Never,
    Set(HashSet<String>),
    Names {
        names: HashSet<String>,
        attributes: Vec<AttributeHandle>,
    },
    Predicate(NamePredicate),
    AttrPredicate(AttrPredicate),
    Either(Vec<Bound>),
    And(Vec<Bound>),
    Not(Box<Bound>),
}

impl Bound {
    fn matches(&self, name: &str, attr: Option<&AttributeHandle>) -> bool {
        match self {
            Bound::Always => true,
            Bound::Never => false,
            Bound::Set(names) => names.contains(name),
            Bound::Names { names, attributes } => {
                names.contains(name)
                    || attr.is_some_and(|a| attributes.iter().any(|h| Arc::ptr_eq(h, a)))
            }
            Bound::Predicate(f) => f(name),
            Bound::AttrPredicate(f) => attr.is_some_and(|a| f(name, a)),
            Bound::Either(filters) => filters.iter().any(|f| f.matches(name, attr)),
            Bound::And(filters) => filters.iter().all(|f| f.matches(name, attr)),
            Bound::Not(filter) => !filter.matches(name, attr),
        }
    }
}

/// A filter bound to one model.
#[derive(Clone)]
pub struct BoundFilter {
    attributes: Arc<IndexMap<String, AttributeHandle>>,
    predicate: Bound,
}

impl BoundFilter {
    /// Does the filter select this attribute name?
    ///
    /// Names the model does not have can still match name-based filters.
    pub fn matches(&self, name: &str) -> bool {
        self.predicate.matches(name, self.attributes.get(name))
    }

    /// Names of the model's attributes this filter selects.
    pub fn matching_names(&self) -> Vec<String> {
        self.attributes
            .keys()
            .filter(|name| self.matches(name))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for BoundFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFilter")
            .field("matching", &self.matching_names())
            .finish()
    }
}
