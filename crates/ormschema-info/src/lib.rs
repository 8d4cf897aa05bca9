//! Attribute descriptors for ormschema.
//!
//! Turns the raw attributes of a mapped class into uniform [`AttributeInfo`]
//! descriptors: kind, value type, nullability, default, access.
//!
//! - [`Inspector`] is the entry point: `info()`, `attribute_info()`, primary
//!   keys, categories. It caches per class.
//! - [`Extractor`]s build descriptors, one per kind family; applications may
//!   register more through [`ExtractorRegistry`].
//! - [`Filter`] selects attributes for exclusion or for "make optional".
//! - [`LoadsAttributes`] records which attributes a property reads, so it can
//!   be evaluated on partially loaded objects.

pub mod attributes;
mod cache;
pub mod descriptor;
pub mod extractor;
pub mod filter;
pub mod inspector;
pub mod property;

pub use attributes::collect_attributes;
pub use descriptor::{
    AttributeInfo, CollectionShape, DefaultFactory, DefaultValue, InfoDetail, ProxyDetail,
    RelationshipDetail,
};
pub use extractor::{
    AssociationProxyExtractor, ColumnExtractor, CompositeExtractor, DynamicLoaderExtractor,
    ExpressionExtractor, ExtractContext, Extractor, ExtractorRegistry, HybridMethodExtractor,
    HybridPropertyExtractor, PropertyExtractor, RelationshipExtractor, collection_shape,
    column_default,
};
pub use filter::{BoundFilter, Filter};
pub use inspector::{InfoMap, Inspector};
pub use property::LoadsAttributes;
