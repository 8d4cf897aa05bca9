//! Error types for ormschema.

use std::error::Error as StdError;
use std::fmt;

/// A boxed error coming from an external collaborator (e.g. a storage loader).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by the introspection, pluck and schema layers.
#[derive(Debug)]
pub enum Error {
    /// The class has no storage mapping at all.
    UnmappedClass { model: String },
    /// A model name could not be resolved through the registry.
    UnknownModel { model: String },
    /// The attribute does not exist on the model.
    NoSuchAttribute { model: String, attribute: String },
    /// The attribute exists, but no extractor knows how to describe it.
    UnsupportedAttribute { model: String, attribute: String },
    /// The attribute is not loaded and the unloaded policy says to raise.
    AttributeNotLoaded { model: String, attribute: String },
    /// A selection map does not fit the object graph it is applied to.
    MalformedSelection { attribute: String, reason: String },
    /// A property declared different attributes from the ones it reads.
    LoadsAttributesMismatch {
        property: String,
        mismatch: Vec<String>,
    },
    /// A model naming pattern is invalid.
    InvalidNaming { pattern: String },
    /// A forward reference points at a model that was never added.
    UnresolvedForwardRef { model: String, reference: String },
    /// Fetching an unloaded attribute failed in the storage layer.
    Fetch(BoxError),
    /// Anything else.
    Custom(String),
}

impl Error {
    /// Create a custom error.
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom(message.into())
    }

    /// Wrap a storage-layer failure.
    pub fn fetch(err: impl Into<BoxError>) -> Self {
        Error::Fetch(err.into())
    }

    /// True if this error says that an attribute was not found.
    pub fn is_no_such_attribute(&self) -> bool {
        matches!(self, Error::NoSuchAttribute { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnmappedClass { model } => {
                write!(f, "class {:?} is not mapped to storage", model)
            }
            Error::UnknownModel { model } => write!(f, "unknown model: {:?}", model),
            Error::NoSuchAttribute { model, attribute } => {
                write!(f, "{} has no attribute {:?}", model, attribute)
            }
            Error::UnsupportedAttribute { model, attribute } => write!(
                f,
                "attribute {:?} of {} has a type that is not currently supported",
                attribute, model
            ),
            Error::AttributeNotLoaded { model, attribute } => {
                write!(f, "attribute {}.{} is not loaded", model, attribute)
            }
            Error::MalformedSelection { attribute, reason } => {
                write!(f, "malformed selection for {:?}: {}", attribute, reason)
            }
            Error::LoadsAttributesMismatch { property, mismatch } => write!(
                f,
                "property {:?} uses different attributes from what it has declared; mismatch: {}",
                property,
                mismatch.join(", ")
            ),
            Error::InvalidNaming { pattern } => write!(
                f,
                "naming pattern {:?} must contain a {{model}} placeholder",
                pattern
            ),
            Error::UnresolvedForwardRef { model, reference } => write!(
                f,
                "{} refers to {:?}, which is not defined in this namespace",
                model, reference
            ),
            Error::Fetch(err) => write!(f, "fetch failed: {}", err),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Fetch(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for ormschema operations.
pub type Result<T> = std::result::Result<T, Error>;
