//! Storage types and the value-type vocabulary.
//!
//! `SqlType` is what a column is declared as in storage. `TypeRef` is the
//! language-level type an attribute exposes to consumers: it is what schema
//! synthesis renders and what descriptors carry as `value_type`.

use std::fmt;

use serde::Serialize;

/// SQL data types a column may be declared with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal { precision: u8, scale: u8 },
    Numeric { precision: u8, scale: u8 },
    Char(u32),
    VarChar(u32),
    Text,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    TimestampTz,
    Interval,
    Uuid,
    Json,
    JsonB,
    /// Enumerated type, by name.
    Enum(String),
    /// Anything the engine does not know how to map.
    Custom(String),
}

impl SqlType {
    /// SQL name of the type, as it would appear in DDL.
    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::TinyInt => "TINYINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            SqlType::Numeric { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            SqlType::Char(n) => format!("CHAR({n})"),
            SqlType::VarChar(n) => format!("VARCHAR({n})"),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_string(),
            SqlType::Interval => "INTERVAL".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::JsonB => "JSONB".to_string(),
            SqlType::Enum(name) | SqlType::Custom(name) => name.clone(),
        }
    }

    /// The value type an attribute of this storage type exposes.
    ///
    /// Unknown storage types fall back to [`TypeRef::Any`].
    #[must_use]
    pub fn value_type(&self) -> TypeRef {
        match self {
            SqlType::Boolean => TypeRef::Bool,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                TypeRef::Int
            }
            SqlType::Real | SqlType::Double => TypeRef::Float,
            SqlType::Decimal { .. } | SqlType::Numeric { .. } => TypeRef::Decimal,
            SqlType::Char(_) | SqlType::VarChar(_) | SqlType::Text => TypeRef::Str,
            SqlType::Blob => TypeRef::Bytes,
            SqlType::Date => TypeRef::Date,
            SqlType::Time => TypeRef::Time,
            SqlType::DateTime | SqlType::Timestamp | SqlType::TimestampTz => TypeRef::DateTime,
            SqlType::Interval => TypeRef::Interval,
            SqlType::Uuid => TypeRef::Uuid,
            SqlType::Json | SqlType::JsonB => TypeRef::Json,
            SqlType::Enum(name) => TypeRef::Enum(name.clone()),
            SqlType::Custom(_) => TypeRef::Any,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}

/// A value type, as exposed by an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    /// Unknown, or anything.
    Any,
    /// The null type. Only meaningful inside a `Union`.
    None,
    Bool,
    Int,
    Float,
    Decimal,
    Str,
    Bytes,
    Date,
    Time,
    DateTime,
    Interval,
    Uuid,
    Json,
    Enum(String),
    /// A plain value class, e.g. the class a composite is exposed as.
    Class(String),
    /// A mapped model.
    Model(String),
    /// A reference by name to a model that is resolved later.
    ForwardRef(String),
    Optional(Box<TypeRef>),
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Dict(Box<TypeRef>, Box<TypeRef>),
    Union(Vec<TypeRef>),
}

impl TypeRef {
    /// `List[item]`
    #[must_use]
    pub fn list(item: TypeRef) -> Self {
        TypeRef::List(Box::new(item))
    }

    /// `Set[item]`
    #[must_use]
    pub fn set(item: TypeRef) -> Self {
        TypeRef::Set(Box::new(item))
    }

    /// `Dict[key, value]`
    #[must_use]
    pub fn dict(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Dict(Box::new(key), Box::new(value))
    }

    /// A mapped model, by name.
    pub fn model(name: impl Into<String>) -> Self {
        TypeRef::Model(name.into())
    }

    /// Wrap into `Optional[..]`.
    ///
    /// Idempotent: an already optional type is returned unchanged, and so is
    /// `Any`, which admits null anyway.
    #[must_use]
    pub fn optional(self) -> Self {
        if self.is_optional() {
            self
        } else {
            TypeRef::Optional(Box::new(self))
        }
    }

    /// True for `Optional[..]`, for a union that admits `None`, and for `Any`.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        match self {
            TypeRef::Any | TypeRef::None | TypeRef::Optional(_) => true,
            TypeRef::Union(members) => members.iter().any(|m| *m == TypeRef::None),
            _ => false,
        }
    }

    /// Strip one layer of optionality.
    ///
    /// `Optional[T]` becomes `T`; `Union[A, B, None]` becomes `Union[A, B]`
    /// (or `A` when a single member is left). Anything else is returned as is.
    #[must_use]
    pub fn unwrap_optional(self) -> Self {
        match self {
            TypeRef::Optional(inner) => *inner,
            TypeRef::Union(members) if members.contains(&TypeRef::None) => {
                let mut rest: Vec<TypeRef> =
                    members.into_iter().filter(|m| *m != TypeRef::None).collect();
                if rest.len() == 1 {
                    rest.remove(0)
                } else {
                    TypeRef::Union(rest)
                }
            }
            other => other,
        }
    }

    /// True for list, set and dict types.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::List(_) | TypeRef::Set(_) | TypeRef::Dict(..))
    }

    /// Rewrite every `Model(..)` reference, recursively.
    #[must_use]
    pub fn map_models(self, f: &impl Fn(String) -> TypeRef) -> Self {
        match self {
            TypeRef::Model(name) => f(name),
            TypeRef::Optional(inner) => TypeRef::Optional(Box::new(inner.map_models(f))),
            TypeRef::List(inner) => TypeRef::List(Box::new(inner.map_models(f))),
            TypeRef::Set(inner) => TypeRef::Set(Box::new(inner.map_models(f))),
            TypeRef::Dict(k, v) => {
                TypeRef::Dict(Box::new(k.map_models(f)), Box::new(v.map_models(f)))
            }
            TypeRef::Union(members) => {
                TypeRef::Union(members.into_iter().map(|m| m.map_models(f)).collect())
            }
            other => other,
        }
    }

    /// Names of all forward references inside this type.
    #[must_use]
    pub fn forward_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_forward_refs(&mut out);
        out
    }

    fn collect_forward_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::ForwardRef(name) => out.push(name),
            TypeRef::Optional(inner) | TypeRef::List(inner) | TypeRef::Set(inner) => {
                inner.collect_forward_refs(out);
            }
            TypeRef::Dict(k, v) => {
                k.collect_forward_refs(out);
                v.collect_forward_refs(out);
            }
            TypeRef::Union(members) => {
                for m in members {
                    m.collect_forward_refs(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("Any"),
            TypeRef::None => f.write_str("None"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Decimal => f.write_str("Decimal"),
            TypeRef::Str => f.write_str("str"),
            TypeRef::Bytes => f.write_str("bytes"),
            TypeRef::Date => f.write_str("date"),
            TypeRef::Time => f.write_str("time"),
            TypeRef::DateTime => f.write_str("datetime"),
            TypeRef::Interval => f.write_str("timedelta"),
            TypeRef::Uuid => f.write_str("UUID"),
            TypeRef::Json => f.write_str("Json"),
            TypeRef::Enum(name) | TypeRef::Class(name) | TypeRef::Model(name) => {
                f.write_str(name)
            }
            TypeRef::ForwardRef(name) => write!(f, "{name:?}"),
            TypeRef::Optional(inner) => write!(f, "Optional[{inner}]"),
            TypeRef::List(inner) => write!(f, "List[{inner}]"),
            TypeRef::Set(inner) => write!(f, "Set[{inner}]"),
            TypeRef::Dict(k, v) => write!(f, "Dict[{k}, {v}]"),
            TypeRef::Union(members) => {
                f.write_str("Union[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str("]")
            }
        }
    }
}
