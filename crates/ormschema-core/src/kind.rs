//! Attribute kind flags.
//!
//! Every attribute of a mapped class belongs to exactly one primitive kind
//! (column, property, relationship, ...). Kinds combine with `|` so that
//! callers can ask for "any of these kinds" in one value.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};

use serde::{Serialize, Serializer};

/// A set of attribute kinds, stored as bit flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeKind(u32);

impl AttributeKind {
    /// Empty set.
    pub const NONE: Self = Self(0);

    /// Stored columns.
    pub const COLUMN: Self = Self(1 << 0);

    /// Readable computed properties.
    pub const PROPERTY_R: Self = Self(1 << 1);
    /// Writable computed properties.
    pub const PROPERTY_W: Self = Self(1 << 2);
    /// Readable or writable properties (any of!).
    pub const PROPERTY_RW: Self = Self(Self::PROPERTY_R.0 | Self::PROPERTY_W.0);

    /// Readable hybrid properties (usable both on instances and in queries).
    pub const HYBRID_PROPERTY_R: Self = Self(1 << 3);
    /// Writable hybrid properties.
    pub const HYBRID_PROPERTY_W: Self = Self(1 << 4);
    /// Readable or writable hybrid properties.
    pub const HYBRID_PROPERTY_RW: Self =
        Self(Self::HYBRID_PROPERTY_R.0 | Self::HYBRID_PROPERTY_W.0);

    /// To-one and to-many relationships.
    pub const RELATIONSHIP: Self = Self(1 << 5);
    /// Relationships that are queried lazily on every access.
    pub const DYNAMIC_LOADER: Self = Self(1 << 6);
    /// Attributes proxied through a relationship.
    pub const ASSOCIATION_PROXY: Self = Self(1 << 7);
    /// One value backed by multiple columns.
    pub const COMPOSITE: Self = Self(1 << 8);
    /// Derived SQL expressions.
    pub const EXPRESSION: Self = Self(1 << 9);
    /// Computed methods.
    pub const HYBRID_METHOD: Self = Self(1 << 10);
    /// Application-specific attributes, for third-party extractors.
    pub const APPLICATION_CUSTOM: Self = Self(1 << 11);

    /// Everything stored in the model's own table.
    pub const ALL_COLUMNS: Self = Self(Self::COLUMN.0 | Self::COMPOSITE.0 | Self::EXPRESSION.0);
    /// Every kind of property.
    pub const ALL_PROPERTIES: Self = Self(Self::PROPERTY_RW.0 | Self::HYBRID_PROPERTY_RW.0);
    /// Everything available without a join.
    pub const ALL_LOCAL_FIELDS: Self = Self(Self::ALL_COLUMNS.0 | Self::ALL_PROPERTIES.0);
    /// Relationships and proxies. Dynamic loaders are left out: they can be huge.
    pub const ALL_RELATIONSHIPS: Self = Self(Self::RELATIONSHIP.0 | Self::ASSOCIATION_PROXY.0);
    /// Everything.
    pub const ALL: Self = Self(
        Self::ALL_LOCAL_FIELDS.0
            | Self::ALL_RELATIONSHIPS.0
            | Self::DYNAMIC_LOADER.0
            | Self::HYBRID_METHOD.0
            | Self::APPLICATION_CUSTOM.0,
    );

    const NAMES: &'static [(&'static str, AttributeKind)] = &[
        ("COLUMN", Self::COLUMN),
        ("PROPERTY_R", Self::PROPERTY_R),
        ("PROPERTY_W", Self::PROPERTY_W),
        ("HYBRID_PROPERTY_R", Self::HYBRID_PROPERTY_R),
        ("HYBRID_PROPERTY_W", Self::HYBRID_PROPERTY_W),
        ("RELATIONSHIP", Self::RELATIONSHIP),
        ("DYNAMIC_LOADER", Self::DYNAMIC_LOADER),
        ("ASSOCIATION_PROXY", Self::ASSOCIATION_PROXY),
        ("COMPOSITE", Self::COMPOSITE),
        ("EXPRESSION", Self::EXPRESSION),
        ("HYBRID_METHOD", Self::HYBRID_METHOD),
        ("APPLICATION_CUSTOM", Self::APPLICATION_CUSTOM),
    ];

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if no kind is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every kind in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one kind.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Names of the primitive kinds set in this value.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, kind)| self.contains(*kind))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Parse a primitive or collection kind name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        if let Some((_, kind)) = Self::NAMES.iter().find(|(n, _)| *n == upper) {
            return Some(*kind);
        }
        match upper.as_str() {
            "NONE" => Some(Self::NONE),
            "PROPERTY_RW" => Some(Self::PROPERTY_RW),
            "HYBRID_PROPERTY_RW" => Some(Self::HYBRID_PROPERTY_RW),
            "ALL_COLUMNS" => Some(Self::ALL_COLUMNS),
            "ALL_PROPERTIES" => Some(Self::ALL_PROPERTIES),
            "ALL_LOCAL_FIELDS" => Some(Self::ALL_LOCAL_FIELDS),
            "ALL_RELATIONSHIPS" => Some(Self::ALL_RELATIONSHIPS),
            "ALL" => Some(Self::ALL),
            _ => None,
        }
    }
}

impl BitOr for AttributeKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttributeKind {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AttributeKind {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Sub for AttributeKind {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl fmt::Debug for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "AttributeKind(NONE)");
        }
        write!(f, "AttributeKind({})", self.names().join(" | "))
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for AttributeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
