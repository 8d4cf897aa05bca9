//! Schema model naming.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use ormschema_core::{Error, Result};

const PLACEHOLDER: &str = "model";

fn placeholder_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(r"\{([A-Za-z_]*)\}").ok())
        .as_ref()
}

/// A naming pattern such as `"{model}Input"`.
///
/// Every schema model in a namespace is named by the same pattern, which is
/// how forward references between them resolve.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Naming {
    pattern: String,
}

impl Naming {
    /// Validate a pattern: it must contain `{model}`, and no other placeholder.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let invalid = || Error::InvalidNaming {
            pattern: pattern.clone(),
        };

        let regex = placeholder_regex().ok_or_else(invalid)?;
        let mut found = false;
        for captures in regex.captures_iter(&pattern) {
            match captures.get(1).map(|m| m.as_str()) {
                Some(PLACEHOLDER) => found = true,
                _ => return Err(invalid()),
            }
        }
        if !found {
            return Err(invalid());
        }
        Ok(Self { pattern })
    }

    /// The identity pattern, `"{model}"`.
    pub fn identity() -> Self {
        Self {
            pattern: format!("{{{PLACEHOLDER}}}"),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Schema name for a model name.
    pub fn name_for(&self, model: &str) -> String {
        self.pattern.replace("{model}", model)
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Naming({:?})", self.pattern)
    }
}

impl TryFrom<&str> for Naming {
    type Error = Error;

    fn try_from(pattern: &str) -> Result<Self> {
        Self::new(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_patterns() {
        let naming = Naming::new("{model}Input").unwrap();
        assert_eq!(naming.name_for("User"), "UserInput");
        assert_eq!(Naming::new("Db{model}").unwrap().name_for("User"), "DbUser");
        assert_eq!(Naming::default().name_for("User"), "User");
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["Input", "{name}Input", "{model}{other}", ""] {
            assert!(
                matches!(Naming::new(pattern), Err(Error::InvalidNaming { .. })),
                "{pattern:?} should be rejected"
            );
        }
    }
}
