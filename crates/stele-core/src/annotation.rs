//! Annotation instances.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::value::AttributeValue;

/// An annotation declared on an element.
///
/// Only explicitly declared values are stored. Attributes left unset read as
/// the default declared by the annotation type in the [`TypeRegistry`](crate::TypeRegistry).
///
/// # Example
///
/// ```
/// use stele_core::Annotation;
///
/// let mapping = Annotation::new("web.Mapping").with("path", "/users");
/// assert_eq!(mapping.annotation_type(), "web.Mapping");
/// assert_eq!(mapping.to_string(), "@web.Mapping(path=/users)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    annotation_type: String,
    values: IndexMap<String, AttributeValue>,
}

impl Annotation {
    /// Creates an annotation of the named type with no explicit values.
    #[must_use]
    pub fn new(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            values: IndexMap::new(),
        }
    }

    /// Adds an explicit attribute value.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(attribute.into(), value.into());
        self
    }

    /// Returns the fully qualified annotation type name.
    #[must_use]
    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    /// Returns the explicit value of an attribute.
    #[must_use]
    pub fn value(&self, attribute: &str) -> Option<&AttributeValue> {
        self.values.get(attribute)
    }

    /// Returns all explicit values in declaration order.
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, AttributeValue> {
        &self.values
    }

    /// Returns `true` if the attribute was declared explicitly.
    #[must_use]
    pub fn is_explicit(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }
}

impl Eq for Annotation {}

impl Hash for Annotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation_type.hash(state);
        state.write_u64(unordered_hash(&self.values));
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.annotation_type)?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// Hashes map entries independently of their order, matching `IndexMap` equality.
pub(crate) fn unordered_hash(values: &IndexMap<String, AttributeValue>) -> u64 {
    values.iter().fold(0u64, |acc, entry| {
        let mut hasher = DefaultHasher::new();
        entry.hash(&mut hasher);
        acc.wrapping_add(hasher.finish())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_declaration_order() {
        let a = Annotation::new("T").with("x", 1).with("y", "b");
        let b = Annotation::new("T").with("y", "b").with("x", 1);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_type_participates_in_equality() {
        assert_ne!(Annotation::new("A"), Annotation::new("B"));
    }

    #[test]
    fn test_display_without_values() {
        assert_eq!(Annotation::new("app.Marker").to_string(), "@app.Marker()");
    }

    #[test]
    fn test_explicit_values() {
        let a = Annotation::new("T").with("x", true);
        assert!(a.is_explicit("x"));
        assert!(!a.is_explicit("y"));
        assert_eq!(a.value("x"), Some(&AttributeValue::Bool(true)));
    }
}
