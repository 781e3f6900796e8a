//! Attribute stores.
//!
//! [`AnnotationAttributes`] is the ordered name/value container produced by
//! merging and consumed by synthesis. It never stores absent values: an
//! attribute either has a key or it does not. The owning annotation type is
//! carried for diagnostics only.
//!
//! # Example
//!
//! ```
//! use stele_core::AnnotationAttributes;
//!
//! let mut attributes = AnnotationAttributes::for_type("web.Secured");
//! attributes.insert("roles", "admin");
//!
//! // A single value reads as a one-element array.
//! assert_eq!(attributes.get_string_array("roles").unwrap(), vec!["admin".to_string()]);
//! assert!(attributes.get_bool("roles").is_err());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::annotation::{unordered_hash, Annotation};
use crate::error::{SteleError, SteleResult};
use crate::value::{AttributeValue, ClassRef, EnumValue, FromAttributeValue};

const UNKNOWN: &str = "unknown";

/// Resolved attributes of one annotation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationAttributes {
    annotation_type: Option<String>,
    display_name: Option<String>,
    values: IndexMap<String, AttributeValue>,
}

impl AnnotationAttributes {
    /// Creates an empty store with no owning annotation type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store owned by the named annotation type.
    #[must_use]
    pub fn for_type(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_type: Some(annotation_type.into()),
            display_name: None,
            values: IndexMap::new(),
        }
    }

    /// Creates a store holding an annotation's explicit values.
    ///
    /// Defaults are not filled in; the registry is needed for that.
    #[must_use]
    pub fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            annotation_type: Some(annotation.annotation_type().to_string()),
            display_name: None,
            values: annotation.values().clone(),
        }
    }

    /// Overrides the name shown in diagnostics.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the owning annotation type.
    #[must_use]
    pub fn annotation_type(&self) -> Option<&str> {
        self.annotation_type.as_deref()
    }

    /// Returns the name used in diagnostics.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.annotation_type.as_deref())
            .unwrap_or(UNKNOWN)
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Removes a value, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.shift_remove(name)
    }

    /// Returns the raw value of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Returns `true` if the attribute is present.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates attribute names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<String, AttributeValue> {
        &self.values
    }

    /// Reads an attribute as `T`.
    ///
    /// Fails with [`SteleError::AttributeNotFound`] when absent and with
    /// [`SteleError::AttributeTypeMismatch`] when the stored value has
    /// another type.
    pub fn get_required<T: FromAttributeValue>(&self, name: &str) -> SteleResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| SteleError::attribute_not_found(name, self.display_name()))?;
        self.convert(name, value)
    }

    /// Reads an attribute as `T`, returning `None` when absent.
    pub fn get_optional<T: FromAttributeValue>(&self, name: &str) -> SteleResult<Option<T>> {
        self.get(name).map(|value| self.convert(name, value)).transpose()
    }

    fn convert<T: FromAttributeValue>(&self, name: &str, value: &AttributeValue) -> SteleResult<T> {
        T::from_attribute_value(value).ok_or_else(|| {
            SteleError::type_mismatch(name, self.display_name(), T::expected_type(), value.type_name())
        })
    }

    /// Reads a string attribute.
    pub fn get_string(&self, name: &str) -> SteleResult<String> {
        self.get_required(name)
    }

    /// Reads a string array attribute; a single string reads as one element.
    pub fn get_string_array(&self, name: &str) -> SteleResult<Vec<String>> {
        self.get_required(name)
    }

    /// Reads a boolean attribute.
    pub fn get_bool(&self, name: &str) -> SteleResult<bool> {
        self.get_required(name)
    }

    /// Reads an integral attribute.
    pub fn get_int(&self, name: &str) -> SteleResult<i64> {
        self.get_required(name)
    }

    /// Reads a floating point attribute.
    pub fn get_float(&self, name: &str) -> SteleResult<f64> {
        self.get_required(name)
    }

    /// Reads an enum attribute.
    pub fn get_enum(&self, name: &str) -> SteleResult<EnumValue> {
        self.get_required(name)
    }

    /// Reads a class attribute.
    ///
    /// Class names stored as strings are accepted as well.
    pub fn get_class(&self, name: &str) -> SteleResult<ClassRef> {
        self.get_required::<ClassName>(name).map(|c| c.0)
    }

    /// Reads a class array attribute; a single class reads as one element.
    pub fn get_class_array(&self, name: &str) -> SteleResult<Vec<ClassRef>> {
        self.get_required::<Vec<ClassName>>(name)
            .map(|classes| classes.into_iter().map(|c| c.0).collect())
    }

    /// Reads a nested annotation attribute as an attribute store.
    pub fn get_annotation(&self, name: &str) -> SteleResult<AnnotationAttributes> {
        self.get_required(name)
    }

    /// Reads a nested annotation array attribute as attribute stores.
    pub fn get_annotation_array(&self, name: &str) -> SteleResult<Vec<AnnotationAttributes>> {
        self.get_required(name)
    }
}

/// Accepts class references and class names rendered as strings.
struct ClassName(ClassRef);

impl FromAttributeValue for ClassName {
    fn expected_type() -> String {
        ClassRef::expected_type()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Class(c) => Some(Self(c.clone())),
            AttributeValue::String(s) => Some(Self(ClassRef::new(s.clone()))),
            _ => None,
        }
    }
}

impl PartialEq for AnnotationAttributes {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Hash for AnnotationAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(unordered_hash(&self.values));
    }
}

impl fmt::Display for AnnotationAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for AnnotationAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            annotation_type: None,
            display_name: None,
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> Extend<(K, V)> for AnnotationAttributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Attribute values collected from every matching annotation, per name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiValueAttributes {
    values: IndexMap<String, Vec<AttributeValue>>,
}

impl MultiValueAttributes {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under a name.
    pub fn add(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.values.entry(name.into()).or_default().push(value);
    }

    /// Appends every attribute of a store.
    pub fn add_all(&mut self, attributes: &AnnotationAttributes) {
        for (name, value) in attributes.iter() {
            self.add(name, value.clone());
        }
    }

    /// Returns every value collected under a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[AttributeValue]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Returns the first value collected under a name.
    #[must_use]
    pub fn get_first(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name).and_then(|v| v.first())
    }

    /// Iterates names in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates names with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_value_reads_as_array() {
        let attrs = AnnotationAttributes::for_type("web.Secured").with("roles", "x");
        assert_eq!(attrs.get_string_array("roles").unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn test_type_mismatch_is_descriptive() {
        let attrs = AnnotationAttributes::for_type("web.Secured").with("roles", "x");
        let err = attrs.get_bool("roles").unwrap_err();
        assert_eq!(
            err,
            SteleError::type_mismatch("roles", "web.Secured", "boolean", "String")
        );
    }

    #[test]
    fn test_missing_attribute_uses_display_name() {
        let attrs = AnnotationAttributes::new();
        let err = attrs.get_string("path").unwrap_err();
        assert_eq!(err, SteleError::attribute_not_found("path", "unknown"));

        let named = AnnotationAttributes::for_type("web.Mapping").with_display_name("Mapping");
        assert!(named.get_string("path").unwrap_err().to_string().contains("[Mapping]"));
    }

    #[test]
    fn test_get_optional() {
        let attrs = AnnotationAttributes::new().with("order", 3);
        assert_eq!(attrs.get_optional::<i64>("order").unwrap(), Some(3));
        assert_eq!(attrs.get_optional::<i64>("missing").unwrap(), None);
        assert!(attrs.get_optional::<bool>("order").is_err());
    }

    #[test]
    fn test_class_reads_from_string() {
        let attrs = AnnotationAttributes::new()
            .with("type", "app.User")
            .with("types", AttributeValue::Class(ClassRef::new("app.Order")));
        assert_eq!(attrs.get_class("type").unwrap(), ClassRef::new("app.User"));
        assert_eq!(attrs.get_class_array("types").unwrap(), vec![ClassRef::new("app.Order")]);
    }

    #[test]
    fn test_nested_annotation_reads_as_store() {
        let nested = Annotation::new("web.Header").with("name", "Accept");
        let attrs = AnnotationAttributes::new().with("headers", vec![nested]);
        let headers = attrs.get_annotation_array("headers").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].get_string("name").unwrap(), "Accept");
    }

    #[test]
    fn test_display_and_order() {
        let mut attrs = AnnotationAttributes::new().with("b", 1).with("a", 2);
        assert_eq!(attrs.to_string(), "{b=1, a=2}");
        attrs.insert("b", 3);
        assert_eq!(attrs.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        attrs.remove("b");
        assert_eq!(attrs.to_string(), "{a=2}");
    }

    #[test]
    fn test_multi_value_attributes() {
        let mut all = MultiValueAttributes::new();
        all.add_all(&AnnotationAttributes::new().with("path", "/a"));
        all.add_all(&AnnotationAttributes::new().with("path", "/b"));
        assert_eq!(all.get("path").map(<[AttributeValue]>::len), Some(2));
        assert_eq!(all.get_first("path"), Some(&AttributeValue::from("/a")));
    }

    proptest! {
        #[test]
        fn prop_equality_ignores_order(pairs in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8)) {
            let forward: AnnotationAttributes = pairs.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let backward: AnnotationAttributes = pairs.iter().rev().map(|(k, v)| (k.clone(), *v)).collect();
            prop_assert_eq!(&forward, &backward);

            use std::collections::hash_map::DefaultHasher;
            let mut h1 = DefaultHasher::new();
            let mut h2 = DefaultHasher::new();
            forward.hash(&mut h1);
            backward.hash(&mut h2);
            prop_assert_eq!(h1.finish(), h2.finish());
        }
    }
}
