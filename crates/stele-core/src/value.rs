//! Attribute types and values.
//!
//! [`AttributeType`] is what an attribute declares; [`AttributeValue`] is what
//! an annotation instance or attribute store holds. Values are plain data:
//! nested annotations are either live [`Annotation`] instances or already
//! resolved [`AnnotationAttributes`] stores.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::annotation::Annotation;
use crate::attributes::AnnotationAttributes;

/// Reference to a class by its fully qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassRef(String);

impl ClassRef {
    /// Creates a class reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the referenced class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A constant of an enumeration type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    enum_type: String,
    constant: String,
}

impl EnumValue {
    /// Creates an enum constant reference.
    #[must_use]
    pub fn new(enum_type: impl Into<String>, constant: impl Into<String>) -> Self {
        Self {
            enum_type: enum_type.into(),
            constant: constant.into(),
        }
    }

    /// Returns the enumeration type name.
    #[must_use]
    pub fn enum_type(&self) -> &str {
        &self.enum_type
    }

    /// Returns the constant name.
    #[must_use]
    pub fn constant(&self) -> &str {
        &self.constant
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constant)
    }
}

/// Declared type of an annotation attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Text.
    String,
    /// Boolean flag.
    Bool,
    /// Integral number.
    Int,
    /// Floating point number.
    Float,
    /// Class reference.
    Class,
    /// Constant of the named enumeration.
    Enum(String),
    /// Nested annotation of the named type.
    Annotation(String),
    /// Array of the element type.
    Array(Box<AttributeType>),
}

impl AttributeType {
    /// Creates an array type of the given element type.
    #[must_use]
    pub fn array(element: AttributeType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Returns the element type for arrays.
    #[must_use]
    pub fn element_type(&self) -> Option<&AttributeType> {
        match self {
            Self::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the nested annotation type for annotation and annotation-array attributes.
    #[must_use]
    pub fn nested_annotation_type(&self) -> Option<&str> {
        match self {
            Self::Annotation(name) => Some(name),
            Self::Array(element) => match element.as_ref() {
                Self::Annotation(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Bool => f.write_str("boolean"),
            Self::Int => f.write_str("long"),
            Self::Float => f.write_str("double"),
            Self::Class => f.write_str("Class"),
            Self::Enum(name) => write!(f, "enum {name}"),
            Self::Annotation(name) => write!(f, "@{name}"),
            Self::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// A resolved attribute value.
///
/// Floats compare by bit pattern, so `NaN` equals itself and `0.0` differs
/// from `-0.0`. This keeps equality consistent with [`Hash`].
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// Text.
    String(String),
    /// Boolean flag.
    Bool(bool),
    /// Integral number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Class reference.
    Class(ClassRef),
    /// Enum constant.
    Enum(EnumValue),
    /// Nested annotation instance.
    Annotation(Annotation),
    /// Nested annotation rendered as an attribute store.
    Attributes(AnnotationAttributes),
    /// Array of values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns an empty array value.
    #[must_use]
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Returns a short name of the value's runtime type, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "long",
            Self::Float(_) => "double",
            Self::Class(_) => "Class",
            Self::Enum(_) => "enum",
            Self::Annotation(_) => "Annotation",
            Self::Attributes(_) => "AnnotationAttributes",
            Self::Array(_) => "array",
        }
    }

    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if this is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if the value conforms to the declared type.
    ///
    /// Nested annotations are accepted either as instances or as stores.
    #[must_use]
    pub fn conforms_to(&self, ty: &AttributeType) -> bool {
        match (self, ty) {
            (Self::String(_), AttributeType::String)
            | (Self::Bool(_), AttributeType::Bool)
            | (Self::Int(_), AttributeType::Int)
            | (Self::Float(_), AttributeType::Float)
            | (Self::Class(_), AttributeType::Class) => true,
            (Self::Enum(value), AttributeType::Enum(name)) => value.enum_type() == name,
            (Self::Annotation(a), AttributeType::Annotation(name)) => a.annotation_type() == name,
            (Self::Attributes(a), AttributeType::Annotation(name)) => {
                a.annotation_type().map_or(true, |t| t == name)
            }
            (Self::Array(items), AttributeType::Array(element)) => {
                items.iter().all(|item| item.conforms_to(element))
            }
            _ => false,
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Annotation(a), Self::Annotation(b)) => a == b,
            (Self::Attributes(a), Self::Attributes(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::String(s) => s.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Class(c) => c.hash(state),
            Self::Enum(e) => e.hash(state),
            Self::Annotation(a) => a.hash(state),
            Self::Attributes(a) => a.hash(state),
            Self::Array(items) => items.hash(state),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Class(c) => write!(f, "{c}"),
            Self::Enum(e) => write!(f, "{e}"),
            Self::Annotation(a) => write!(f, "{a}"),
            Self::Attributes(a) => write!(f, "{a}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<ClassRef> for AttributeValue {
    fn from(value: ClassRef) -> Self {
        Self::Class(value)
    }
}

impl From<EnumValue> for AttributeValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<Annotation> for AttributeValue {
    fn from(value: Annotation) -> Self {
        Self::Annotation(value)
    }
}

impl From<AnnotationAttributes> for AttributeValue {
    fn from(value: AnnotationAttributes) -> Self {
        Self::Attributes(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttributeValue>, const N: usize> From<[T; N]> for AttributeValue {
    fn from(values: [T; N]) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Conversion from a stored [`AttributeValue`] into a Rust type.
///
/// `Vec<T>` accepts both arrays and single values, wrapping the latter into a
/// one-element vector.
pub trait FromAttributeValue: Sized {
    /// Human-readable name of the expected type, used in mismatch errors.
    fn expected_type() -> String;

    /// Converts the value, or returns `None` if its type does not fit.
    fn from_attribute_value(value: &AttributeValue) -> Option<Self>;
}

impl FromAttributeValue for AttributeValue {
    fn expected_type() -> String {
        "any".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromAttributeValue for String {
    fn expected_type() -> String {
        "String".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromAttributeValue for bool {
    fn expected_type() -> String {
        "boolean".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromAttributeValue for i64 {
    fn expected_type() -> String {
        "long".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromAttributeValue for i32 {
    fn expected_type() -> String {
        "int".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromAttributeValue for f64 {
    fn expected_type() -> String {
        "double".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromAttributeValue for ClassRef {
    fn expected_type() -> String {
        "Class".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Class(c) => Some(c.clone()),
            _ => None,
        }
    }
}

impl FromAttributeValue for EnumValue {
    fn expected_type() -> String {
        "enum".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Enum(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl FromAttributeValue for Annotation {
    fn expected_type() -> String {
        "Annotation".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Annotation(a) => Some(a.clone()),
            _ => None,
        }
    }
}

impl FromAttributeValue for AnnotationAttributes {
    fn expected_type() -> String {
        "AnnotationAttributes".to_string()
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Attributes(a) => Some(a.clone()),
            AttributeValue::Annotation(a) => Some(AnnotationAttributes::from_annotation(a)),
            _ => None,
        }
    }
}

impl<T: FromAttributeValue> FromAttributeValue for Vec<T> {
    fn expected_type() -> String {
        format!("{}[]", T::expected_type())
    }

    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Array(items) => items.iter().map(T::from_attribute_value).collect(),
            single => T::from_attribute_value(single).map(|item| vec![item]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_type_display() {
        let ty = AttributeType::array(AttributeType::String);
        assert_eq!(ty.to_string(), "String[]");
        assert_eq!(ty.element_type(), Some(&AttributeType::String));
    }

    #[test]
    fn test_nested_annotation_type() {
        let single = AttributeType::Annotation("web.Header".to_string());
        let many = AttributeType::array(single.clone());
        assert_eq!(single.nested_annotation_type(), Some("web.Header"));
        assert_eq!(many.nested_annotation_type(), Some("web.Header"));
        assert_eq!(AttributeType::String.nested_annotation_type(), None);
    }

    #[test]
    fn test_single_value_wraps_into_vec() {
        let value = AttributeValue::from("x");
        let wrapped = Vec::<String>::from_attribute_value(&value);
        assert_eq!(wrapped, Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_mixed_array_does_not_convert() {
        let value = AttributeValue::Array(vec![AttributeValue::from("a"), AttributeValue::from(1)]);
        assert_eq!(Vec::<String>::from_attribute_value(&value), None);
    }

    #[test]
    fn test_conforms_to() {
        let array = AttributeValue::from(vec!["a", "b"]);
        assert!(array.conforms_to(&AttributeType::array(AttributeType::String)));
        assert!(!array.conforms_to(&AttributeType::String));
        assert!(AttributeValue::Int(3).conforms_to(&AttributeType::Int));
        assert!(AttributeValue::Enum(EnumValue::new("web.Method", "GET"))
            .conforms_to(&AttributeType::Enum("web.Method".to_string())));
    }

    #[test]
    fn test_float_equality_follows_hash() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &AttributeValue) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let nan = AttributeValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));

        let zero = AttributeValue::Float(0.0);
        let negative_zero = AttributeValue::Float(-0.0);
        assert_ne!(zero, negative_zero);
        assert_eq!(zero, AttributeValue::Float(0.0));
        assert_eq!(
            AttributeValue::Array(vec![AttributeValue::Float(1.5)]),
            AttributeValue::Array(vec![AttributeValue::Float(1.5)])
        );
    }

    #[test]
    fn test_display() {
        let value = AttributeValue::from(vec!["a", "b"]);
        assert_eq!(value.to_string(), "[a, b]");
        assert_eq!(AttributeValue::Class(ClassRef::new("app.User")).to_string(), "app.User");
    }

    #[test]
    fn test_i32_range_checked() {
        assert_eq!(i32::from_attribute_value(&AttributeValue::Int(7)), Some(7));
        assert_eq!(i32::from_attribute_value(&AttributeValue::Int(i64::MAX)), None);
    }
}
