//! Annotated elements.
//!
//! An [`Element`] is a value-type key naming something that carries
//! annotations. Elements are cheap to clone and hash, which lets them act as
//! cache keys and members of a search's visited set.

use std::fmt;

/// Reference to a method by declaring class, name and parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef {
    /// Declaring class or interface.
    pub class: String,
    /// Method name.
    pub name: String,
    /// Parameter type names.
    pub parameters: Vec<String>,
}

impl MethodRef {
    /// Creates a method reference.
    #[must_use]
    pub fn new<I, S>(class: impl Into<String>, name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the same signature declared on another class.
    #[must_use]
    pub fn on_class(&self, class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: self.name.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.class, self.name, self.parameters.join(", "))
    }
}

/// Something annotations can be declared on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// A class or interface.
    Class(String),
    /// A method.
    Method(MethodRef),
    /// An annotation type, carrying its meta-annotations.
    AnnotationType(String),
}

impl Element {
    /// Creates a class element.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Creates a method element.
    #[must_use]
    pub fn method<I, S>(class: impl Into<String>, name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Method(MethodRef::new(class, name, parameters))
    }

    /// Creates an annotation type element.
    #[must_use]
    pub fn annotation_type(name: impl Into<String>) -> Self {
        Self::AnnotationType(name.into())
    }

    /// Returns `true` for annotation type elements.
    #[must_use]
    pub fn is_annotation_type(&self) -> bool {
        matches!(self, Self::AnnotationType(_))
    }

    /// Returns a stable label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Method(_) => "method",
            Self::AnnotationType(_) => "annotation_type",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "class {name}"),
            Self::Method(method) => write!(f, "method {method}"),
            Self::AnnotationType(name) => write!(f, "annotation type @{name}"),
        }
    }
}

impl From<MethodRef> for Element {
    fn from(method: MethodRef) -> Self {
        Self::Method(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Element::class("app.Api").to_string(), "class app.Api");
        assert_eq!(
            Element::method("app.Api", "get", ["long", "String"]).to_string(),
            "method app.Api.get(long, String)"
        );
        assert_eq!(
            Element::annotation_type("web.Mapping").to_string(),
            "annotation type @web.Mapping"
        );
    }

    #[test]
    fn test_on_class_keeps_signature() {
        let m = MethodRef::new("app.Impl", "handle", ["String"]);
        let moved = m.on_class("app.Api");
        assert_eq!(moved.class, "app.Api");
        assert_eq!(moved.name, "handle");
        assert_eq!(moved.parameters, vec!["String".to_string()]);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Element::class("A").kind(), "class");
        assert!(Element::annotation_type("A").is_annotation_type());
    }
}
