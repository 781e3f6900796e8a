//! The type registry.
//!
//! Stele has no runtime reflection to lean on, so annotation types, classes,
//! interfaces and methods are described up front and collected into an
//! immutable [`TypeRegistry`]. Every lookup the search engine performs goes
//! through the registry; names it cannot resolve surface as introspection
//! errors.
//!
//! # Example
//!
//! ```
//! use stele_core::{
//!     Annotation, AnnotationType, AttributeMethod, AttributeType, ClassDef, TypeRegistry,
//! };
//!
//! let registry = TypeRegistry::builder()
//!     .annotation_type(
//!         AnnotationType::new("web.Mapping")
//!             .attribute(AttributeMethod::new("path", AttributeType::String).default_value("")),
//!     )
//!     .class(ClassDef::class("app.Api").annotated(Annotation::new("web.Mapping").with("path", "/api")))
//!     .build();
//!
//! assert!(registry.annotation_type("web.Mapping").is_ok());
//! assert!(registry.class("app.Missing").is_err());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::annotation::Annotation;
use crate::element::{Element, MethodRef};
use crate::error::{SteleError, SteleResult};
use crate::schema::AnnotationSchema;
use crate::value::{AttributeType, AttributeValue};

/// Built-in marker annotations.
pub mod meta {
    /// Namespace holding the built-in markers.
    pub const NAMESPACE: &str = "stele.meta";
    /// Marks an annotation type whose class-level instances are inherited by subclasses.
    pub const INHERITED: &str = "stele.meta.Inherited";
    /// Marks an annotation type as part of the documented API.
    pub const DOCUMENTED: &str = "stele.meta.Documented";
    /// Declares how long instances of an annotation type are retained.
    pub const RETENTION: &str = "stele.meta.Retention";
    /// Conventional name of an annotation's primary attribute.
    pub const VALUE: &str = "value";
}

/// Alias declaration on an attribute.
///
/// With only `attribute` set the alias names another attribute of the same
/// annotation type. With only `annotation` set it overrides the same-named
/// attribute of that meta-annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AliasFor {
    /// Aliased annotation type; the declaring type when `None`.
    pub annotation: Option<String>,
    /// Aliased attribute; the declaring attribute's own name when `None`.
    pub attribute: Option<String>,
}

impl AliasFor {
    /// Aliases another attribute of the same annotation type.
    #[must_use]
    pub fn attribute(attribute: impl Into<String>) -> Self {
        Self {
            annotation: None,
            attribute: Some(attribute.into()),
        }
    }

    /// Overrides the same-named attribute of a meta-annotation.
    #[must_use]
    pub fn meta(annotation: impl Into<String>) -> Self {
        Self {
            annotation: Some(annotation.into()),
            attribute: None,
        }
    }

    /// Overrides a named attribute of a meta-annotation.
    #[must_use]
    pub fn meta_attribute(annotation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            annotation: Some(annotation.into()),
            attribute: Some(attribute.into()),
        }
    }
}

/// An attribute declared by an annotation type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMethod {
    name: String,
    attribute_type: AttributeType,
    default: Option<AttributeValue>,
    alias_for: Option<AliasFor>,
}

impl AttributeMethod {
    /// Creates an attribute with no default and no alias.
    #[must_use]
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            default: None,
            alias_for: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Declares an alias.
    #[must_use]
    pub fn alias_for(mut self, alias: AliasFor) -> Self {
        self.alias_for = Some(alias);
        self
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn attribute_type(&self) -> &AttributeType {
        &self.attribute_type
    }

    /// Returns the declared default value.
    #[must_use]
    pub fn default(&self) -> Option<&AttributeValue> {
        self.default.as_ref()
    }

    /// Returns the alias declaration.
    #[must_use]
    pub fn alias(&self) -> Option<&AliasFor> {
        self.alias_for.as_ref()
    }
}

/// Schema of one annotation type.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationType {
    name: String,
    attributes: Vec<AttributeMethod>,
    meta_annotations: Vec<Annotation>,
}

impl AnnotationType {
    /// Creates an annotation type with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            meta_annotations: Vec::new(),
        }
    }

    /// Declares an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeMethod) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declares a meta-annotation on this type.
    #[must_use]
    pub fn meta_annotation(mut self, annotation: Annotation) -> Self {
        self.meta_annotations.push(annotation);
        self
    }

    /// Marks the type as inherited by subclasses of annotated classes.
    #[must_use]
    pub fn inherited(self) -> Self {
        self.meta_annotation(Annotation::new(meta::INHERITED))
    }

    /// Returns the fully qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeMethod] {
        &self.attributes
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeMethod> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the default value of an attribute.
    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&AttributeValue> {
        self.find_attribute(name).and_then(AttributeMethod::default)
    }

    /// Returns the meta-annotations declared on this type.
    #[must_use]
    pub fn meta_annotations(&self) -> &[Annotation] {
        &self.meta_annotations
    }

    /// Returns `true` if the type carries the inherited marker.
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.meta_annotations
            .iter()
            .any(|a| a.annotation_type() == meta::INHERITED)
    }
}

/// Whether a [`ClassDef`] is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// A concrete or abstract class.
    Class,
    /// An interface.
    Interface,
}

/// A method declared on a class or interface.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    name: String,
    parameters: Vec<String>,
    annotations: Vec<Annotation>,
    bridge_target: Option<Vec<String>>,
}

impl MethodDef {
    /// Creates a method with the given parameter types.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            annotations: Vec::new(),
            bridge_target: None,
        }
    }

    /// Declares an annotation on the method.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Marks the method as a bridge delegating to the same-named method
    /// with the given parameter types.
    #[must_use]
    pub fn bridge_to<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bridge_target = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter types.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Returns the annotations declared on the method.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the parameter types of the bridged method, for bridge methods.
    #[must_use]
    pub fn bridge_target(&self) -> Option<&[String]> {
        self.bridge_target.as_deref()
    }

    fn matches(&self, name: &str, parameters: &[String]) -> bool {
        self.name == name && self.parameters == parameters
    }
}

/// A class or interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    name: String,
    kind: ClassKind,
    superclass: Option<String>,
    interfaces: Vec<String>,
    annotations: Vec<Annotation>,
    methods: Vec<MethodDef>,
}

impl ClassDef {
    /// Creates a class.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    /// Creates an interface.
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds a directly implemented (or, for interfaces, extended) interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Declares an annotation on the class.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declares a method.
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns the fully qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this is a class or an interface.
    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Returns the superclass name.
    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Returns the directly declared interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Returns the annotations declared on the class.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the declared methods.
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Looks up a declared method by signature.
    #[must_use]
    pub fn declared_method(&self, name: &str, parameters: &[String]) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.matches(name, parameters))
    }
}

/// Immutable registry of annotation types, classes and methods.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    annotation_types: IndexMap<String, Arc<AnnotationType>>,
    classes: IndexMap<String, ClassDef>,
}

impl TypeRegistry {
    /// Creates a builder pre-populated with the built-in markers.
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Looks up an annotation type.
    pub fn annotation_type(&self, name: &str) -> SteleResult<Arc<AnnotationType>> {
        self.annotation_types
            .get(name)
            .cloned()
            .ok_or_else(|| SteleError::unknown_annotation_type(name))
    }

    /// Returns `true` if the annotation type is registered.
    #[must_use]
    pub fn contains_annotation_type(&self, name: &str) -> bool {
        self.annotation_types.contains_key(name)
    }

    /// Returns every registered annotation type name.
    pub fn annotation_type_names(&self) -> impl Iterator<Item = &str> {
        self.annotation_types.keys().map(String::as_str)
    }

    /// Looks up a class or interface.
    pub fn class(&self, name: &str) -> SteleResult<&ClassDef> {
        self.classes
            .get(name)
            .ok_or_else(|| SteleError::unknown_class(name))
    }

    /// Looks up a declared method.
    pub fn method(&self, method: &MethodRef) -> SteleResult<&MethodDef> {
        self.class(&method.class)?
            .declared_method(&method.name, &method.parameters)
            .ok_or_else(|| SteleError::unknown_method(method.to_string()))
    }

    /// Returns the annotations directly present on an element.
    pub fn declared_annotations(&self, element: &Element) -> SteleResult<&[Annotation]> {
        match element {
            Element::Class(name) => Ok(self.class(name)?.annotations()),
            Element::Method(method) => Ok(self.method(method)?.annotations()),
            Element::AnnotationType(name) => {
                let ty = self
                    .annotation_types
                    .get(name)
                    .ok_or_else(|| SteleError::unknown_annotation_type(name))?;
                Ok(ty.meta_annotations())
            }
        }
    }

    /// Returns the annotations a class inherits from its superclasses.
    ///
    /// Only instances of inherited annotation types count, and a type already
    /// present closer to the class hides the same type further up.
    pub fn inherited_annotations(&self, class: &str) -> SteleResult<Vec<Annotation>> {
        let start = self.class(class)?;
        let mut seen: HashSet<&str> = start
            .annotations()
            .iter()
            .map(Annotation::annotation_type)
            .collect();
        let mut inherited = Vec::new();
        let mut visited = HashSet::from([start.name()]);
        let mut current = start.superclass();

        while let Some(name) = current {
            if !visited.insert(name) {
                break;
            }
            let superclass = self.class(name)?;
            for annotation in superclass.annotations() {
                if seen.contains(annotation.annotation_type()) {
                    continue;
                }
                if self.annotation_type(annotation.annotation_type())?.is_inherited() {
                    seen.insert(annotation.annotation_type());
                    inherited.push(annotation.clone());
                }
            }
            current = superclass.superclass();
        }
        Ok(inherited)
    }

    /// Resolves a bridge method to the method it delegates to.
    ///
    /// Non-bridge methods resolve to themselves.
    pub fn resolve_bridged_method(&self, method: &MethodRef) -> SteleResult<MethodRef> {
        let def = self.method(method)?;
        match def.bridge_target() {
            Some(parameters) => {
                let target = MethodRef::new(method.class.clone(), method.name.clone(), parameters.iter().cloned());
                self.method(&target)?;
                Ok(target)
            }
            None => Ok(method.clone()),
        }
    }

    /// Finds a method with the given signature on an interface or any of its
    /// super-interfaces, returning the declaring location.
    pub fn find_interface_method(
        &self,
        interface: &str,
        name: &str,
        parameters: &[String],
    ) -> SteleResult<Option<MethodRef>> {
        let mut visited = HashSet::new();
        self.find_interface_method_inner(interface, name, parameters, &mut visited)
    }

    fn find_interface_method_inner<'a>(
        &'a self,
        interface: &'a str,
        name: &str,
        parameters: &[String],
        visited: &mut HashSet<&'a str>,
    ) -> SteleResult<Option<MethodRef>> {
        if !visited.insert(interface) {
            return Ok(None);
        }
        let def = self.class(interface)?;
        if def.declared_method(name, parameters).is_some() {
            return Ok(Some(MethodRef::new(interface, name, parameters.iter().cloned())));
        }
        for parent in def.interfaces() {
            if let Some(found) = self.find_interface_method_inner(parent, name, parameters, visited)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Returns `true` if the interface or any super-interface declares at
    /// least one annotated method.
    pub fn has_annotated_methods(&self, interface: &str) -> SteleResult<bool> {
        let mut visited = HashSet::new();
        let mut pending = vec![interface];
        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            let def = self.class(name)?;
            if def.methods().iter().any(|m| !m.annotations().is_empty()) {
                return Ok(true);
            }
            pending.extend(def.interfaces().iter().map(String::as_str));
        }
        Ok(false)
    }
}

/// Builder for [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct TypeRegistryBuilder {
    annotation_types: IndexMap<String, Arc<AnnotationType>>,
    classes: IndexMap<String, ClassDef>,
}

impl TypeRegistryBuilder {
    /// Creates a builder holding only the built-in markers.
    #[must_use]
    pub fn new() -> Self {
        let builtins = [
            AnnotationType::new(meta::INHERITED).meta_annotation(Annotation::new(meta::DOCUMENTED)),
            AnnotationType::new(meta::DOCUMENTED).meta_annotation(Annotation::new(meta::DOCUMENTED)),
            AnnotationType::new(meta::RETENTION)
                .meta_annotation(Annotation::new(meta::DOCUMENTED))
                .attribute(AttributeMethod::new(
                    meta::VALUE,
                    AttributeType::Enum("stele.meta.RetentionPolicy".to_string()),
                )),
        ];
        Self {
            annotation_types: builtins
                .into_iter()
                .map(|ty| (ty.name().to_string(), Arc::new(ty)))
                .collect(),
            classes: IndexMap::new(),
        }
    }

    /// Registers an annotation type, replacing any previous one of the same name.
    #[must_use]
    pub fn annotation_type(mut self, annotation_type: AnnotationType) -> Self {
        self.annotation_types
            .insert(annotation_type.name().to_string(), Arc::new(annotation_type));
        self
    }

    /// Registers the annotation type described by a schema.
    #[must_use]
    pub fn schema<T: AnnotationSchema>(self) -> Self {
        self.annotation_type(T::annotation_type())
    }

    /// Registers a class or interface.
    #[must_use]
    pub fn class(mut self, class: ClassDef) -> Self {
        self.classes.insert(class.name().to_string(), class);
        self
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            annotation_types: self.annotation_types,
            classes: self.classes,
        }
    }
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
