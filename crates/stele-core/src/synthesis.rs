//! Synthesized annotation views.
//!
//! A [`SynthesizedAnnotation`] presents alias-aware attribute values for an
//! annotation type, backed either by a live [`Annotation`] or by an
//! [`AnnotationAttributes`] store. Reading an attribute consults its aliases:
//! a value left at its default yields to an explicitly set alias, and two
//! explicitly set aliases must agree.
//!
//! Values are resolved on first access and cached per view. A required
//! attribute with neither a value nor a default only fails when it is read.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stele_core::{fixtures, AliasGraph, Annotation, AttributeValue, SynthesizedAnnotation};
//!
//! let graph = Arc::new(AliasGraph::new(Arc::new(fixtures::web_registry())));
//! let mapping = Annotation::new(fixtures::MAPPING).with("path", "/users");
//! let view = SynthesizedAnnotation::from_annotation(mapping, None, &graph).unwrap();
//!
//! assert_eq!(view.attribute("value").unwrap(), AttributeValue::from("/users"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::alias::{AliasGraph, AliasMap};
use crate::annotation::Annotation;
use crate::attributes::AnnotationAttributes;
use crate::element::Element;
use crate::error::{SteleError, SteleResult};
use crate::registry::{AnnotationType, AttributeMethod};
use crate::value::{AttributeType, AttributeValue, ClassRef, FromAttributeValue};

const UNKNOWN_ELEMENT: &str = "unknown element";

/// Where a synthesized view reads raw values from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSource {
    /// A live instance; unset attributes read as their defaults.
    Annotation(Annotation),
    /// An attribute store; absent keys read as unset.
    Attributes(AnnotationAttributes),
}

/// An alias-aware view over an annotation.
pub struct SynthesizedAnnotation {
    annotation_type: Arc<AnnotationType>,
    element: Option<Element>,
    source: AttributeSource,
    alias_map: Arc<AliasMap>,
    synthesized: bool,
    graph: Arc<AliasGraph>,
    resolved: RwLock<IndexMap<String, AttributeValue>>,
}

impl SynthesizedAnnotation {
    /// Creates a view over a live annotation instance.
    ///
    /// Types that need no alias handling get a plain view that performs no
    /// alias lookups.
    pub fn from_annotation(
        annotation: Annotation,
        element: Option<Element>,
        graph: &Arc<AliasGraph>,
    ) -> SteleResult<Self> {
        let annotation_type = graph.registry().annotation_type(annotation.annotation_type())?;
        if graph.is_synthesizable(annotation_type.name())? {
            let alias_map = graph.alias_map(annotation_type.name())?;
            Ok(Self::build(
                annotation_type,
                element,
                AttributeSource::Annotation(annotation),
                alias_map,
                true,
                graph,
            ))
        } else {
            Ok(Self::build(
                annotation_type,
                element,
                AttributeSource::Annotation(annotation),
                Arc::default(),
                false,
                graph,
            ))
        }
    }

    /// Creates a view of the named annotation type over an attribute store.
    pub fn from_attributes(
        attributes: AnnotationAttributes,
        annotation_type: &str,
        element: Option<Element>,
        graph: &Arc<AliasGraph>,
    ) -> SteleResult<Self> {
        let ty = graph.registry().annotation_type(annotation_type)?;
        let alias_map = graph.alias_map(annotation_type)?;
        Ok(Self::build(
            ty,
            element,
            AttributeSource::Attributes(attributes),
            alias_map,
            true,
            graph,
        ))
    }

    fn build(
        annotation_type: Arc<AnnotationType>,
        element: Option<Element>,
        source: AttributeSource,
        alias_map: Arc<AliasMap>,
        synthesized: bool,
        graph: &Arc<AliasGraph>,
    ) -> Self {
        Self {
            annotation_type,
            element,
            source,
            alias_map,
            synthesized,
            graph: Arc::clone(graph),
            resolved: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the annotation type name.
    #[must_use]
    pub fn annotation_type(&self) -> &str {
        self.annotation_type.name()
    }

    /// Returns the annotation type schema.
    #[must_use]
    pub fn schema(&self) -> &AnnotationType {
        &self.annotation_type
    }

    /// Returns the element the view was created for.
    #[must_use]
    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    /// Returns the backing source.
    #[must_use]
    pub fn source(&self) -> &AttributeSource {
        &self.source
    }

    /// Returns `true` if the view resolves aliases.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Resolves an attribute value.
    pub fn attribute(&self, name: &str) -> SteleResult<AttributeValue> {
        if let Some(hit) = self.resolved.read().get(name) {
            return Ok(hit.clone());
        }

        let method = self
            .annotation_type
            .find_attribute(name)
            .ok_or_else(|| SteleError::attribute_not_found(name, self.annotation_type.name()))?;
        let default = method.default();
        let mut value = self.raw_value(name);
        // Attribute whose declared value `value` currently holds.
        let mut declared_by: &str = name;

        if let Some(aliases) = self.alias_map.get(name) {
            for alias in aliases {
                let alias_value = self.raw_value(alias);
                let own_set = is_set(value.as_ref(), default);
                let alias_set = is_set(alias_value.as_ref(), default);
                if own_set && alias_set && value != alias_value {
                    return Err(SteleError::AttributeConflict {
                        annotation: self.annotation_type.name().to_string(),
                        element: self.element_name(),
                        attribute: declared_by.to_string(),
                        alias: alias.clone(),
                        value: render(value.as_ref()),
                        alias_value: render(alias_value.as_ref()),
                    });
                }
                if !own_set && alias_value.is_some() {
                    value = alias_value;
                    declared_by = alias.as_str();
                }
            }
        }

        let value = match value.or_else(|| default.cloned()) {
            Some(value) => value,
            None => {
                return Err(SteleError::MissingSynthesizedAttribute {
                    annotation: self.annotation_type.name().to_string(),
                    attribute: name.to_string(),
                    element: self.element_name(),
                })
            }
        };
        let value = self.adapt(method, value)?;

        self.resolved.write().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Resolves an attribute and converts it to `T`.
    pub fn get<T: FromAttributeValue>(&self, name: &str) -> SteleResult<T> {
        let value = self.attribute(name)?;
        T::from_attribute_value(&value).ok_or_else(|| {
            SteleError::type_mismatch(name, self.annotation_type.name(), T::expected_type(), value.type_name())
        })
    }

    /// Returns a view over a nested annotation attribute.
    pub fn nested(&self, name: &str) -> SteleResult<SynthesizedAnnotation> {
        match self.attribute(name)? {
            AttributeValue::Annotation(annotation) => {
                Self::from_annotation(annotation, self.element.clone(), &self.graph)
            }
            other => Err(SteleError::type_mismatch(
                name,
                self.annotation_type.name(),
                "Annotation",
                other.type_name(),
            )),
        }
    }

    /// Returns views over a nested annotation array attribute.
    pub fn nested_array(&self, name: &str) -> SteleResult<Vec<SynthesizedAnnotation>> {
        let items: Vec<Annotation> = self.get(name)?;
        items
            .into_iter()
            .map(|annotation| Self::from_annotation(annotation, self.element.clone(), &self.graph))
            .collect()
    }

    /// Resolves every attribute in declaration order.
    pub fn values(&self) -> SteleResult<IndexMap<String, AttributeValue>> {
        self.annotation_type
            .attributes()
            .iter()
            .map(|method| {
                self.attribute(method.name())
                    .map(|value| (method.name().to_string(), value))
            })
            .collect()
    }

    /// Materializes the view as an annotation with every attribute explicit.
    pub fn to_annotation(&self) -> SteleResult<Annotation> {
        Ok(self
            .values()?
            .into_iter()
            .fold(Annotation::new(self.annotation_type.name()), |a, (name, value)| {
                a.with(name, value)
            }))
    }

    /// Materializes the view as an attribute store.
    pub fn to_attributes(&self) -> SteleResult<AnnotationAttributes> {
        let mut attributes = AnnotationAttributes::for_type(self.annotation_type.name());
        attributes.extend(self.values()?);
        Ok(attributes)
    }

    fn raw_value(&self, name: &str) -> Option<AttributeValue> {
        match &self.source {
            AttributeSource::Annotation(annotation) => annotation
                .value(name)
                .or_else(|| self.annotation_type.default_value(name))
                .cloned(),
            AttributeSource::Attributes(attributes) => attributes.get(name).cloned(),
        }
    }

    fn element_name(&self) -> String {
        self.element
            .as_ref()
            .map_or_else(|| UNKNOWN_ELEMENT.to_string(), ToString::to_string)
    }

    /// Coerces a raw value to the declared type and synthesizes nested annotations.
    fn adapt(&self, method: &AttributeMethod, value: AttributeValue) -> SteleResult<AttributeValue> {
        let declared = method.attribute_type();
        let value = match (declared, value) {
            (AttributeType::Array(_), value @ AttributeValue::Array(_)) => value,
            (AttributeType::Array(_), single) => AttributeValue::Array(vec![single]),
            (_, value) => value,
        };
        self.adapt_to(method.name(), declared, value)
    }

    fn adapt_to(&self, name: &str, declared: &AttributeType, value: AttributeValue) -> SteleResult<AttributeValue> {
        match (declared, value) {
            (AttributeType::Array(element), AttributeValue::Array(items)) => Ok(AttributeValue::Array(
                items
                    .into_iter()
                    .map(|item| self.adapt_to(name, element, item))
                    .collect::<SteleResult<_>>()?,
            )),
            (AttributeType::Class, AttributeValue::String(class)) => {
                Ok(AttributeValue::Class(ClassRef::new(class)))
            }
            (AttributeType::Annotation(nested_type), AttributeValue::Annotation(annotation))
                if annotation.annotation_type() == nested_type =>
            {
                let view = Self::from_annotation(annotation, self.element.clone(), &self.graph)?;
                Ok(AttributeValue::Annotation(view.to_annotation()?))
            }
            (AttributeType::Annotation(nested_type), AttributeValue::Attributes(attributes))
                if attributes.annotation_type().map_or(true, |t| t == nested_type) =>
            {
                let view =
                    Self::from_attributes(attributes, nested_type, self.element.clone(), &self.graph)?;
                Ok(AttributeValue::Annotation(view.to_annotation()?))
            }
            (declared, value) if value.conforms_to(declared) => Ok(value),
            (declared, value) => Err(SteleError::type_mismatch(
                name,
                self.annotation_type.name(),
                declared.to_string(),
                value.type_name(),
            )),
        }
    }
}

fn is_set(value: Option<&AttributeValue>, default: Option<&AttributeValue>) -> bool {
    value.is_some() && value != default
}

fn render(value: Option<&AttributeValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

impl Clone for SynthesizedAnnotation {
    fn clone(&self) -> Self {
        Self {
            annotation_type: Arc::clone(&self.annotation_type),
            element: self.element.clone(),
            source: self.source.clone(),
            alias_map: Arc::clone(&self.alias_map),
            synthesized: self.synthesized,
            graph: Arc::clone(&self.graph),
            resolved: RwLock::new(self.resolved.read().clone()),
        }
    }
}

impl fmt::Debug for SynthesizedAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedAnnotation")
            .field("annotation_type", &self.annotation_type.name())
            .field("element", &self.element)
            .field("source", &self.source)
            .field("synthesized", &self.synthesized)
            .finish_non_exhaustive()
    }
}

impl PartialEq for SynthesizedAnnotation {
    fn eq(&self, other: &Self) -> bool {
        if self.annotation_type.name() != other.annotation_type.name() {
            return false;
        }
        match (self.values(), other.values()) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => self.source == other.source,
            _ => false,
        }
    }
}

impl Eq for SynthesizedAnnotation {}

impl Hash for SynthesizedAnnotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation_type.name().hash(state);
        if let Ok(values) = self.values() {
            for (name, value) in &values {
                name.hash(state);
                value.hash(state);
            }
        }
    }
}

impl fmt::Display for SynthesizedAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.annotation_type.name())?;
        for (i, method) in self.annotation_type.attributes().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.attribute(method.name()) {
                Ok(value) => write!(f, "{}={value}", method.name())?,
                Err(_) => write!(f, "{}=<unresolved>", method.name())?,
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::registry::{AliasFor, TypeRegistry};
    use std::collections::HashSet;

    fn graph() -> Arc<AliasGraph> {
        Arc::new(AliasGraph::new(Arc::new(fixtures::web_registry())))
    }

    #[test]
    fn test_alias_pair_reads_both_ways() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_annotation(
            Annotation::new(fixtures::COMPOSED).with("value", "/api"),
            Some(Element::class(fixtures::CONTROLLER)),
            &graph,
        )
        .unwrap();
        assert!(view.is_synthesized());
        assert_eq!(view.get::<String>("value").unwrap(), "/api");
        assert_eq!(view.get::<String>("path").unwrap(), "/api");
    }

    #[test]
    fn test_conflicting_aliases() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_annotation(
            Annotation::new(fixtures::MAPPING).with("value", "/a").with("path", "/b"),
            Some(Element::class("app.Broken")),
            &graph,
        )
        .unwrap();
        let err = view.attribute("path").unwrap_err();
        assert_eq!(
            err,
            SteleError::AttributeConflict {
                annotation: fixtures::MAPPING.to_string(),
                element: "class app.Broken".to_string(),
                attribute: "path".to_string(),
                alias: "value".to_string(),
                value: "/b".to_string(),
                alias_value: "/a".to_string(),
            }
        );
    }

    #[test]
    fn test_equal_explicit_aliases_are_fine() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_annotation(
            Annotation::new(fixtures::MAPPING).with("value", "/a").with("path", "/a"),
            None,
            &graph,
        )
        .unwrap();
        assert_eq!(view.get::<String>("path").unwrap(), "/a");
    }

    #[test]
    fn test_implicit_aliases_resolve() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("groovy_script", "app.groovy"),
            fixtures::IMPLICIT_ALIASES,
            None,
            &graph,
        )
        .unwrap();
        assert_eq!(view.get::<String>("xml_file").unwrap(), "app.groovy");
        assert_eq!(view.get::<String>("value").unwrap(), "app.groovy");
    }

    #[test]
    fn test_implicit_conflict_names_declared_attributes() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("groovy_script", "a").with("value", "b"),
            fixtures::IMPLICIT_ALIASES,
            None,
            &graph,
        )
        .unwrap();
        match view.attribute("xml_file").unwrap_err() {
            SteleError::AttributeConflict {
                attribute,
                alias,
                value,
                alias_value,
                ..
            } => {
                assert_eq!(attribute, "groovy_script");
                assert_eq!(alias, "value");
                assert_eq!(value, "a");
                assert_eq!(alias_value, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unresolved_view_equals_itself() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("value", "text/plain"),
            fixtures::HEADER,
            None,
            &graph,
        )
        .unwrap();
        assert!(view.values().is_err());
        assert_eq!(view, view.clone());

        let mut set = HashSet::new();
        set.insert(view.clone());
        assert!(set.contains(&view));
    }

    #[test]
    fn test_missing_required_attribute_is_lazy() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("value", "text/plain"),
            fixtures::HEADER,
            Some(Element::class("app.Api")),
            &graph,
        )
        .unwrap();
        assert_eq!(view.get::<String>("value").unwrap(), "text/plain");
        let err = view.attribute("name").unwrap_err();
        assert!(matches!(err, SteleError::MissingSynthesizedAttribute { .. }));
        assert!(err.to_string().contains("class app.Api"));
    }

    #[test]
    fn test_single_value_coerced_to_array() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("roles", "x"),
            fixtures::SECURED,
            None,
            &graph,
        )
        .unwrap();
        assert_eq!(view.get::<Vec<String>>("roles").unwrap(), vec!["x".to_string()]);
        assert_eq!(view.attribute("roles").unwrap(), AttributeValue::from(vec!["x"]));
    }

    #[test]
    fn test_store_type_mismatch() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("timeout", "soon"),
            fixtures::TRANSACTIONAL,
            None,
            &graph,
        )
        .unwrap();
        assert!(matches!(
            view.attribute("timeout").unwrap_err(),
            SteleError::AttributeTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_nested_stores_are_synthesized() {
        let graph = graph();
        let header = AnnotationAttributes::for_type(fixtures::HEADER).with("name", "Accept");
        let view = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new().with("path", "/x").with("headers", vec![header]),
            fixtures::MAPPING,
            None,
            &graph,
        )
        .unwrap();
        let headers = view.nested_array("headers").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].get::<String>("name").unwrap(), "Accept");
        assert_eq!(headers[0].get::<String>("value").unwrap(), "");
    }

    #[test]
    fn test_plain_view_for_non_synthesizable_type() {
        let graph = graph();
        let view = SynthesizedAnnotation::from_annotation(
            Annotation::new(fixtures::TRANSACTIONAL).with("timeout", 3),
            None,
            &graph,
        )
        .unwrap();
        assert!(!view.is_synthesized());
        assert_eq!(view.get::<i64>("timeout").unwrap(), 3);
        assert!(!view.get::<bool>("read_only").unwrap());
    }

    #[test]
    fn test_value_based_equality_and_display() {
        let graph = graph();
        let from_instance = SynthesizedAnnotation::from_annotation(
            Annotation::new(fixtures::MAPPING).with("path", "/a"),
            None,
            &graph,
        )
        .unwrap();
        let from_store = SynthesizedAnnotation::from_attributes(
            AnnotationAttributes::new()
                .with("name", "")
                .with("value", "/a")
                .with("path", "/a")
                .with("method", AttributeValue::empty_array())
                .with("headers", AttributeValue::empty_array()),
            fixtures::MAPPING,
            Some(Element::class("app.Other")),
            &graph,
        )
        .unwrap();
        assert_eq!(from_instance, from_store);

        let mut set = HashSet::new();
        set.insert(from_instance.clone());
        assert!(set.contains(&from_store));

        assert_eq!(
            from_instance.to_string(),
            "@web.Mapping(name=, value=/a, path=/a, method=[], headers=[])"
        );
    }

    #[test]
    fn test_unknown_attribute() {
        let graph = graph();
        let view =
            SynthesizedAnnotation::from_annotation(Annotation::new(fixtures::BASE), None, &graph).unwrap();
        assert!(matches!(
            view.attribute("missing").unwrap_err(),
            SteleError::AttributeNotFound { .. }
        ));
    }

    #[test]
    fn test_unknown_type_is_introspection_error() {
        let graph = Arc::new(AliasGraph::new(Arc::new(TypeRegistry::builder().build())));
        let err =
            SynthesizedAnnotation::from_annotation(Annotation::new("app.Gone"), None, &graph).unwrap_err();
        assert!(err.is_introspection());
    }

    #[test]
    fn test_invalid_alias_surfaces_on_creation() {
        use crate::registry::{AnnotationType, AttributeMethod};
        let registry = TypeRegistry::builder()
            .annotation_type(
                AnnotationType::new("A").attribute(
                    AttributeMethod::new("value", AttributeType::String)
                        .default_value("")
                        .alias_for(AliasFor::attribute("value")),
                ),
            )
            .build();
        let graph = Arc::new(AliasGraph::new(Arc::new(registry)));
        let err = SynthesizedAnnotation::from_annotation(Annotation::new("A"), None, &graph).unwrap_err();
        assert!(err.is_configuration());
    }
}
