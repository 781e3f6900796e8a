//! Test fixtures for Stele development and testing.
//!
//! This module provides a pre-built [`TypeRegistry`] with a small web-style
//! annotation vocabulary that exercises every alias shape: explicit pairs,
//! meta-annotation overrides, implicit and transitive implicit aliases,
//! inherited annotations and nested annotations.
//!
//! # Example
//!
//! ```
//! use stele_core::fixtures;
//!
//! let registry = fixtures::web_registry();
//! assert!(registry.annotation_type(fixtures::MAPPING).is_ok());
//! assert!(registry.class(fixtures::CONTROLLER).is_ok());
//! ```

use crate::annotation::Annotation;
use crate::registry::{AliasFor, AnnotationType, AttributeMethod, ClassDef, MethodDef, TypeRegistry};
use crate::value::{AttributeType, AttributeValue, EnumValue};

/// Request mapping with a `value`/`path` alias pair.
pub const MAPPING: &str = "web.Mapping";
/// Composed mapping preset to `GET`, overriding `MAPPING` attributes.
pub const GET_MAPPING: &str = "web.GetMapping";
/// Composed annotation with its own `value`/`path` pair, meta-annotated with `MAPPING`.
pub const COMPOSED: &str = "web.Composed";
/// Nested header declaration.
pub const HEADER: &str = "web.Header";
/// Role-based access annotation without aliases.
pub const SECURED: &str = "web.Secured";
/// Inherited transaction settings.
pub const TRANSACTIONAL: &str = "web.Transactional";
/// Composed annotation meta-annotated with `TRANSACTIONAL`.
pub const TX_SERVICE: &str = "web.TxService";
/// Request method enumeration.
pub const REQUEST_METHOD: &str = "web.RequestMethod";

/// Configuration annotation targeted by implicit aliases.
pub const CONFIG: &str = "test.Config";
/// Three attributes overriding `CONFIG.locations`.
pub const IMPLICIT_ALIASES: &str = "test.ImplicitAliases";
/// Two attributes reaching `CONFIG.locations` through `IMPLICIT_ALIASES`.
pub const TRANSITIVE_IMPLICIT_ALIASES: &str = "test.TransitiveImplicitAliases";
/// Base annotation with a `name` attribute.
pub const BASE: &str = "test.Base";
/// Overrides `BASE.name`.
pub const BASE_A: &str = "test.A";
/// Overrides `BASE.name`.
pub const BASE_B: &str = "test.B";

/// Class annotated with `@Composed("/api")`.
pub const CONTROLLER: &str = "app.Controller";
/// Class annotated with `@Secured(roles = "x")`.
pub const SECURED_CONTROLLER: &str = "app.SecuredController";
/// Interface whose methods carry `@A` and `@B`.
pub const SERVICE: &str = "app.Service";
/// Implementation of `SERVICE` without annotations of its own.
pub const SERVICE_IMPL: &str = "app.ServiceImpl";
/// Superclass carrying an inherited `@Transactional(timeout = 10)`.
pub const BASE_REPOSITORY: &str = "app.BaseRepository";
/// Subclass of `BASE_REPOSITORY` declaring `@TxService`.
pub const USER_REPOSITORY: &str = "app.UserRepository";
/// Subclass of `BASE_REPOSITORY` without local annotations.
pub const PLAIN_REPOSITORY: &str = "app.PlainRepository";
/// Class annotated with `@GetMapping(path = "/users", headers = ...)`.
pub const USER_CONTROLLER: &str = "app.UserController";

fn string(name: &str) -> AttributeMethod {
    AttributeMethod::new(name, AttributeType::String).default_value("")
}

/// Returns an enum constant of [`REQUEST_METHOD`].
#[must_use]
pub fn request_method(constant: &str) -> AttributeValue {
    AttributeValue::Enum(EnumValue::new(REQUEST_METHOD, constant))
}

/// Returns the annotation types of the fixture vocabulary.
#[must_use]
pub fn annotation_types() -> Vec<AnnotationType> {
    vec![
        AnnotationType::new(HEADER)
            .attribute(AttributeMethod::new("name", AttributeType::String))
            .attribute(string("value")),
        AnnotationType::new(MAPPING)
            .attribute(string("name"))
            .attribute(string("value").alias_for(AliasFor::attribute("path")))
            .attribute(string("path").alias_for(AliasFor::attribute("value")))
            .attribute(
                AttributeMethod::new(
                    "method",
                    AttributeType::array(AttributeType::Enum(REQUEST_METHOD.to_string())),
                )
                .default_value(AttributeValue::empty_array()),
            )
            .attribute(
                AttributeMethod::new(
                    "headers",
                    AttributeType::array(AttributeType::Annotation(HEADER.to_string())),
                )
                .default_value(AttributeValue::empty_array()),
            ),
        AnnotationType::new(GET_MAPPING)
            .meta_annotation(
                Annotation::new(MAPPING).with("method", AttributeValue::Array(vec![request_method("GET")])),
            )
            .attribute(string("value").alias_for(AliasFor::meta(MAPPING)))
            .attribute(string("path").alias_for(AliasFor::meta(MAPPING)))
            .attribute(string("name").alias_for(AliasFor::meta(MAPPING)))
            .attribute(
                AttributeMethod::new(
                    "headers",
                    AttributeType::array(AttributeType::Annotation(HEADER.to_string())),
                )
                .default_value(AttributeValue::empty_array())
                .alias_for(AliasFor::meta(MAPPING)),
            ),
        AnnotationType::new(COMPOSED)
            .meta_annotation(Annotation::new(MAPPING))
            .attribute(string("value").alias_for(AliasFor::attribute("path")))
            .attribute(string("path").alias_for(AliasFor::attribute("value")))
            .attribute(string("name").alias_for(AliasFor::meta(MAPPING))),
        AnnotationType::new(SECURED).attribute(
            AttributeMethod::new("roles", AttributeType::array(AttributeType::String))
                .default_value(AttributeValue::empty_array()),
        ),
        AnnotationType::new(TRANSACTIONAL)
            .inherited()
            .attribute(AttributeMethod::new("timeout", AttributeType::Int).default_value(-1))
            .attribute(AttributeMethod::new("read_only", AttributeType::Bool).default_value(false)),
        AnnotationType::new(TX_SERVICE)
            .meta_annotation(Annotation::new(TRANSACTIONAL).with("timeout", 5))
            .attribute(
                AttributeMethod::new("read_only", AttributeType::Bool)
                    .default_value(false)
                    .alias_for(AliasFor::meta(TRANSACTIONAL)),
            ),
        AnnotationType::new(CONFIG).attribute(string("locations")),
        AnnotationType::new(IMPLICIT_ALIASES)
            .meta_annotation(Annotation::new(CONFIG))
            .attribute(string("xml_file").alias_for(AliasFor::meta_attribute(CONFIG, "locations")))
            .attribute(string("groovy_script").alias_for(AliasFor::meta_attribute(CONFIG, "locations")))
            .attribute(string("value").alias_for(AliasFor::meta_attribute(CONFIG, "locations"))),
        AnnotationType::new(TRANSITIVE_IMPLICIT_ALIASES)
            .meta_annotation(Annotation::new(IMPLICIT_ALIASES))
            .attribute(string("xml").alias_for(AliasFor::meta_attribute(IMPLICIT_ALIASES, "xml_file")))
            .attribute(
                string("groovy").alias_for(AliasFor::meta_attribute(IMPLICIT_ALIASES, "groovy_script")),
            ),
        AnnotationType::new(BASE).attribute(string("name")),
        AnnotationType::new(BASE_A)
            .meta_annotation(Annotation::new(BASE))
            .attribute(string("name").alias_for(AliasFor::meta(BASE))),
        AnnotationType::new(BASE_B)
            .meta_annotation(Annotation::new(BASE))
            .attribute(string("name").alias_for(AliasFor::meta(BASE))),
    ]
}

/// Returns the classes of the fixture hierarchy.
#[must_use]
pub fn classes() -> Vec<ClassDef> {
    vec![
        ClassDef::class(CONTROLLER).annotated(Annotation::new(COMPOSED).with("value", "/api")),
        ClassDef::class(SECURED_CONTROLLER).annotated(Annotation::new(SECURED).with("roles", "x")),
        ClassDef::interface(SERVICE)
            .method(MethodDef::new("first", Vec::<String>::new()).annotated(Annotation::new(BASE_A).with("name", "A")))
            .method(MethodDef::new("second", Vec::<String>::new()).annotated(Annotation::new(BASE_B).with("name", "B"))),
        ClassDef::class(SERVICE_IMPL)
            .implements(SERVICE)
            .method(MethodDef::new("first", Vec::<String>::new()))
            .method(MethodDef::new("second", Vec::<String>::new())),
        ClassDef::class(BASE_REPOSITORY).annotated(Annotation::new(TRANSACTIONAL).with("timeout", 10)),
        ClassDef::class(USER_REPOSITORY)
            .extends(BASE_REPOSITORY)
            .annotated(Annotation::new(TX_SERVICE)),
        ClassDef::class(PLAIN_REPOSITORY).extends(BASE_REPOSITORY),
        ClassDef::class(USER_CONTROLLER).annotated(
            Annotation::new(GET_MAPPING)
                .with("path", "/users")
                .with("headers", vec![Annotation::new(HEADER).with("name", "Accept")]),
        ),
    ]
}

/// Creates a registry holding the fixture vocabulary and class hierarchy.
///
/// # Example
///
/// ```
/// use stele_core::fixtures::{self, web_registry};
///
/// let registry = web_registry();
/// let composed = registry.annotation_type(fixtures::COMPOSED).unwrap();
/// assert_eq!(composed.attributes().len(), 3);
/// ```
#[must_use]
pub fn web_registry() -> TypeRegistry {
    let builder = annotation_types()
        .into_iter()
        .fold(TypeRegistry::builder(), |builder, ty| builder.annotation_type(ty));
    classes()
        .into_iter()
        .fold(builder, |builder, class| builder.class(class))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;

    #[test]
    fn test_registry_contains_vocabulary() {
        let registry = web_registry();
        for ty in annotation_types() {
            assert!(registry.contains_annotation_type(ty.name()), "{}", ty.name());
        }
    }

    #[test]
    fn test_transactional_is_inherited() {
        let registry = web_registry();
        assert!(registry.annotation_type(TRANSACTIONAL).unwrap().is_inherited());
        let inherited = registry.inherited_annotations(PLAIN_REPOSITORY).unwrap();
        assert_eq!(inherited.len(), 1);
    }

    #[test]
    fn test_service_methods_annotated() {
        let registry = web_registry();
        let first = registry
            .declared_annotations(&Element::method(SERVICE, "first", Vec::<String>::new()))
            .unwrap();
        assert_eq!(first[0].annotation_type(), BASE_A);
    }
}
