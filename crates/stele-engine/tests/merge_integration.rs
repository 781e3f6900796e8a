//! Integration tests for merged attribute lookups.
//!
//! These tests run the engine against the fixture vocabulary in
//! `stele_core::fixtures` and a few purpose-built registries.

use std::sync::Arc;

use stele_core::{
    fixtures, AliasFor, Annotation, AnnotationType, AttributeMethod, AttributeType, AttributeValue,
    ClassDef, Element, ErrorCategory, TypeRegistry,
};
use stele_engine::{AnnotationEngine, EngineSettings, MergeOptions};

fn engine() -> AnnotationEngine {
    AnnotationEngine::new(Arc::new(fixtures::web_registry()), EngineSettings::default())
}

/// Builds an engine over the fixture vocabulary plus extra types and classes.
fn engine_with(types: Vec<AnnotationType>, classes: Vec<ClassDef>) -> AnnotationEngine {
    let builder = fixtures::annotation_types()
        .into_iter()
        .chain(types)
        .fold(TypeRegistry::builder(), |builder, ty| builder.annotation_type(ty));
    let registry = fixtures::classes()
        .into_iter()
        .chain(classes)
        .fold(builder, |builder, class| builder.class(class))
        .build();
    AnnotationEngine::new(Arc::new(registry), EngineSettings::default())
}

/// `@Composed("/api")` reaches both sides of the `value`/`path` pair of `@Mapping`.
#[test]
fn test_composed_value_reaches_alias_pair() {
    let engine = engine();
    let mapping = engine
        .get_merged(&Element::class(fixtures::CONTROLLER), fixtures::MAPPING)
        .unwrap()
        .unwrap();

    assert_eq!(mapping.get_string("value").unwrap(), "/api");
    assert_eq!(mapping.get_string("path").unwrap(), "/api");
    assert_eq!(mapping.get_string("name").unwrap(), "");
    assert!(mapping.get_annotation_array("headers").unwrap().is_empty());
    assert_eq!(mapping.annotation_type(), Some(fixtures::MAPPING));
}

/// Values declared on the meta-annotation survive unless overridden.
#[test]
fn test_meta_annotation_values_and_nested_headers() {
    let engine = engine();
    let mapping = engine
        .get_merged(&Element::class(fixtures::USER_CONTROLLER), fixtures::MAPPING)
        .unwrap()
        .unwrap();

    assert_eq!(mapping.get_string("path").unwrap(), "/users");
    assert_eq!(mapping.get_string("value").unwrap(), "/users");
    assert_eq!(
        mapping.get("method"),
        Some(&AttributeValue::Array(vec![fixtures::request_method("GET")]))
    );

    let headers = mapping.get_annotation_array("headers").unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].get_string("name").unwrap(), "Accept");
    assert_eq!(headers[0].get_string("value").unwrap(), "");
}

/// Raw options keep nested annotations as instances.
#[test]
fn test_raw_options_keep_nested_instances() {
    let engine = engine();
    let mapping = engine
        .get_merged_with(
            &Element::class(fixtures::USER_CONTROLLER),
            fixtures::MAPPING,
            MergeOptions::raw(),
        )
        .unwrap()
        .unwrap();

    let headers: Vec<Annotation> = mapping.get_required("headers").unwrap();
    assert_eq!(headers[0].annotation_type(), fixtures::HEADER);
    assert_eq!(headers[0].value("name"), Some(&AttributeValue::from("Accept")));
}

/// A single string stored for an array attribute reads as one element.
#[test]
fn test_single_value_coerces_to_array() {
    let engine = engine();
    let secured = engine
        .get_merged(&Element::class(fixtures::SECURED_CONTROLLER), fixtures::SECURED)
        .unwrap()
        .unwrap();

    assert_eq!(secured.get_string_array("roles").unwrap(), vec!["x".to_string()]);

    let err = secured.get_bool("roles").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Lookup);
    assert!(err.to_string().contains("roles"));
}

/// Locally declared annotations win over inherited ones.
#[test]
fn test_local_before_inherited() {
    let engine = engine();
    let transactional = engine
        .get_merged(&Element::class(fixtures::USER_REPOSITORY), fixtures::TRANSACTIONAL)
        .unwrap()
        .unwrap();
    assert_eq!(transactional.get_int("timeout").unwrap(), 5);
    assert!(!transactional.get_bool("read_only").unwrap());

    let plain = Element::class(fixtures::PLAIN_REPOSITORY);
    let inherited = engine.get_merged(&plain, fixtures::TRANSACTIONAL).unwrap().unwrap();
    let found = engine.find_merged(&plain, fixtures::TRANSACTIONAL).unwrap().unwrap();
    assert_eq!(inherited.get_int("timeout").unwrap(), 10);
    assert_eq!(found.get_int("timeout").unwrap(), 10);
}

/// Each method of one interface hierarchy resolves its own override of `@Base`.
#[test]
fn test_base_overrides_resolve_per_method() {
    let engine = engine();
    let first = Element::method(fixtures::SERVICE_IMPL, "first", Vec::<String>::new());
    let second = Element::method(fixtures::SERVICE_IMPL, "second", Vec::<String>::new());

    let a = engine.find_merged(&first, fixtures::BASE).unwrap().unwrap();
    let b = engine.find_merged(&second, fixtures::BASE).unwrap().unwrap();
    assert_eq!(a.get_string("name").unwrap(), "A");
    assert_eq!(b.get_string("name").unwrap(), "B");

    assert!(engine.get_merged(&first, fixtures::BASE).unwrap().is_none());
}

/// Values closer to the root element override values further away.
#[test]
fn test_override_direction() {
    let outer = AnnotationType::new("test.Outer")
        .meta_annotation(Annotation::new(fixtures::GET_MAPPING).with("name", "inner"))
        .attribute(
            AttributeMethod::new("name", AttributeType::String)
                .default_value("")
                .alias_for(AliasFor::meta(fixtures::GET_MAPPING)),
        );
    let engine = engine_with(
        vec![outer],
        vec![ClassDef::class("app.Outer").annotated(Annotation::new("test.Outer").with("name", "outer"))],
    );

    let mapping = engine
        .get_merged(&Element::class("app.Outer"), fixtures::MAPPING)
        .unwrap()
        .unwrap();
    assert_eq!(mapping.get_string("name").unwrap(), "outer");

    let get_mapping = engine
        .get_merged(&Element::class("app.Outer"), fixtures::GET_MAPPING)
        .unwrap()
        .unwrap();
    assert_eq!(get_mapping.get_string("name").unwrap(), "outer");
}

/// Transitive implicit aliases reach the attribute they ultimately override.
#[test]
fn test_transitive_implicit_aliases() {
    let engine = engine_with(
        Vec::new(),
        vec![
            ClassDef::class("app.XmlConfigured").annotated(
                Annotation::new(fixtures::TRANSITIVE_IMPLICIT_ALIASES).with("xml", "beans.xml"),
            ),
            ClassDef::class("app.GroovyConfigured").annotated(
                Annotation::new(fixtures::TRANSITIVE_IMPLICIT_ALIASES).with("groovy", "beans.groovy"),
            ),
        ],
    );

    let xml = engine
        .get_merged(&Element::class("app.XmlConfigured"), fixtures::CONFIG)
        .unwrap()
        .unwrap();
    assert_eq!(xml.get_string("locations").unwrap(), "beans.xml");

    let groovy = engine
        .get_merged(&Element::class("app.GroovyConfigured"), fixtures::CONFIG)
        .unwrap()
        .unwrap();
    assert_eq!(groovy.get_string("locations").unwrap(), "beans.groovy");
}

/// Conflicting alias values fail the whole merge.
#[test]
fn test_conflicting_aliases_are_reported() {
    let engine = engine_with(
        Vec::new(),
        vec![ClassDef::class("app.Conflicted")
            .annotated(Annotation::new(fixtures::MAPPING).with("value", "/a").with("path", "/b"))],
    );

    let err = engine
        .get_merged(&Element::class("app.Conflicted"), fixtures::MAPPING)
        .unwrap_err();
    assert!(err.is_configuration());

    let message = err.to_string();
    assert!(message.contains(fixtures::MAPPING), "{message}");
    assert!(message.contains("app.Conflicted"), "{message}");
    assert!(message.contains("'value'") && message.contains("'path'"), "{message}");
    assert!(message.contains("/a") && message.contains("/b"), "{message}");
}

/// A conflict inside an implicit alias group names the attributes that were declared.
#[test]
fn test_implicit_alias_conflict_names_declared_attributes() {
    let engine = engine_with(
        Vec::new(),
        vec![ClassDef::class("app.T")
            .annotated(Annotation::new(fixtures::IMPLICIT_ALIASES).with("groovy_script", "a").with("value", "b"))],
    );

    let err = engine
        .get_merged(&Element::class("app.T"), fixtures::IMPLICIT_ALIASES)
        .unwrap_err();
    assert!(err.is_configuration());

    let message = err.to_string();
    assert!(message.contains("groovy_script"), "{message}");
    assert!(message.contains("'value'"), "{message}");
    assert!(!message.contains("xml_file"), "{message}");
}

/// A locally declared composed annotation keeps its own alias pair in sync.
#[test]
fn test_find_merged_composed_on_controller() {
    let engine = engine();
    let composed = engine
        .find_merged(&Element::class(fixtures::CONTROLLER), fixtures::COMPOSED)
        .unwrap()
        .unwrap();

    assert_eq!(composed.get_string("value").unwrap(), "/api");
    assert_eq!(composed.get_string("path").unwrap(), "/api");
    assert_eq!(composed.annotation_type(), Some(fixtures::COMPOSED));
}

/// A synthesized view over a merged store yields the same store back.
#[test]
fn test_merged_round_trip() {
    let engine = engine();
    for class in [fixtures::CONTROLLER, fixtures::USER_CONTROLLER] {
        let element = Element::class(class);
        let merged = engine
            .get_merged_with(&element, fixtures::MAPPING, MergeOptions::raw())
            .unwrap()
            .unwrap();
        let view = engine
            .synthesize(merged.clone(), fixtures::MAPPING, Some(element.clone()))
            .unwrap();
        assert_eq!(view.to_attributes().unwrap(), merged, "{class}");

        let annotation = engine
            .get_merged_annotation(&element, fixtures::MAPPING)
            .unwrap()
            .unwrap();
        assert_eq!(annotation, view, "{class}");
    }
}

/// Attributes are collected per annotation without cross-level merging.
#[test]
fn test_get_all_attributes() {
    let engine = engine();
    let all = engine
        .get_all_attributes(&Element::class(fixtures::USER_REPOSITORY), fixtures::TRANSACTIONAL)
        .unwrap()
        .unwrap();

    assert_eq!(
        all.get("timeout"),
        Some(&[AttributeValue::Int(5), AttributeValue::Int(10)][..])
    );
    assert_eq!(all.get_first("read_only"), Some(&AttributeValue::Bool(false)));
}

/// Single annotations resolve their aliases without a search.
#[test]
fn test_annotation_attributes() {
    let engine = engine();
    let attributes = engine
        .annotation_attributes(
            &Element::class("app.Anywhere"),
            &Annotation::new(fixtures::MAPPING).with("path", "/p"),
        )
        .unwrap();
    assert_eq!(attributes.get_string("value").unwrap(), "/p");
}
