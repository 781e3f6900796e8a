//! Engine metrics rendered through a Prometheus recorder.

use std::sync::Arc;

use stele_core::{fixtures, Annotation, ClassDef, Element, MethodDef, TypeRegistry};
use stele_engine::{AnnotationEngine, EngineSettings};
use stele_telemetry::metrics::names;
use stele_telemetry::{describe_metrics, MetricsConfig, MetricsRegistry};

fn type_registry() -> TypeRegistry {
    let builder = fixtures::annotation_types()
        .into_iter()
        .fold(TypeRegistry::builder(), |builder, ty| builder.annotation_type(ty));
    fixtures::classes()
        .into_iter()
        .chain([ClassDef::class("app.BrokenImpl")
            .implements(fixtures::SERVICE)
            .method(
                MethodDef::new("first", Vec::<String>::new())
                    .annotated(Annotation::new("app.Unregistered")),
            )])
        .fold(builder, |builder, class| builder.class(class))
        .build()
}

#[test]
fn test_cache_lookups_are_counted() {
    let recorder = MetricsConfig::default()
        .with_global_label("service", "test")
        .build_recorder();
    let registry = MetricsRegistry::new(recorder.handle());
    let engine = AnnotationEngine::new(Arc::new(type_registry()), EngineSettings::default());
    let controller = Element::class(fixtures::USER_CONTROLLER);

    metrics::with_local_recorder(&recorder, || {
        describe_metrics();
        let cold = engine.find_merged(&controller, fixtures::MAPPING).unwrap();
        let warm = engine.find_merged(&controller, fixtures::MAPPING).unwrap();
        assert_eq!(cold, warm);
    });

    let output = registry.render();
    assert!(output.contains(names::CACHE_LOOKUPS), "{output}");
    assert!(output.contains("cache=\"merged\""), "{output}");
    assert!(output.contains("outcome=\"hit\""), "{output}");
    assert!(output.contains("outcome=\"miss\""), "{output}");
    assert!(output.contains("service=\"test\""), "{output}");
}

#[test]
fn test_recovered_failures_are_counted() {
    let recorder = MetricsConfig::default().build_recorder();
    let registry = MetricsRegistry::new(recorder.handle());
    let engine = AnnotationEngine::new(Arc::new(type_registry()), EngineSettings::default());
    let first = Element::method("app.BrokenImpl", "first", Vec::<String>::new());

    metrics::with_local_recorder(&recorder, || {
        let base = engine.find_merged(&first, fixtures::BASE).unwrap().unwrap();
        assert_eq!(base.get_string("name").unwrap(), "A");
    });

    let output = registry.render();
    assert!(output.contains(names::INTROSPECTION_FAILURES), "{output}");
}
