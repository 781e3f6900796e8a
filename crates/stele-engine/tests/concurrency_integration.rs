//! Concurrent use of one engine from many threads.

use std::sync::Arc;
use std::thread;

use stele_core::{fixtures, Element};
use stele_engine::{AnnotationEngine, EngineSettings};

const THREADS: usize = 8;
const ROUNDS: usize = 50;

fn queries() -> Vec<(Element, &'static str)> {
    vec![
        (Element::class(fixtures::CONTROLLER), fixtures::MAPPING),
        (Element::class(fixtures::USER_CONTROLLER), fixtures::MAPPING),
        (Element::class(fixtures::USER_REPOSITORY), fixtures::TRANSACTIONAL),
        (Element::class(fixtures::PLAIN_REPOSITORY), fixtures::TRANSACTIONAL),
        (Element::method(fixtures::SERVICE_IMPL, "first", Vec::<String>::new()), fixtures::BASE),
        (Element::method(fixtures::SERVICE_IMPL, "second", Vec::<String>::new()), fixtures::BASE),
    ]
}

#[test]
fn test_concurrent_merges_agree_with_sequential() {
    let registry = Arc::new(fixtures::web_registry());
    let reference = AnnotationEngine::new(Arc::clone(&registry), EngineSettings::default());
    let expected: Vec<_> = queries()
        .iter()
        .map(|(element, name)| reference.find_merged(element, name).unwrap())
        .collect();

    let engine = AnnotationEngine::new(registry, EngineSettings::default());
    let queries = queries();

    thread::scope(|scope| {
        for offset in 0..THREADS {
            let engine = &engine;
            let queries = &queries;
            let expected = &expected;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let index = (offset + round) % queries.len();
                    let (element, name) = &queries[index];
                    let merged = engine.find_merged(element, name).unwrap();
                    assert_eq!(&merged, &expected[index], "{element} {name}");

                    let view = engine.find_annotation(element, name).unwrap();
                    assert_eq!(view.is_some(), merged.is_some());
                }
            });
        }
    });

    let stats = engine.cache_stats();
    assert_eq!(stats.merged_entries, queries.len());
    assert!(stats.hits > 0);
}
