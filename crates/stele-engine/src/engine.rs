//! The annotation engine.

use std::sync::Arc;

use stele_core::{
    AliasGraph, Annotation, AnnotationAttributes, AnnotationSchema, Element, MultiValueAttributes,
    SteleResult, SynthesizedAnnotation, TypeRegistry,
};
use tracing::{debug, info};

use crate::cache::{CacheStats, EngineCaches, MergeKey};
use crate::merge::{self, MergeOptions, MergeProcessor};
use crate::processors::{CollectAll, FirstMatch, HasMetaTypes, MetaTypes, Presence};
use crate::search::{AnnotationSearch, SearchKind};
use crate::settings::EngineSettings;

/// Merges, searches and synthesizes annotations of one registry.
///
/// The engine is `Send + Sync`; every operation takes `&self` and may be
/// called from any number of threads. Results are memoized for the lifetime
/// of the engine unless caching is disabled in [`EngineSettings`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stele_core::{fixtures, Element};
/// use stele_engine::{AnnotationEngine, EngineSettings};
///
/// let engine = AnnotationEngine::new(Arc::new(fixtures::web_registry()), EngineSettings::default());
/// let mapping = engine
///     .get_merged(&Element::class(fixtures::CONTROLLER), fixtures::MAPPING)
///     .unwrap()
///     .unwrap();
/// assert_eq!(mapping.get_string("path").unwrap(), "/api");
/// assert_eq!(mapping.get_string("value").unwrap(), "/api");
/// ```
#[derive(Debug)]
pub struct AnnotationEngine {
    registry: Arc<TypeRegistry>,
    graph: Arc<AliasGraph>,
    settings: EngineSettings,
    caches: EngineCaches,
}

impl AnnotationEngine {
    /// Creates an engine over a registry.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>, settings: EngineSettings) -> Self {
        let graph = Arc::new(AliasGraph::new(Arc::clone(&registry)));
        Self {
            registry,
            graph,
            settings,
            caches: EngineCaches::new(),
        }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Returns the alias graph.
    #[must_use]
    pub fn graph(&self) -> &Arc<AliasGraph> {
        &self.graph
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }

    /// Drops every memoized result.
    pub fn clear_caches(&self) {
        self.caches.clear();
    }

    fn search(&self) -> AnnotationSearch<'_> {
        AnnotationSearch::new(&self.registry, &self.settings, &self.caches.annotated_interfaces)
    }

    // ---------------------------------------------------------------------
    // Merging
    // ---------------------------------------------------------------------

    /// Merges the attributes of `annotation_name` found on `element` with get
    /// semantics.
    ///
    /// Returns `Ok(None)` when the annotation is neither present nor
    /// meta-present.
    pub fn get_merged(&self, element: &Element, annotation_name: &str) -> SteleResult<Option<AnnotationAttributes>> {
        self.get_merged_with(element, annotation_name, self.settings.merge_options())
    }

    /// Like [`get_merged`](Self::get_merged) with explicit rendering options.
    pub fn get_merged_with(
        &self,
        element: &Element,
        annotation_name: &str,
        options: MergeOptions,
    ) -> SteleResult<Option<AnnotationAttributes>> {
        self.merged(SearchKind::Get, element, annotation_name, options)
    }

    /// Merges the attributes of `annotation_name` found on `element` with find
    /// semantics.
    pub fn find_merged(&self, element: &Element, annotation_name: &str) -> SteleResult<Option<AnnotationAttributes>> {
        self.find_merged_with(element, annotation_name, self.settings.merge_options())
    }

    /// Like [`find_merged`](Self::find_merged) with explicit rendering options.
    pub fn find_merged_with(
        &self,
        element: &Element,
        annotation_name: &str,
        options: MergeOptions,
    ) -> SteleResult<Option<AnnotationAttributes>> {
        self.merged(SearchKind::Find, element, annotation_name, options)
    }

    fn merged(
        &self,
        kind: SearchKind,
        element: &Element,
        annotation_name: &str,
        options: MergeOptions,
    ) -> SteleResult<Option<AnnotationAttributes>> {
        let key = self.settings.cache_enabled.then(|| MergeKey {
            kind,
            element: element.clone(),
            annotation: annotation_name.to_string(),
            options,
        });
        if let Some(hit) = key.as_ref().and_then(|key| self.caches.merged(key)) {
            debug!(kind = kind.as_str(), element = %element, annotation = annotation_name, "merged cache hit");
            return Ok(hit);
        }

        let mut processor = MergeProcessor::new(&self.graph, annotation_name, options);
        let merged = match self.search().search(kind, element, annotation_name, &mut processor)? {
            Some(pending) => Some(merge::post_process_annotation_attributes(
                &self.graph,
                element,
                pending,
                options,
            )?),
            None => None,
        };

        if let Some(key) = key {
            self.caches.store_merged(key, merged.clone());
        }
        Ok(merged)
    }

    /// Merges with get semantics and synthesizes the result.
    pub fn get_merged_annotation(
        &self,
        element: &Element,
        annotation_name: &str,
    ) -> SteleResult<Option<SynthesizedAnnotation>> {
        self.get_merged_with(element, annotation_name, MergeOptions::raw())?
            .map(|attributes| self.synthesize(attributes, annotation_name, Some(element.clone())))
            .transpose()
    }

    /// Merges with find semantics and synthesizes the result.
    pub fn find_merged_annotation(
        &self,
        element: &Element,
        annotation_name: &str,
    ) -> SteleResult<Option<SynthesizedAnnotation>> {
        self.find_merged_with(element, annotation_name, MergeOptions::raw())?
            .map(|attributes| self.synthesize(attributes, annotation_name, Some(element.clone())))
            .transpose()
    }

    /// Merges `T` with get semantics into its typed form.
    pub fn get_merged_as<T: AnnotationSchema>(&self, element: &Element) -> SteleResult<Option<T>> {
        self.get_merged_annotation(element, T::NAME)?
            .map(|annotation| T::from_synthesized(&annotation))
            .transpose()
    }

    /// Merges `T` with find semantics into its typed form.
    pub fn find_merged_as<T: AnnotationSchema>(&self, element: &Element) -> SteleResult<Option<T>> {
        self.find_merged_annotation(element, T::NAME)?
            .map(|annotation| T::from_synthesized(&annotation))
            .transpose()
    }

    /// Collects the attributes of every `annotation_name` found with get
    /// semantics, without merging across levels.
    pub fn get_all_attributes(
        &self,
        element: &Element,
        annotation_name: &str,
    ) -> SteleResult<Option<MultiValueAttributes>> {
        let mut processor = CollectAll::new(&self.graph, annotation_name, self.settings.merge_options());
        self.search()
            .search(SearchKind::Get, element, annotation_name, &mut processor)?;
        Ok(processor.found.then_some(processor.attributes))
    }

    /// Resolves the attributes of a single annotation declared on `element`.
    pub fn annotation_attributes(&self, element: &Element, annotation: &Annotation) -> SteleResult<AnnotationAttributes> {
        merge::annotation_attributes(&self.graph, element, annotation, self.settings.merge_options())
    }

    // ---------------------------------------------------------------------
    // Presence
    // ---------------------------------------------------------------------

    /// Returns `true` if `annotation_name` is present or meta-present on
    /// `element` under get semantics.
    pub fn is_annotated(&self, element: &Element, annotation_name: &str) -> SteleResult<bool> {
        let mut processor = Presence { annotation_name };
        Ok(self
            .search()
            .search(SearchKind::Get, element, annotation_name, &mut processor)?
            .is_some())
    }

    /// Returns `true` if `annotation_name` is found on `element` under find
    /// semantics.
    pub fn has_annotation(&self, element: &Element, annotation_name: &str) -> SteleResult<bool> {
        let mut processor = Presence { annotation_name };
        Ok(self
            .search()
            .search(SearchKind::Find, element, annotation_name, &mut processor)?
            .is_some())
    }

    /// Returns the names of every meta-annotation type reachable from the
    /// `annotation_name` annotation present on `element`.
    ///
    /// Empty when the annotation is not present.
    pub fn get_meta_annotation_types(&self, element: &Element, annotation_name: &str) -> SteleResult<Vec<String>> {
        let Some(present) = self.present_annotation(element, annotation_name)? else {
            return Ok(Vec::new());
        };
        let mut processor = MetaTypes::default();
        self.search().search_from(
            SearchKind::Get,
            &Element::annotation_type(present.annotation_type()),
            annotation_name,
            &mut processor,
            1,
        )?;
        Ok(processor.types.into_iter().collect())
    }

    /// Returns `true` if `annotation_name` is meta-present, not merely
    /// present, on `element`.
    pub fn has_meta_annotation_types(&self, element: &Element, annotation_name: &str) -> SteleResult<bool> {
        let mut processor = HasMetaTypes { annotation_name };
        Ok(self
            .search()
            .search(SearchKind::Get, element, annotation_name, &mut processor)?
            .is_some())
    }

    fn present_annotation(&self, element: &Element, annotation_name: &str) -> SteleResult<Option<Annotation>> {
        let lookup = || -> SteleResult<Option<Annotation>> {
            let declared = self.registry.declared_annotations(element)?;
            if let Some(found) = declared.iter().find(|a| a.annotation_type() == annotation_name) {
                return Ok(Some(found.clone()));
            }
            if let Element::Class(class) = element {
                let inherited = self.registry.inherited_annotations(class)?;
                return Ok(inherited.into_iter().find(|a| a.annotation_type() == annotation_name));
            }
            Ok(None)
        };
        lookup().or_else(|err| {
            if err.is_configuration() {
                return Err(err);
            }
            info!(element = %element, error = %err, "failed to introspect annotations");
            Ok(None)
        })
    }

    // ---------------------------------------------------------------------
    // Raw lookup and synthesis
    // ---------------------------------------------------------------------

    /// Finds the first `annotation_name` with find semantics and synthesizes
    /// it against `element`.
    pub fn find_annotation(
        &self,
        element: &Element,
        annotation_name: &str,
    ) -> SteleResult<Option<SynthesizedAnnotation>> {
        let cached = if self.settings.cache_enabled {
            self.caches.found(element, annotation_name)
        } else {
            None
        };
        let found = match cached {
            Some(found) => found,
            None => {
                let mut processor = FirstMatch { annotation_name };
                let found = self
                    .search()
                    .search(SearchKind::Find, element, annotation_name, &mut processor)?;
                if self.settings.cache_enabled {
                    self.caches
                        .store_found(element.clone(), annotation_name.to_string(), found.clone());
                }
                found
            }
        };
        self.synthesize_annotation(found, Some(element.clone()))
    }

    /// Creates an alias-aware view of `annotation_name` over a store.
    pub fn synthesize(
        &self,
        attributes: AnnotationAttributes,
        annotation_name: &str,
        element: Option<Element>,
    ) -> SteleResult<SynthesizedAnnotation> {
        SynthesizedAnnotation::from_attributes(attributes, annotation_name, element, &self.graph)
    }

    /// Creates a view over an annotation instance.
    ///
    /// Types without aliases get a plain view. `None` yields `None`.
    pub fn synthesize_annotation(
        &self,
        annotation: Option<Annotation>,
        element: Option<Element>,
    ) -> SteleResult<Option<SynthesizedAnnotation>> {
        annotation
            .map(|annotation| SynthesizedAnnotation::from_annotation(annotation, element, &self.graph))
            .transpose()
    }

    /// Returns `true` if views of the type need alias handling.
    pub fn is_synthesizable(&self, annotation_name: &str) -> SteleResult<bool> {
        self.graph.is_synthesizable(annotation_name)
    }
}
