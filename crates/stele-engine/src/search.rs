//! Annotation search.
//!
//! A search walks the annotation graph from a root [`Element`] looking for
//! annotations of one type, handing candidates to a [`Processor`]:
//!
//! - **Get semantics** consider annotations present on the element itself,
//!   including annotations a class inherits from its superclasses, and every
//!   meta-annotation reachable from them.
//! - **Find semantics** additionally search bridged methods, methods of
//!   implemented interfaces, overridden methods up the superclass chain, and
//!   the interfaces and superclass of a class.
//!
//! Each element is visited at most once per search. Failures to introspect
//! one element are logged and the element contributes nothing; configuration
//! errors abort the search.

use std::collections::HashSet;

use dashmap::DashMap;
use stele_core::{Annotation, Element, MethodRef, SteleError, SteleResult, TypeRegistry};
use tracing::{debug, info, trace};

use crate::cache::{record_lookup, CacheName};
use crate::settings::EngineSettings;

/// Which traversal policy a search follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// Element and inherited annotations only.
    Get,
    /// Also interfaces, superclasses and bridged methods.
    Find,
}

impl SearchKind {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Find => "find",
        }
    }
}

/// Callback receiving the candidates of a search.
///
/// `process` is called for every candidate of the searched type at depth 0
/// and for every candidate at depth > 0. Returning `Some` ends the search.
/// While the result travels back up the meta-annotation chain,
/// `post_process` sees the annotation at each level it passes.
pub trait Processor {
    /// Result produced by the search.
    type Output;

    /// Processes a candidate annotation declared on `element`.
    fn process(
        &mut self,
        element: &Element,
        annotation: &Annotation,
        depth: usize,
    ) -> SteleResult<Option<Self::Output>>;

    /// Adjusts a result on its way back through `annotation`, declared on `element`.
    fn post_process(
        &mut self,
        _element: &Element,
        _annotation: &Annotation,
        _result: &mut Self::Output,
    ) -> SteleResult<()> {
        Ok(())
    }
}

/// Traversal over one registry.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationSearch<'e> {
    registry: &'e TypeRegistry,
    settings: &'e EngineSettings,
    annotated_interfaces: &'e DashMap<String, bool>,
}

/// Mutable state of one top-level search. Never shared.
struct Visit<'p, P> {
    annotation_name: &'p str,
    processor: &'p mut P,
    visited: HashSet<Element>,
}

impl<'e> AnnotationSearch<'e> {
    /// Creates a traversal over a registry.
    #[must_use]
    pub fn new(
        registry: &'e TypeRegistry,
        settings: &'e EngineSettings,
        annotated_interfaces: &'e DashMap<String, bool>,
    ) -> Self {
        Self {
            registry,
            settings,
            annotated_interfaces,
        }
    }

    /// Searches `element` for annotations named `annotation_name`.
    pub fn search<P: Processor>(
        &self,
        kind: SearchKind,
        element: &Element,
        annotation_name: &str,
        processor: &mut P,
    ) -> SteleResult<Option<P::Output>> {
        self.search_from(kind, element, annotation_name, processor, 0)
    }

    /// Searches starting at the given meta-annotation depth.
    pub fn search_from<P: Processor>(
        &self,
        kind: SearchKind,
        element: &Element,
        annotation_name: &str,
        processor: &mut P,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        let mut visit = Visit {
            annotation_name,
            processor,
            visited: HashSet::new(),
        };
        trace!(kind = kind.as_str(), element = %element, annotation = annotation_name, "starting search");
        self.search_element(kind, element, &mut visit, depth)
    }

    fn search_element<P: Processor>(
        &self,
        kind: SearchKind,
        element: &Element,
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        if !visit.visited.insert(element.clone()) {
            return Ok(None);
        }
        let result = match kind {
            SearchKind::Get => self.get_semantics(element, visit, depth),
            SearchKind::Find => self.find_semantics(element, visit, depth),
        };
        result.or_else(|err| self.recover(element, err))
    }

    fn recover<T>(&self, element: &Element, err: SteleError) -> SteleResult<Option<T>> {
        if err.is_configuration() {
            return Err(err);
        }
        if element.is_annotation_type() {
            debug!(element = %element, error = %err, "failed to introspect meta-annotations");
        } else {
            info!(element = %element, error = %err, "failed to introspect annotations");
        }
        metrics::counter!("stele_introspection_failures_total", "element_kind" => element.kind())
            .increment(1);
        Ok(None)
    }

    fn check_depth(&self, element: &Element, depth: usize) -> SteleResult<()> {
        if depth > self.settings.max_meta_depth {
            return Err(SteleError::MetaDepthExceeded {
                element: element.to_string(),
                limit: self.settings.max_meta_depth,
            });
        }
        Ok(())
    }

    fn get_semantics<P: Processor>(
        &self,
        element: &Element,
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        self.check_depth(element, depth)?;

        let declared = self.registry.declared_annotations(element)?;
        if let Some(result) = self.search_annotations(SearchKind::Get, element, declared, visit, depth)? {
            return Ok(Some(result));
        }

        if let Element::Class(class) = element {
            let inherited = self.registry.inherited_annotations(class)?;
            if let Some(result) =
                self.search_annotations(SearchKind::Get, element, &inherited, visit, depth)?
            {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn find_semantics<P: Processor>(
        &self,
        element: &Element,
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        self.check_depth(element, depth)?;

        let declared = self.registry.declared_annotations(element)?;
        if let Some(result) = self.search_annotations(SearchKind::Find, element, declared, visit, depth)? {
            return Ok(Some(result));
        }

        match element {
            Element::Method(method) => self.find_on_method_hierarchy(method, visit, depth),
            Element::Class(class) => {
                let def = self.registry.class(class)?;
                for interface in def.interfaces() {
                    let result = self.search_element(
                        SearchKind::Find,
                        &Element::Class(interface.clone()),
                        visit,
                        depth,
                    )?;
                    if result.is_some() {
                        return Ok(result);
                    }
                }
                match def.superclass() {
                    Some(superclass) => self.search_element(
                        SearchKind::Find,
                        &Element::Class(superclass.to_string()),
                        visit,
                        depth,
                    ),
                    None => Ok(None),
                }
            }
            Element::AnnotationType(_) => Ok(None),
        }
    }

    fn find_on_method_hierarchy<P: Processor>(
        &self,
        method: &MethodRef,
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        let bridged = self.registry.resolve_bridged_method(method)?;
        let result = self.search_element(SearchKind::Find, &Element::Method(bridged), visit, depth)?;
        if result.is_some() {
            return Ok(result);
        }

        let declaring = self.registry.class(&method.class)?;
        let result = self.search_on_interfaces(method, declaring.interfaces(), visit, depth)?;
        if result.is_some() {
            return Ok(result);
        }

        let mut seen = HashSet::from([declaring.name()]);
        let mut current = declaring.superclass();
        while let Some(name) = current {
            if !seen.insert(name) {
                break;
            }
            let superclass = self.registry.class(name)?;
            if superclass
                .declared_method(&method.name, &method.parameters)
                .is_some()
            {
                let equivalent = self.registry.resolve_bridged_method(&method.on_class(name))?;
                let result =
                    self.search_element(SearchKind::Find, &Element::Method(equivalent), visit, depth)?;
                if result.is_some() {
                    return Ok(result);
                }
            }
            let result = self.search_on_interfaces(method, superclass.interfaces(), visit, depth)?;
            if result.is_some() {
                return Ok(result);
            }
            current = superclass.superclass();
        }
        Ok(None)
    }

    fn search_on_interfaces<P: Processor>(
        &self,
        method: &MethodRef,
        interfaces: &[String],
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        for interface in interfaces {
            if !self.has_annotated_methods(interface)? {
                continue;
            }
            let Some(equivalent) =
                self.registry
                    .find_interface_method(interface, &method.name, &method.parameters)?
            else {
                continue;
            };
            let result = self.search_element(SearchKind::Find, &Element::Method(equivalent), visit, depth)?;
            if result.is_some() {
                return Ok(result);
            }
        }
        Ok(None)
    }

    fn has_annotated_methods(&self, interface: &str) -> SteleResult<bool> {
        if self.settings.cache_enabled {
            if let Some(hit) = self.annotated_interfaces.get(interface) {
                record_lookup(CacheName::AnnotatedInterfaces, true);
                return Ok(*hit);
            }
            record_lookup(CacheName::AnnotatedInterfaces, false);
        }
        let annotated = self.registry.has_annotated_methods(interface)?;
        if self.settings.cache_enabled {
            self.annotated_interfaces
                .insert(interface.to_string(), annotated);
        }
        Ok(annotated)
    }

    /// Processes one partition of candidates, then descends into their types.
    fn search_annotations<P: Processor>(
        &self,
        kind: SearchKind,
        element: &Element,
        annotations: &[Annotation],
        visit: &mut Visit<'_, P>,
        depth: usize,
    ) -> SteleResult<Option<P::Output>> {
        let candidates: Vec<&Annotation> = annotations
            .iter()
            .filter(|a| !self.settings.is_builtin(a.annotation_type()))
            .collect();

        for candidate in &candidates {
            if depth > 0 || candidate.annotation_type() == visit.annotation_name {
                trace!(element = %element, candidate = %candidate, depth, "processing candidate");
                if let Some(result) = visit.processor.process(element, candidate, depth)? {
                    return Ok(Some(result));
                }
            }
        }

        for candidate in &candidates {
            let meta = Element::AnnotationType(candidate.annotation_type().to_string());
            if let Some(mut result) = self.search_element(kind, &meta, visit, depth + 1)? {
                visit.processor.post_process(element, candidate, &mut result)?;
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}
