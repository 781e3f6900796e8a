//! Processors behind the engine's non-merging operations.

use std::sync::Arc;

use indexmap::IndexSet;
use stele_core::{AliasGraph, Annotation, Element, MultiValueAttributes, SteleResult};

use crate::merge::{annotation_attributes, MergeOptions};
use crate::search::Processor;

/// Collects the attributes of every matching annotation of a get search.
///
/// Never ends the search early.
pub(crate) struct CollectAll<'a> {
    graph: &'a Arc<AliasGraph>,
    annotation_name: &'a str,
    options: MergeOptions,
    pub(crate) found: bool,
    pub(crate) attributes: MultiValueAttributes,
}

impl<'a> CollectAll<'a> {
    pub(crate) fn new(graph: &'a Arc<AliasGraph>, annotation_name: &'a str, options: MergeOptions) -> Self {
        Self {
            graph,
            annotation_name,
            options,
            found: false,
            attributes: MultiValueAttributes::new(),
        }
    }
}

impl Processor for CollectAll<'_> {
    type Output = ();

    fn process(&mut self, element: &Element, annotation: &Annotation, _depth: usize) -> SteleResult<Option<()>> {
        if annotation.annotation_type() == self.annotation_name {
            let attributes = annotation_attributes(self.graph, element, annotation, self.options)?;
            self.attributes.add_all(&attributes);
            self.found = true;
        }
        Ok(None)
    }
}

/// Stops at the first annotation of the searched type.
pub(crate) struct Presence<'a> {
    pub(crate) annotation_name: &'a str,
}

impl Processor for Presence<'_> {
    type Output = ();

    fn process(&mut self, _element: &Element, annotation: &Annotation, _depth: usize) -> SteleResult<Option<()>> {
        Ok((annotation.annotation_type() == self.annotation_name).then_some(()))
    }
}

/// Collects the names of every meta-annotation type below the start element.
#[derive(Default)]
pub(crate) struct MetaTypes {
    pub(crate) types: IndexSet<String>,
}

impl Processor for MetaTypes {
    type Output = ();

    fn process(&mut self, _element: &Element, annotation: &Annotation, _depth: usize) -> SteleResult<Option<()>> {
        self.types.insert(annotation.annotation_type().to_string());
        Ok(None)
    }
}

/// Stops at the first meta-annotation of the searched type.
pub(crate) struct HasMetaTypes<'a> {
    pub(crate) annotation_name: &'a str,
}

impl Processor for HasMetaTypes<'_> {
    type Output = ();

    fn process(&mut self, _element: &Element, annotation: &Annotation, depth: usize) -> SteleResult<Option<()>> {
        Ok((depth > 0 && annotation.annotation_type() == self.annotation_name).then_some(()))
    }
}

/// Returns the first raw annotation of the searched type.
pub(crate) struct FirstMatch<'a> {
    pub(crate) annotation_name: &'a str,
}

impl Processor for FirstMatch<'_> {
    type Output = Annotation;

    fn process(
        &mut self,
        _element: &Element,
        annotation: &Annotation,
        _depth: usize,
    ) -> SteleResult<Option<Annotation>> {
        Ok((annotation.annotation_type() == self.annotation_name).then(|| annotation.clone()))
    }
}
