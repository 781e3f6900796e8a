//! Attribute merging.
//!
//! [`MergeProcessor`] extracts the attributes of the searched annotation where
//! the search finds it, then overlays the values of every annotation between
//! that point and the root element as the result travels back up. An
//! attribute overrides the target attribute it is declared an alias for; any
//! other attribute except `value` overrides a target attribute of the same
//! name.
//!
//! Attributes still holding their declared default are kept as
//! [`Slot::Default`] until the final pass, so that an explicit alias value can
//! replace them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use stele_core::{
    meta, AliasGraph, Annotation, AnnotationAttributes, AttributeValue, Element, SteleError,
    SteleResult, SynthesizedAnnotation,
};
use tracing::trace;

use crate::search::Processor;

/// How values are rendered into merged stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeOptions {
    /// Render class references as their names.
    pub class_values_as_string: bool,
    /// Render nested annotations as attribute stores instead of instances.
    pub nested_annotations_as_map: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            class_values_as_string: false,
            nested_annotations_as_map: true,
        }
    }
}

impl MergeOptions {
    /// Options that keep class references and nested annotation instances.
    #[must_use]
    pub const fn raw() -> Self {
        Self {
            class_values_as_string: false,
            nested_annotations_as_map: false,
        }
    }
}

/// One attribute of a store under construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A value set explicitly somewhere in the hierarchy.
    Value(AttributeValue),
    /// The declared default, still waiting for an override.
    Default(AttributeValue),
}

impl Slot {
    fn explicit(&self) -> Option<&AttributeValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Default(_) => None,
        }
    }
}

/// Attribute store under construction by a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttributes {
    annotation_type: String,
    slots: IndexMap<String, Slot>,
}

impl PendingAttributes {
    /// Returns the annotation type being merged.
    #[must_use]
    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    /// Returns the slot of an attribute.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }
}

/// Reads every attribute of `annotation`, replacing values equal to their
/// default with [`Slot::Default`].
pub fn retrieve_attributes(
    graph: &Arc<AliasGraph>,
    element: &Element,
    annotation: &Annotation,
    options: MergeOptions,
) -> SteleResult<PendingAttributes> {
    let ty = graph.registry().annotation_type(annotation.annotation_type())?;
    let mut slots = IndexMap::with_capacity(ty.attributes().len());
    for method in ty.attributes() {
        let default = method.default();
        let value = annotation
            .value(method.name())
            .or(default)
            .cloned()
            .ok_or_else(|| SteleError::missing_attribute_value(ty.name(), method.name()))?;
        let slot = if default == Some(&value) {
            Slot::Default(value)
        } else {
            Slot::Value(adapt_value(graph, element, value, options)?)
        };
        slots.insert(method.name().to_string(), slot);
    }
    Ok(PendingAttributes {
        annotation_type: ty.name().to_string(),
        slots,
    })
}

/// Renders a value according to `options`.
pub fn adapt_value(
    graph: &Arc<AliasGraph>,
    element: &Element,
    value: AttributeValue,
    options: MergeOptions,
) -> SteleResult<AttributeValue> {
    match value {
        AttributeValue::Class(class) if options.class_values_as_string => {
            Ok(AttributeValue::String(class.name().to_string()))
        }
        AttributeValue::Annotation(nested) => {
            if options.nested_annotations_as_map {
                Ok(AttributeValue::Attributes(annotation_attributes(
                    graph, element, &nested, options,
                )?))
            } else {
                let view = SynthesizedAnnotation::from_annotation(nested, Some(element.clone()), graph)?;
                Ok(AttributeValue::Annotation(view.to_annotation()?))
            }
        }
        AttributeValue::Array(items) => Ok(AttributeValue::Array(
            items
                .into_iter()
                .map(|item| adapt_value(graph, element, item, options))
                .collect::<SteleResult<_>>()?,
        )),
        other => Ok(other),
    }
}

/// Returns the fully resolved attributes of a single annotation.
pub fn annotation_attributes(
    graph: &Arc<AliasGraph>,
    element: &Element,
    annotation: &Annotation,
    options: MergeOptions,
) -> SteleResult<AnnotationAttributes> {
    let pending = retrieve_attributes(graph, element, annotation, options)?;
    post_process_annotation_attributes(graph, element, pending, options)
}

/// Final pass over a merged store.
///
/// For each alias relationship of the store's type, a value present on only
/// one side is copied to the other, and unequal values on both sides are a
/// conflict. Remaining defaults are then filled in.
pub fn post_process_annotation_attributes(
    graph: &Arc<AliasGraph>,
    element: &Element,
    pending: PendingAttributes,
    options: MergeOptions,
) -> SteleResult<AnnotationAttributes> {
    let PendingAttributes {
        annotation_type,
        mut slots,
    } = pending;
    let alias_map = graph.alias_map(&annotation_type)?;
    let declared: HashMap<String, AttributeValue> = slots
        .iter()
        .filter_map(|(name, slot)| slot.explicit().map(|value| (name.clone(), value.clone())))
        .collect();

    // Conflicts compare declared values only; propagated copies never take part.
    for (name, aliases) in alias_map.iter() {
        let value = declared.get(name);
        for alias in aliases {
            let alias_value = declared.get(alias);
            match (value, alias_value) {
                (Some(value), Some(alias_value)) if value != alias_value => {
                    return Err(SteleError::AttributeConflict {
                        annotation: annotation_type.clone(),
                        element: element.to_string(),
                        attribute: name.clone(),
                        alias: alias.clone(),
                        value: value.to_string(),
                        alias_value: alias_value.to_string(),
                    });
                }
                (None, Some(alias_value)) => {
                    let filled = slots.get(name).and_then(Slot::explicit).is_some();
                    if !filled {
                        slots.insert(name.clone(), Slot::Value(alias_value.clone()));
                    }
                }
                _ => {}
            }
        }
    }

    let mut attributes = AnnotationAttributes::for_type(annotation_type);
    for (name, slot) in slots {
        let value = match slot {
            Slot::Value(value) => value,
            Slot::Default(default) => adapt_value(graph, element, default, options)?,
        };
        attributes.insert(name, value);
    }
    Ok(attributes)
}

/// Merges the attributes of one annotation type across a search.
#[derive(Debug)]
pub struct MergeProcessor<'a> {
    graph: &'a Arc<AliasGraph>,
    annotation_name: &'a str,
    options: MergeOptions,
}

impl<'a> MergeProcessor<'a> {
    /// Creates a processor merging `annotation_name`.
    #[must_use]
    pub fn new(graph: &'a Arc<AliasGraph>, annotation_name: &'a str, options: MergeOptions) -> Self {
        Self {
            graph,
            annotation_name,
            options,
        }
    }

    fn override_attributes(
        &self,
        element: &Element,
        view: &SynthesizedAnnotation,
        source: &str,
        targets: &[String],
        merged: &mut PendingAttributes,
    ) -> SteleResult<()> {
        let value = adapt_value(self.graph, element, view.attribute(source)?, self.options)?;
        for target in targets {
            merged.slots.insert(target.clone(), Slot::Value(value.clone()));
        }
        Ok(())
    }
}

impl Processor for MergeProcessor<'_> {
    type Output = PendingAttributes;

    fn process(
        &mut self,
        element: &Element,
        annotation: &Annotation,
        _depth: usize,
    ) -> SteleResult<Option<PendingAttributes>> {
        if annotation.annotation_type() != self.annotation_name {
            return Ok(None);
        }
        retrieve_attributes(self.graph, element, annotation, self.options).map(Some)
    }

    fn post_process(
        &mut self,
        element: &Element,
        annotation: &Annotation,
        merged: &mut PendingAttributes,
    ) -> SteleResult<()> {
        let view = SynthesizedAnnotation::from_annotation(annotation.clone(), Some(element.clone()), self.graph)?;
        let target_type = merged.annotation_type.clone();
        let target_aliases = self.graph.alias_map(&target_type)?;
        let mut replaced: HashSet<String> = HashSet::new();

        for method in view.schema().attributes() {
            let name = method.name();
            let override_name =
                self.graph
                    .attribute_override_name(annotation.annotation_type(), name, &target_type)?;

            if let Some(override_name) = override_name {
                if replaced.contains(&override_name) {
                    continue;
                }
                let mut targets = vec![override_name.clone()];
                replaced.insert(override_name.clone());
                if let Some(aliases) = target_aliases.get(&override_name) {
                    for alias in aliases {
                        if replaced.insert(alias.clone()) {
                            targets.push(alias.clone());
                        }
                    }
                }
                trace!(source = %annotation.annotation_type(), attribute = name, targets = ?targets, "overriding attributes");
                self.override_attributes(element, &view, name, &targets, merged)?;
            } else if name != meta::VALUE && merged.slots.contains_key(name) {
                trace!(source = %annotation.annotation_type(), attribute = name, "overriding attribute by convention");
                self.override_attributes(element, &view, name, &[name.to_string()], merged)?;
            }
        }
        Ok(())
    }
}
