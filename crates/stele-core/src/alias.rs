//! Attribute alias resolution.
//!
//! An attribute can declare itself an alias for another attribute of the same
//! annotation type (an *alias pair*), or an override of an attribute of a
//! meta-annotation. Overrides form chains through the meta-annotation
//! hierarchy; two attributes of one type whose chains meet at the same
//! attribute are *implicit* aliases of each other.
//!
//! [`AliasGraph`] validates declarations when they are first needed and
//! memoizes everything it computes for the lifetime of the graph. Caches are
//! keyed by owned names and never hold a guard across a recursive call, so
//! concurrent callers may race to compute the same entry; the later insert
//! wins and both results are identical.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{SteleError, SteleResult};
use crate::registry::{AnnotationType, AttributeMethod, TypeRegistry};

/// Attribute name to the names of its aliases, for one annotation type.
pub type AliasMap = IndexMap<String, Vec<String>>;

/// A validated alias declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasDescriptor {
    source_annotation: String,
    source_attribute: String,
    aliased_annotation: String,
    aliased_attribute: String,
    is_alias_pair: bool,
}

impl AliasDescriptor {
    /// Annotation type declaring the alias.
    #[must_use]
    pub fn source_annotation(&self) -> &str {
        &self.source_annotation
    }

    /// Attribute declaring the alias.
    #[must_use]
    pub fn source_attribute(&self) -> &str {
        &self.source_attribute
    }

    /// Annotation type the alias points into.
    #[must_use]
    pub fn aliased_annotation(&self) -> &str {
        &self.aliased_annotation
    }

    /// Attribute the alias points at.
    #[must_use]
    pub fn aliased_attribute(&self) -> &str {
        &self.aliased_attribute
    }

    /// Returns `true` when both attributes belong to the same annotation type.
    #[must_use]
    pub fn is_alias_pair(&self) -> bool {
        self.is_alias_pair
    }

    /// Returns `true` when this declaration overrides an attribute of `meta_annotation`.
    #[must_use]
    pub fn is_override_for(&self, meta_annotation: &str) -> bool {
        self.aliased_annotation == meta_annotation
    }

    fn target_key(&self) -> (&str, &str) {
        (&self.aliased_annotation, &self.aliased_attribute)
    }
}

type AttributeKey = (String, String);

/// Cached alias relationships over a [`TypeRegistry`].
#[derive(Debug)]
pub struct AliasGraph {
    registry: Arc<TypeRegistry>,
    descriptors: DashMap<AttributeKey, Option<Arc<AliasDescriptor>>>,
    alias_maps: DashMap<String, Arc<AliasMap>>,
    synthesizable: DashMap<String, bool>,
    meta_present: DashMap<AttributeKey, bool>,
}

impl AliasGraph {
    /// Creates an empty graph over a registry.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            descriptors: DashMap::new(),
            alias_maps: DashMap::new(),
            synthesizable: DashMap::new(),
            meta_present: DashMap::new(),
        }
    }

    /// Returns the registry the graph resolves against.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Returns the validated alias declaration of an attribute, if it declares one.
    pub fn descriptor(
        &self,
        annotation: &str,
        attribute: &str,
    ) -> SteleResult<Option<Arc<AliasDescriptor>>> {
        let key = (annotation.to_string(), attribute.to_string());
        if let Some(hit) = self.descriptors.get(&key) {
            return Ok(hit.clone());
        }

        let ty = self.registry.annotation_type(annotation)?;
        let method = ty
            .find_attribute(attribute)
            .ok_or_else(|| SteleError::attribute_not_found(attribute, annotation))?;
        let descriptor = match method.alias() {
            Some(_) => Some(Arc::new(self.build_descriptor(&ty, method)?)),
            None => None,
        };

        self.descriptors.insert(key, descriptor.clone());
        Ok(descriptor)
    }

    fn build_descriptor(
        &self,
        ty: &AnnotationType,
        method: &AttributeMethod,
    ) -> SteleResult<AliasDescriptor> {
        let alias = method.alias().cloned().unwrap_or_default();
        let source_annotation = ty.name().to_string();
        let source_attribute = method.name().to_string();
        let aliased_annotation = alias.annotation.unwrap_or_else(|| source_annotation.clone());
        let aliased_attribute = alias.attribute.unwrap_or_else(|| source_attribute.clone());

        if aliased_annotation == source_annotation && aliased_attribute == source_attribute {
            return Err(SteleError::AliasPointsToSelf {
                annotation: source_annotation,
                attribute: source_attribute,
            });
        }

        let target_missing = || SteleError::AliasTargetMissing {
            annotation: source_annotation.clone(),
            attribute: source_attribute.clone(),
            target_annotation: aliased_annotation.clone(),
            target_attribute: aliased_attribute.clone(),
        };
        let target_type = self
            .registry
            .annotation_type(&aliased_annotation)
            .map_err(|_| target_missing())?;
        let target = target_type
            .find_attribute(&aliased_attribute)
            .ok_or_else(target_missing)?;

        let is_alias_pair = aliased_annotation == source_annotation;

        if !is_alias_pair && !self.is_meta_present(&source_annotation, &aliased_annotation) {
            return Err(SteleError::AliasTargetNotMetaPresent {
                annotation: source_annotation,
                attribute: source_attribute,
                target_annotation: aliased_annotation,
                target_attribute: aliased_attribute,
            });
        }

        if is_alias_pair {
            let mirror = target
                .alias()
                .map(|m| m.attribute.clone().unwrap_or_else(|| target.name().to_string()));
            if mirror.as_deref() != Some(source_attribute.as_str()) {
                return Err(SteleError::AliasMirrorMismatch {
                    annotation: source_annotation,
                    attribute: source_attribute,
                    mirror: aliased_attribute,
                    actual: mirror,
                });
            }
        }

        let return_type = method.attribute_type();
        let aliased_return_type = target.attribute_type();
        if return_type != aliased_return_type
            && aliased_return_type.element_type() != Some(return_type)
        {
            return Err(SteleError::AliasReturnTypeMismatch {
                annotation: source_annotation,
                attribute: source_attribute,
                target_annotation: aliased_annotation,
                target_attribute: aliased_attribute,
            });
        }

        if is_alias_pair {
            validate_defaults(&source_annotation, method, &aliased_annotation, target)?;
        }

        debug!(
            annotation = %source_annotation,
            attribute = %source_attribute,
            aliased_annotation = %aliased_annotation,
            aliased_attribute = %aliased_attribute,
            "validated alias declaration"
        );

        Ok(AliasDescriptor {
            source_annotation,
            source_attribute,
            aliased_annotation,
            aliased_attribute,
            is_alias_pair,
        })
    }

    /// Returns the descriptor the given one overrides in turn, if any.
    ///
    /// Alias pairs end a chain.
    pub fn override_descriptor(
        &self,
        descriptor: &AliasDescriptor,
    ) -> SteleResult<Option<Arc<AliasDescriptor>>> {
        if descriptor.is_alias_pair {
            return Ok(None);
        }
        self.descriptor(&descriptor.aliased_annotation, &descriptor.aliased_attribute)
    }

    /// Returns the override chain starting at `descriptor`, itself included.
    fn override_chain(&self, descriptor: Arc<AliasDescriptor>) -> SteleResult<Vec<Arc<AliasDescriptor>>> {
        let mut seen = HashSet::new();
        seen.insert((
            descriptor.source_annotation.clone(),
            descriptor.source_attribute.clone(),
        ));
        let mut chain = vec![descriptor];
        while let Some(last) = chain.last() {
            let Some(next) = self.override_descriptor(last)? else {
                break;
            };
            if !seen.insert((next.source_annotation.clone(), next.source_attribute.clone())) {
                break;
            }
            chain.push(next);
        }
        Ok(chain)
    }

    fn is_alias_for(&self, lhs: &Arc<AliasDescriptor>, rhs: &Arc<AliasDescriptor>) -> SteleResult<bool> {
        let left = self.override_chain(Arc::clone(lhs))?;
        let right = self.override_chain(Arc::clone(rhs))?;
        Ok(left
            .iter()
            .any(|l| right.iter().any(|r| l.target_key() == r.target_key())))
    }

    /// Returns the names of every attribute of `annotation` that is an alias
    /// of `attribute`, explicit or implicit.
    pub fn attribute_alias_names(&self, annotation: &str, attribute: &str) -> SteleResult<Vec<String>> {
        let Some(descriptor) = self.descriptor(annotation, attribute)? else {
            return Ok(Vec::new());
        };
        if descriptor.is_alias_pair {
            return Ok(vec![descriptor.aliased_attribute.clone()]);
        }

        let ty = self.registry.annotation_type(annotation)?;
        let Some(method) = ty.find_attribute(attribute) else {
            return Ok(Vec::new());
        };
        let mut aliases = Vec::new();
        for other in ty.attributes() {
            if other.name() == attribute {
                continue;
            }
            let Some(other_descriptor) = self.descriptor(annotation, other.name())? else {
                continue;
            };
            if self.is_alias_for(&descriptor, &other_descriptor)? {
                validate_defaults(annotation, method, annotation, other)?;
                aliases.push(other.name().to_string());
            }
        }
        Ok(aliases)
    }

    /// Returns the attribute of `meta_annotation` that `attribute` overrides,
    /// directly or through an override chain.
    pub fn attribute_override_name(
        &self,
        annotation: &str,
        attribute: &str,
        meta_annotation: &str,
    ) -> SteleResult<Option<String>> {
        let Some(descriptor) = self.descriptor(annotation, attribute)? else {
            return Ok(None);
        };
        Ok(self
            .override_chain(descriptor)?
            .into_iter()
            .find(|d| d.is_override_for(meta_annotation))
            .map(|d| d.aliased_attribute.clone()))
    }

    /// Resolves the aliases of an attribute.
    ///
    /// With a meta-annotation type, returns at most the one attribute of that
    /// type which `attribute` overrides. Without one, returns the explicit
    /// partner of an alias pair or every implicit alias.
    pub fn resolve_aliases_for_attribute(
        &self,
        annotation: &str,
        attribute: &str,
        meta_annotation: Option<&str>,
    ) -> SteleResult<Vec<String>> {
        match meta_annotation {
            Some(meta) => Ok(self
                .attribute_override_name(annotation, attribute, meta)?
                .into_iter()
                .collect()),
            None => self.attribute_alias_names(annotation, attribute),
        }
    }

    /// Returns the alias map of an annotation type.
    ///
    /// Only attributes with at least one alias appear.
    pub fn alias_map(&self, annotation: &str) -> SteleResult<Arc<AliasMap>> {
        if let Some(hit) = self.alias_maps.get(annotation) {
            return Ok(Arc::clone(&hit));
        }

        let ty = self.registry.annotation_type(annotation)?;
        let mut map = AliasMap::new();
        for method in ty.attributes() {
            let aliases = self.attribute_alias_names(annotation, method.name())?;
            if !aliases.is_empty() {
                map.insert(method.name().to_string(), aliases);
            }
        }
        trace!(annotation, aliases = map.len(), "computed alias map");

        let map = Arc::new(map);
        self.alias_maps.insert(annotation.to_string(), Arc::clone(&map));
        Ok(map)
    }

    /// Returns `true` if views of the annotation type need alias handling.
    ///
    /// A type qualifies when any attribute declares an alias, or when a nested
    /// annotation attribute's type qualifies.
    pub fn is_synthesizable(&self, annotation: &str) -> SteleResult<bool> {
        if let Some(hit) = self.synthesizable.get(annotation) {
            return Ok(*hit);
        }
        let mut visited = HashSet::new();
        let result = self.synthesizable_inner(annotation, &mut visited)?;
        self.synthesizable.insert(annotation.to_string(), result);
        Ok(result)
    }

    fn synthesizable_inner(&self, annotation: &str, visited: &mut HashSet<String>) -> SteleResult<bool> {
        if let Some(hit) = self.synthesizable.get(annotation) {
            return Ok(*hit);
        }
        if !visited.insert(annotation.to_string()) {
            return Ok(false);
        }

        let ty = self.registry.annotation_type(annotation)?;
        for method in ty.attributes() {
            if self.descriptor(annotation, method.name())?.is_some() {
                self.synthesizable.insert(annotation.to_string(), true);
                return Ok(true);
            }
            if let Some(nested) = method.attribute_type().nested_annotation_type() {
                if self.synthesizable_inner(nested, visited)? {
                    self.synthesizable.insert(annotation.to_string(), true);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Returns `true` if `meta_annotation` is declared on `annotation`, directly
    /// or on any of its meta-annotations.
    pub fn is_meta_present(&self, annotation: &str, meta_annotation: &str) -> bool {
        let key = (annotation.to_string(), meta_annotation.to_string());
        if let Some(hit) = self.meta_present.get(&key) {
            return *hit;
        }
        let mut visited = HashSet::new();
        let found = self.meta_present_inner(annotation, meta_annotation, &mut visited);
        self.meta_present.insert(key, found);
        found
    }

    fn meta_present_inner(&self, annotation: &str, meta_annotation: &str, visited: &mut HashSet<String>) -> bool {
        if !visited.insert(annotation.to_string()) {
            return false;
        }
        let Ok(ty) = self.registry.annotation_type(annotation) else {
            return false;
        };
        let metas = ty.meta_annotations();
        metas.iter().any(|m| m.annotation_type() == meta_annotation)
            || metas
                .iter()
                .any(|m| self.meta_present_inner(m.annotation_type(), meta_annotation, visited))
    }
}

fn validate_defaults(
    annotation: &str,
    method: &AttributeMethod,
    target_annotation: &str,
    target: &AttributeMethod,
) -> SteleResult<()> {
    match (method.default(), target.default()) {
        (Some(a), Some(b)) if a == b => Ok(()),
        (Some(_), Some(_)) => Err(SteleError::AliasDefaultMismatch {
            annotation: annotation.to_string(),
            attribute: method.name().to_string(),
            target_annotation: target_annotation.to_string(),
            target_attribute: target.name().to_string(),
        }),
        _ => Err(SteleError::AliasDefaultMissing {
            annotation: annotation.to_string(),
            attribute: method.name().to_string(),
            target_annotation: target_annotation.to_string(),
            target_attribute: target.name().to_string(),
        }),
    }
}
