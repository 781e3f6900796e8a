//! Engine settings.

use serde::{Deserialize, Serialize};
use stele_core::meta;

use crate::merge::MergeOptions;

/// Tunables of an [`AnnotationEngine`](crate::AnnotationEngine).
///
/// # Example
///
/// ```
/// use stele_engine::EngineSettings;
///
/// let settings: EngineSettings = serde_json::from_str(r#"{ "max_meta_depth": 8 }"#).unwrap();
/// assert_eq!(settings.max_meta_depth, 8);
/// assert!(settings.cache_enabled);
/// assert!(settings.is_builtin("stele.meta.Inherited"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Namespaces whose annotation types are skipped during traversal.
    pub builtin_namespaces: Vec<String>,

    /// Whether merged results and interface checks are memoized.
    pub cache_enabled: bool,

    /// Default for rendering class references as their names in merged stores.
    pub class_values_as_string: bool,

    /// Default for rendering nested annotations as attribute stores in merged stores.
    pub nested_annotations_as_map: bool,

    /// Deepest meta-annotation level a search descends to.
    pub max_meta_depth: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            builtin_namespaces: vec![meta::NAMESPACE.to_string()],
            cache_enabled: true,
            class_values_as_string: false,
            nested_annotations_as_map: true,
            max_meta_depth: 32,
        }
    }
}

impl EngineSettings {
    /// Returns `true` if the annotation type lives in a built-in namespace.
    #[must_use]
    pub fn is_builtin(&self, annotation_type: &str) -> bool {
        self.builtin_namespaces.iter().any(|ns| {
            annotation_type
                .strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Returns the merge options used when none are given explicitly.
    #[must_use]
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            class_values_as_string: self.class_values_as_string,
            nested_annotations_as_map: self.nested_annotations_as_map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.builtin_namespaces, vec!["stele.meta".to_string()]);
        assert_eq!(settings.max_meta_depth, 32);
        assert_eq!(settings.merge_options(), MergeOptions::default());
    }

    #[test]
    fn test_builtin_namespace_matches_whole_segment() {
        let settings = EngineSettings::default();
        assert!(settings.is_builtin("stele.meta.Documented"));
        assert!(!settings.is_builtin("stele.metadata.Thing"));
        assert!(!settings.is_builtin("web.Mapping"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<EngineSettings, _> = serde_json::from_str(r#"{ "cache": true }"#);
        assert!(result.is_err());
    }
}
