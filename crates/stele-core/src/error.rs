//! Error types for Stele.
//!
//! This module provides the [`SteleError`] type, the single error type used by
//! every Stele crate that touches annotation metadata.
//!
//! # Categories
//!
//! Errors fall into four [`ErrorCategory`] buckets, and callers are expected
//! to treat them differently:
//!
//! | Category | Raised by | Handling |
//! |---|---|---|
//! | `Configuration` | alias validation, merged attribute conflicts | always propagated |
//! | `Introspection` | unresolvable types, classes, methods, values | recovered by the search engine |
//! | `Lookup` | typed getters on attribute stores | caller-facing |
//! | `Synthesis` | first access to a missing synthesized attribute | caller-facing, lazy |
//!
//! An absent annotation is never an error: search operations return `None`.

use thiserror::Error;

/// Result type alias using [`SteleError`].
pub type SteleResult<T> = Result<T, SteleError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Misdeclared aliases or conflicting merged attribute values.
    Configuration,
    /// Metadata that cannot be resolved against the type registry.
    Introspection,
    /// Attribute absent from a store, or stored with an incompatible type.
    Lookup,
    /// A synthesized view cannot produce a required attribute.
    Synthesis,
}

impl ErrorCategory {
    /// Returns a stable, lowercase label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Introspection => "introspection",
            Self::Lookup => "lookup",
            Self::Synthesis => "synthesis",
        }
    }
}

/// Standard error type for Stele.
///
/// # Example
///
/// ```
/// use stele_core::{ErrorCategory, SteleError};
///
/// let err = SteleError::attribute_not_found("roles", "web.Secured");
/// assert_eq!(err.category(), ErrorCategory::Lookup);
/// assert!(err.to_string().contains("roles"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SteleError {
    /// An alias declaration names its own attribute.
    #[error(
        "alias declaration on attribute '{attribute}' in annotation [{annotation}] points to itself; \
         specify 'annotation' to point to a same-named attribute on a meta-annotation"
    )]
    AliasPointsToSelf {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
    },

    /// An alias declaration names an attribute that does not exist.
    #[error(
        "attribute '{attribute}' in annotation [{annotation}] is declared as an alias for \
         nonexistent attribute '{target_attribute}' in annotation [{target_annotation}]"
    )]
    AliasTargetMissing {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
        /// Annotation type named by the alias.
        target_annotation: String,
        /// Attribute named by the alias.
        target_attribute: String,
    },

    /// An alias declaration names a meta-annotation that is not meta-present.
    #[error(
        "alias declaration on attribute '{attribute}' in annotation [{annotation}] declares an alias \
         for attribute '{target_attribute}' in meta-annotation [{target_annotation}] which is not meta-present"
    )]
    AliasTargetNotMetaPresent {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
        /// Meta-annotation type named by the alias.
        target_annotation: String,
        /// Attribute named by the alias.
        target_attribute: String,
    },

    /// The partner of an explicit alias pair does not declare the reciprocal alias.
    #[error(
        "attribute '{mirror}' in annotation [{annotation}] must be declared as an alias for \
         [{attribute}]{}",
        .actual.as_ref().map(|a| format!(", not [{a}]")).unwrap_or_default()
    )]
    AliasMirrorMismatch {
        /// Annotation type declaring the pair.
        annotation: String,
        /// Attribute whose alias names `mirror`.
        attribute: String,
        /// Partner attribute missing the reciprocal declaration.
        mirror: String,
        /// Attribute actually named by the partner, if it declares an alias at all.
        actual: Option<String>,
    },

    /// Aliased attributes declare different return types.
    #[error(
        "misconfigured aliases: attribute '{attribute}' in annotation [{annotation}] and attribute \
         '{target_attribute}' in annotation [{target_annotation}] must declare the same return type"
    )]
    AliasReturnTypeMismatch {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
        /// Aliased annotation type.
        target_annotation: String,
        /// Aliased attribute.
        target_attribute: String,
    },

    /// Aliased attributes do not both declare default values.
    #[error(
        "misconfigured aliases: attribute '{attribute}' in annotation [{annotation}] and attribute \
         '{target_attribute}' in annotation [{target_annotation}] must declare default values"
    )]
    AliasDefaultMissing {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
        /// Aliased annotation type.
        target_annotation: String,
        /// Aliased attribute.
        target_attribute: String,
    },

    /// Aliased attributes declare different default values.
    #[error(
        "misconfigured aliases: attribute '{attribute}' in annotation [{annotation}] and attribute \
         '{target_attribute}' in annotation [{target_annotation}] must declare the same default value"
    )]
    AliasDefaultMismatch {
        /// Declaring annotation type.
        annotation: String,
        /// Declaring attribute.
        attribute: String,
        /// Aliased annotation type.
        target_annotation: String,
        /// Aliased attribute.
        target_attribute: String,
    },

    /// Two aliased attributes carry different explicit values.
    #[error(
        "in attributes for annotation [{annotation}] declared on {element}, attribute '{attribute}' \
         and its alias '{alias}' are declared with values of [{value}] and [{alias_value}], \
         but only one is permitted"
    )]
    AttributeConflict {
        /// Annotation type being merged or synthesized.
        annotation: String,
        /// Element the annotation was declared on.
        element: String,
        /// First attribute.
        attribute: String,
        /// Its alias.
        alias: String,
        /// Rendered value of `attribute`.
        value: String,
        /// Rendered value of `alias`.
        alias_value: String,
    },

    /// An annotation type is not registered.
    #[error("annotation type [{name}] is not registered")]
    UnknownAnnotationType {
        /// Requested annotation type name.
        name: String,
    },

    /// A class or interface is not registered.
    #[error("class [{name}] is not registered")]
    UnknownClass {
        /// Requested class name.
        name: String,
    },

    /// A method is not declared on its class.
    #[error("method {method} is not declared")]
    UnknownMethod {
        /// Rendered method signature.
        method: String,
    },

    /// An annotation instance has no value for an attribute without a default.
    #[error("annotation [{annotation}] declares no value for required attribute '{attribute}'")]
    MissingAttributeValue {
        /// Annotation type.
        annotation: String,
        /// Attribute lacking a value.
        attribute: String,
    },

    /// A meta-annotation chain is deeper than the configured limit.
    #[error("meta-annotation depth limit of {limit} exceeded while introspecting {element}")]
    MetaDepthExceeded {
        /// Element at which the limit was hit.
        element: String,
        /// Configured limit.
        limit: usize,
    },

    /// An attribute is not present in an attribute store.
    #[error("attribute '{attribute}' not found in attributes for annotation [{annotation}]")]
    AttributeNotFound {
        /// Requested attribute.
        attribute: String,
        /// Display name of the owning annotation.
        annotation: String,
    },

    /// An attribute is present but cannot be read as the requested type.
    #[error(
        "attribute '{attribute}' is of type [{actual}], but [{expected}] was expected in attributes \
         for annotation [{annotation}]"
    )]
    AttributeTypeMismatch {
        /// Requested attribute.
        attribute: String,
        /// Display name of the owning annotation.
        annotation: String,
        /// Requested type.
        expected: String,
        /// Stored type.
        actual: String,
    },

    /// A synthesized annotation has no value and no default for an attribute.
    #[error(
        "attributes for synthesized annotation [{annotation}] on {element} declare no value for \
         required attribute '{attribute}'"
    )]
    MissingSynthesizedAttribute {
        /// Annotation type being synthesized.
        annotation: String,
        /// Attribute lacking a value.
        attribute: String,
        /// Element the view was synthesized for.
        element: String,
    },
}

impl SteleError {
    /// Creates an [`SteleError::AttributeNotFound`] error.
    #[must_use]
    pub fn attribute_not_found(attribute: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            attribute: attribute.into(),
            annotation: annotation.into(),
        }
    }

    /// Creates an [`SteleError::AttributeTypeMismatch`] error.
    #[must_use]
    pub fn type_mismatch(
        attribute: impl Into<String>,
        annotation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AttributeTypeMismatch {
            attribute: attribute.into(),
            annotation: annotation.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an [`SteleError::UnknownAnnotationType`] error.
    #[must_use]
    pub fn unknown_annotation_type(name: impl Into<String>) -> Self {
        Self::UnknownAnnotationType { name: name.into() }
    }

    /// Creates an [`SteleError::UnknownClass`] error.
    #[must_use]
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    /// Creates an [`SteleError::UnknownMethod`] error.
    #[must_use]
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates an [`SteleError::MissingAttributeValue`] error.
    #[must_use]
    pub fn missing_attribute_value(
        annotation: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self::MissingAttributeValue {
            annotation: annotation.into(),
            attribute: attribute.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AliasPointsToSelf { .. }
            | Self::AliasTargetMissing { .. }
            | Self::AliasTargetNotMetaPresent { .. }
            | Self::AliasMirrorMismatch { .. }
            | Self::AliasReturnTypeMismatch { .. }
            | Self::AliasDefaultMissing { .. }
            | Self::AliasDefaultMismatch { .. }
            | Self::AttributeConflict { .. } => ErrorCategory::Configuration,
            Self::UnknownAnnotationType { .. }
            | Self::UnknownClass { .. }
            | Self::UnknownMethod { .. }
            | Self::MissingAttributeValue { .. }
            | Self::MetaDepthExceeded { .. } => ErrorCategory::Introspection,
            Self::AttributeNotFound { .. } | Self::AttributeTypeMismatch { .. } => {
                ErrorCategory::Lookup
            }
            Self::MissingSynthesizedAttribute { .. } => ErrorCategory::Synthesis,
        }
    }

    /// Returns `true` for errors that must always reach the caller.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }

    /// Returns `true` for errors a search may recover from by skipping an element.
    #[must_use]
    pub const fn is_introspection(&self) -> bool {
        matches!(self.category(), ErrorCategory::Introspection)
    }
}
