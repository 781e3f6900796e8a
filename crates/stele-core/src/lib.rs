//! # Stele Core
//!
//! Annotation metadata model for Stele.
//!
//! This crate provides the foundational types the merge engine works on:
//!
//! - [`TypeRegistry`] - Immutable schemas of annotation types, classes and methods
//! - [`Annotation`] - An annotation instance declared on an [`Element`]
//! - [`AnnotationAttributes`] - Ordered attribute store with typed getters
//! - [`AliasGraph`] - Validated, cached alias relationships between attributes
//! - [`SynthesizedAnnotation`] - Alias-aware view over an instance or a store
//! - [`SteleError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/stele-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod alias;
mod annotation;
mod attributes;
mod element;
mod error;
pub mod fixtures;
mod registry;
mod schema;
mod synthesis;
mod value;

pub use alias::{AliasDescriptor, AliasGraph, AliasMap};
pub use annotation::Annotation;
pub use attributes::{AnnotationAttributes, MultiValueAttributes};
pub use element::{Element, MethodRef};
pub use error::{ErrorCategory, SteleError, SteleResult};
pub use registry::{
    meta, AliasFor, AnnotationType, AttributeMethod, ClassDef, ClassKind, MethodDef, TypeRegistry,
    TypeRegistryBuilder,
};
pub use schema::{AnnotationSchema, AttributeKind};
pub use synthesis::{AttributeSource, SynthesizedAnnotation};
pub use value::{AttributeType, AttributeValue, ClassRef, EnumValue, FromAttributeValue};
