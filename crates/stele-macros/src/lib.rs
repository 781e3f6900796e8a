//! Procedural macros for Stele annotation schemas.
//!
//! # Overview
//!
//! `#[derive(Annotation)]` turns a plain struct into a typed annotation
//! schema: the struct describes the annotation type to register, and merged
//! or synthesized results convert back into it.
//!
//! # Example
//!
//! ```rust
//! use stele_core::{AnnotationSchema, AttributeType};
//! use stele_macros::Annotation;
//!
//! #[derive(Debug, Annotation)]
//! #[annotation(name = "web.Route", meta = "web.Mapping")]
//! struct Route {
//!     #[attribute(alias_for = "path", default = "")]
//!     value: String,
//!     #[attribute(alias_for = "value", default = "")]
//!     path: String,
//!     #[attribute(default = 30)]
//!     timeout: i64,
//! }
//!
//! let ty = Route::annotation_type();
//! assert_eq!(ty.name(), "web.Route");
//! assert_eq!(ty.find_attribute("timeout").unwrap().attribute_type(), &AttributeType::Int);
//! ```
//!
//! # Design Principles
//!
//! - **Schemas are data**: the derive only builds an `AnnotationType`; the
//!   engine never sees Rust types
//! - **Field types drive attribute types**: via `AttributeKind`
//! - **Defaults are typed**: a default converts into the field type first

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `AnnotationSchema` for a struct with named fields.
///
/// # Container attributes
///
/// - `name = "..."`: fully qualified annotation type name (required)
/// - `meta = "..."`: meta-annotation type, repeatable
/// - `inherited`: the annotation is inherited by subclasses
///
/// # Field attributes
///
/// - `name = "..."`: attribute name, defaults to the field name
/// - `default = <expr>`: default value, converted with `Into` into the field type
/// - `alias_for = "..."`: aliased attribute
/// - `annotation = "..."`: meta-annotation holding the aliased attribute
///
/// Fields without a default are required.
///
/// # Example
///
/// ```rust
/// use stele_macros::Annotation;
///
/// #[derive(Annotation)]
/// #[annotation(name = "test.Header")]
/// struct Header {
///     name: String,
///     #[attribute(default = "")]
///     value: String,
/// }
///
/// #[derive(Annotation)]
/// #[annotation(name = "test.Get", meta = "web.Mapping", inherited)]
/// struct Get {
///     #[attribute(annotation = "web.Mapping", default = "")]
///     path: String,
///     #[attribute(annotation = "web.Mapping", default = [])]
///     headers: Vec<Header>,
/// }
/// ```
#[proc_macro_derive(Annotation, attributes(annotation, attribute))]
pub fn derive_annotation(input: TokenStream) -> TokenStream {
    derive::expand_annotation(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
