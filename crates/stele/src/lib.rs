//! # Stele
//!
//! **Annotation meta-model merging engine**
//!
//! Stele answers "what is the effective value of this annotation attribute on
//! this element?" for a registry of annotated classes and methods:
//!
//! - **Aliases** – explicit `alias_for` pairs, meta-annotation overrides and
//!   implicit alias groups
//! - **Get and find search** – direct and meta-present annotations, or the full
//!   class, interface and super-method hierarchy
//! - **Merging** – attribute values propagated from composed annotations down
//!   to the meta-annotations they declare
//! - **Synthesis** – alias-aware annotation views with typed accessors
//! - **Caching** – per-engine concurrent caches of merged results
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use stele::prelude::*;
//!
//! #[derive(Debug, Annotation)]
//! #[annotation(name = "web.Route", inherited)]
//! struct Route {
//!     #[attribute(alias_for = "path", default = "")]
//!     value: String,
//!     #[attribute(alias_for = "value", default = "")]
//!     path: String,
//! }
//!
//! let registry = TypeRegistry::builder()
//!     .schema::<Route>()
//!     .class(ClassDef::class("app.Users").annotated(Annotation::new("web.Route").with("value", "/users")))
//!     .class(ClassDef::class("app.Admins").extends("app.Users"))
//!     .build();
//! let engine = AnnotationEngine::new(Arc::new(registry), EngineSettings::default());
//!
//! let route: Route = engine.find_merged_as(&Element::class("app.Admins"))?.unwrap();
//! assert_eq!(route.path, "/users");
//! # Ok::<(), SteleError>(())
//! ```
//!
//! `#[derive(Annotation)]` expands to `::stele_core` paths, so crates using
//! the derive also depend on `stele-core` directly.
//!
//! ## Architecture
//!
//! ```text
//! TypeRegistry → AliasGraph → AnnotationSearch → MergeProcessor → SynthesizedAnnotation
//!                                    ↑
//!                         AnnotationEngine (caches, settings)
//! ```

#![doc(html_root_url = "https://docs.rs/stele/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the annotation model
pub use stele_core as core;

// Re-export search, merge and synthesis
pub use stele_engine as engine;

// Re-export configuration
pub use stele_config as config;

// Re-export logging and metrics setup
pub use stele_telemetry as telemetry;

// Re-export the schema derive
pub use stele_macros::Annotation;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use stele::prelude::*;
///
/// let settings = EngineSettings::default();
/// assert!(settings.cache_enabled);
/// ```
pub mod prelude {
    pub use stele_core::{
        AliasFor, Annotation, AnnotationAttributes, AnnotationSchema, AnnotationType,
        AttributeMethod, AttributeType, AttributeValue, ClassDef, ClassRef, Element, EnumValue,
        MethodDef, SteleError, SteleResult, SynthesizedAnnotation, TypeRegistry,
    };

    pub use stele_engine::{AnnotationEngine, EngineSettings, MergeOptions, SearchKind};

    pub use stele_config::{ConfigLoader, SteleConfig};

    pub use stele_telemetry::{init_telemetry, TelemetryConfig};

    // Derive macro; shares its name with the `Annotation` value type
    pub use stele_macros::Annotation;
}
