//! # Stele Engine
//!
//! Searches annotation hierarchies and merges what it finds.
//!
//! - [`AnnotationEngine`] - Entry point: merged lookups, presence checks and synthesis
//! - [`AnnotationSearch`] - Get/find traversal driving a [`Processor`]
//! - [`MergeProcessor`] - Attribute overriding along meta-annotation chains
//! - [`EngineSettings`] - Traversal and rendering tunables
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use stele_core::{fixtures, Element};
//! use stele_engine::{AnnotationEngine, EngineSettings};
//!
//! let engine = AnnotationEngine::new(Arc::new(fixtures::web_registry()), EngineSettings::default());
//! let method = Element::method(fixtures::SERVICE_IMPL, "first", Vec::<String>::new());
//!
//! let base = engine.find_merged(&method, fixtures::BASE).unwrap().unwrap();
//! assert_eq!(base.get_string("name").unwrap(), "A");
//! assert!(engine.get_merged(&method, fixtures::BASE).unwrap().is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/stele-engine/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod engine;
mod merge;
mod processors;
mod search;
mod settings;

pub use cache::{CacheName, CacheStats, EngineCaches};
pub use engine::AnnotationEngine;
pub use merge::{
    adapt_value, annotation_attributes, post_process_annotation_attributes, retrieve_attributes,
    MergeOptions, MergeProcessor, PendingAttributes, Slot,
};
pub use search::{AnnotationSearch, Processor, SearchKind};
pub use settings::EngineSettings;
